pub mod console;
pub mod engine;
pub mod events;
pub mod narrator;
pub mod rng;
pub mod scenario;
pub mod session;
pub mod systems;
pub mod world;

pub use engine::{DayOutcome, EndReason, Engine, EngineBuilder, EngineError};
pub use scenario::{Scenario, ScenarioLoader};
pub use session::GameSession;
pub use world::{Shelter, Survivor, World};
