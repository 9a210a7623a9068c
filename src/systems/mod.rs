mod attrition;
mod events;
mod survivors;

pub use attrition::AttritionSystem;
pub use events::EventSystem;
pub use survivors::SurvivorSystem;
