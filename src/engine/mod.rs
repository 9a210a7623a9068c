use std::fmt;

use anyhow::Result;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    rng::{RngManager, SystemRng},
    scenario::{Scenario, ScenarioError},
    systems::{AttritionSystem, EventSystem, SurvivorSystem},
    world::World,
};

pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: u64,
}

pub struct EngineBuilder {
    settings: EngineSettings,
    systems: Vec<Box<dyn System>>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            systems: Vec::new(),
        }
    }

    /// Survivor upkeep, then attrition, then the event roll: the order a day runs in.
    pub fn standard(scenario: &Scenario, seed: u64) -> Result<Self, ScenarioError> {
        let settings = EngineSettings {
            scenario_name: scenario.name.clone(),
            seed,
        };
        Ok(Self::new(settings)
            .with_system(SurvivorSystem::new())
            .with_system(AttritionSystem::new(
                scenario.attrition.food,
                scenario.attrition.water,
            ))
            .with_system(EventSystem::new(
                scenario.event_table()?,
                scenario.events.trigger_percent,
            )))
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            rng: RngManager::new(self.settings.seed),
            systems: self.systems,
            settings: self.settings,
            state: SimState::Idle,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EndReason {
    Catastrophe { event: String },
    RosterWiped,
    ResourcesExhausted,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndReason::Catastrophe { event } => write!(f, "{event} ended everything. Game over."),
            EndReason::RosterWiped => write!(f, "All survivors are dead. Game over."),
            EndReason::ResourcesExhausted => write!(f, "All resources depleted. Game over."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimState {
    Idle,
    Running,
    Ended(EndReason),
}

/// Narrative collected while the systems of one day run.
#[derive(Debug, Default)]
pub struct DayLog {
    lines: Vec<String>,
    catastrophe: Option<String>,
}

impl DayLog {
    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn extend(&mut self, lines: impl IntoIterator<Item = String>) {
        self.lines.extend(lines);
    }

    /// Flags the day as terminal; the engine ends the session once the systems finish.
    pub fn catastrophe(&mut self, event: impl Into<String>) {
        self.catastrophe = Some(event.into());
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayOutcome {
    pub day: u32,
    pub narrative: Vec<String>,
    pub ended: bool,
    pub end_reason: Option<EndReason>,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("the session has already ended: {0}")]
    SessionEnded(EndReason),
    #[error("system `{name}` failed")]
    System {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

pub struct Engine {
    rng: RngManager,
    systems: Vec<Box<dyn System>>,
    settings: EngineSettings,
    state: SimState,
}

impl Engine {
    pub fn state(&self) -> &SimState {
        &self.state
    }

    pub fn is_ended(&self) -> bool {
        matches!(self.state, SimState::Ended(_))
    }

    pub fn seed(&self) -> u64 {
        self.settings.seed
    }

    /// Stream for rolls made outside the day pipeline (setup, gathering).
    pub fn rng_stream(&mut self, name: &str) -> SystemRng<'_> {
        self.rng.stream(name)
    }

    pub fn advance_one_day(&mut self, world: &mut World) -> Result<DayOutcome, EngineError> {
        if let SimState::Ended(reason) = &self.state {
            return Err(EngineError::SessionEnded(reason.clone()));
        }
        self.state = SimState::Running;
        world.advance_time();
        let day = world.day();
        let mut log = DayLog::default();

        for system in &mut self.systems {
            let mut rng_stream = self.rng.stream(system.name());
            let ctx = SystemContext {
                day,
                scenario_name: &self.settings.scenario_name,
            };
            debug!(day, system = system.name(), "running system");
            system
                .run(&ctx, world, &mut rng_stream, &mut log)
                .map_err(|source| EngineError::System {
                    name: system.name().to_string(),
                    source,
                })?;
        }

        let end_reason = if let Some(event) = log.catastrophe.take() {
            Some(EndReason::Catastrophe { event })
        } else if world.survivors().is_empty() {
            Some(EndReason::RosterWiped)
        } else if world.shelter().is_depleted() {
            Some(EndReason::ResourcesExhausted)
        } else {
            None
        };

        if let Some(reason) = &end_reason {
            info!(day, scenario = %self.settings.scenario_name, %reason, "session ended");
            log.push(reason.to_string());
            self.state = SimState::Ended(reason.clone());
        }

        Ok(DayOutcome {
            day,
            narrative: log.lines,
            ended: end_reason.is_some(),
            end_reason,
        })
    }

    pub fn run(&mut self, world: &mut World, days: u32) -> Result<Vec<DayOutcome>, EngineError> {
        self.run_with_hook(world, days, |_| {})
    }

    /// Advances up to `days` days, stopping early on the day the session ends.
    pub fn run_with_hook<F>(
        &mut self,
        world: &mut World,
        days: u32,
        mut hook: F,
    ) -> Result<Vec<DayOutcome>, EngineError>
    where
        F: FnMut(&DayOutcome),
    {
        let mut outcomes = Vec::with_capacity(days as usize);
        for _ in 0..days {
            let outcome = self.advance_one_day(world)?;
            hook(&outcome);
            let ended = outcome.ended;
            outcomes.push(outcome);
            if ended {
                break;
            }
        }
        Ok(outcomes)
    }
}

pub struct SystemContext<'a> {
    pub day: u32,
    pub scenario_name: &'a str,
}

pub trait System {
    fn name(&self) -> &str;
    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
        log: &mut DayLog,
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Shelter, Survivor, SurvivorProfile};

    struct Doomsday {
        on_day: u32,
    }

    impl System for Doomsday {
        fn name(&self) -> &str {
            "doomsday"
        }

        fn run(
            &mut self,
            ctx: &SystemContext,
            _world: &mut World,
            _rng: &mut SystemRng<'_>,
            log: &mut DayLog,
        ) -> Result<()> {
            log.push(format!("Day {} passes.", ctx.day));
            if ctx.day == self.on_day {
                log.catastrophe("Doomsday");
            }
            Ok(())
        }
    }

    struct Broken;

    impl System for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn run(
            &mut self,
            _ctx: &SystemContext,
            _world: &mut World,
            _rng: &mut SystemRng<'_>,
            _log: &mut DayLog,
        ) -> Result<()> {
            anyhow::bail!("gears jammed")
        }
    }

    fn settings() -> EngineSettings {
        EngineSettings {
            scenario_name: "unit".into(),
            seed: 1,
        }
    }

    fn stocked_world() -> World {
        World::new(
            Shelter::new(50, 50, 5),
            vec![Survivor::new("Ada"), Survivor::new("Bruno")],
            SurvivorProfile::default(),
        )
    }

    #[test]
    fn batch_stops_on_the_catastrophe_day() {
        let mut world = stocked_world();
        let mut engine = EngineBuilder::new(settings())
            .with_system(Doomsday { on_day: 2 })
            .build();

        let mut seen = Vec::new();
        let outcomes = engine
            .run_with_hook(&mut world, 3, |outcome| seen.push(outcome.day))
            .expect("batch should run");

        assert_eq!(seen, vec![1, 2]);
        assert_eq!(outcomes.len(), 2);
        assert!(!outcomes[0].ended);
        assert!(outcomes[1].ended);
        assert_eq!(
            outcomes[1].end_reason,
            Some(EndReason::Catastrophe {
                event: "Doomsday".into()
            })
        );
        assert_eq!(world.day(), 2);
    }

    #[test]
    fn advancing_after_the_end_is_rejected() {
        let mut world = stocked_world();
        let mut engine = EngineBuilder::new(settings())
            .with_system(Doomsday { on_day: 1 })
            .build();
        assert_eq!(engine.state(), &SimState::Idle);

        engine.advance_one_day(&mut world).expect("day should advance");
        assert!(engine.is_ended());
        let err = engine.advance_one_day(&mut world).unwrap_err();
        assert!(matches!(err, EngineError::SessionEnded(_)));
        assert_eq!(world.day(), 1);
    }

    #[test]
    fn quiet_day_keeps_running() {
        let mut world = stocked_world();
        let mut engine = EngineBuilder::new(settings())
            .with_system(Doomsday { on_day: 99 })
            .build();
        let outcome = engine.advance_one_day(&mut world).expect("day should advance");
        assert_eq!(engine.state(), &SimState::Running);
        assert_eq!(outcome.narrative, vec!["Day 1 passes.".to_string()]);
        assert!(outcome.end_reason.is_none());
    }

    #[test]
    fn empty_stores_end_the_session() {
        let mut world = World::new(
            Shelter::new(0, 0, 0),
            vec![Survivor::new("Ada")],
            SurvivorProfile::default(),
        );
        let mut engine = EngineBuilder::new(settings()).build();
        let outcome = engine.advance_one_day(&mut world).expect("day should advance");
        assert_eq!(outcome.end_reason, Some(EndReason::ResourcesExhausted));
        assert_eq!(
            outcome.narrative.last().map(String::as_str),
            Some("All resources depleted. Game over.")
        );
    }

    #[test]
    fn system_failures_carry_the_system_name() {
        let mut world = stocked_world();
        let mut engine = EngineBuilder::new(settings()).with_system(Broken).build();
        match engine.advance_one_day(&mut world) {
            Err(EngineError::System { name, source }) => {
                assert_eq!(name, "broken");
                assert_eq!(source.to_string(), "gears jammed");
            }
            other => panic!("expected a system error, got {other:?}"),
        }
    }
}
