//! A single playthrough: the world, the engine that advances it, and the
//! player actions the menus expose.

use rand::Rng;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    engine::{DayOutcome, EndReason, Engine, EngineBuilder, EngineError, SimState},
    narrator::Narrator,
    rng::RngExt,
    scenario::{Scenario, ScenarioError},
    world::{ResourceDelta, Shelter, Survivor, World, WorldSnapshot},
};

pub const RATION_COST: u32 = 5;
pub const TREATMENT_COST: u32 = 1;
pub const MORALE_FOOD_COST: u32 = 2;
pub const MORALE_WATER_COST: u32 = 2;
const GATHER_FAIL_PERCENT: u8 = 10;
const GATHER_STREAM: &str = "gathering";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("Not enough {resource}! ({needed} needed, {available} in store)")]
    InsufficientResources {
        resource: &'static str,
        needed: u32,
        available: u32,
    },
    #[error("Invalid selection: there is no survivor #{}.", .0 + 1)]
    NoSuchSurvivor(usize),
}

/// What a successful (or harmlessly pointless) action did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionReport {
    Done(String),
    /// Nobody needed the action; nothing was spent.
    NoTarget(String),
    /// A gathering trip that found nothing.
    CameBackEmpty(String),
}

impl ActionReport {
    pub fn message(&self) -> &str {
        match self {
            ActionReport::Done(message)
            | ActionReport::NoTarget(message)
            | ActionReport::CameBackEmpty(message) => message,
        }
    }
}

pub struct GameSession {
    scenario: Scenario,
    world: World,
    engine: Engine,
}

impl GameSession {
    pub fn new(scenario: Scenario, seed: u64) -> Result<Self, ScenarioError> {
        scenario.validate()?;
        let mut engine = EngineBuilder::standard(&scenario, seed)?.build();
        let world = scenario.build_world(&mut engine.rng_stream("setup"));
        info!(
            scenario = %scenario.name,
            seed,
            survivors = world.headcount(),
            "session started"
        );
        Ok(Self {
            scenario,
            world,
            engine,
        })
    }

    /// Wraps a hand-built world, for callers that want full control of the starting state.
    pub fn from_parts(scenario: Scenario, world: World, engine: Engine) -> Self {
        Self {
            scenario,
            world,
            engine,
        }
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn shelter(&self) -> &Shelter {
        self.world.shelter()
    }

    pub fn survivors(&self) -> &[Survivor] {
        self.world.survivors()
    }

    pub fn day(&self) -> u32 {
        self.world.day()
    }

    pub fn seed(&self) -> u64 {
        self.engine.seed()
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        self.world.snapshot(&self.scenario.name)
    }

    pub fn is_over(&self) -> bool {
        self.engine.is_ended()
    }

    pub fn end_reason(&self) -> Option<&EndReason> {
        match self.engine.state() {
            SimState::Ended(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn advance_one_day(&mut self) -> Result<DayOutcome, EngineError> {
        self.engine.advance_one_day(&mut self.world)
    }

    /// Runs a batch, handing each day's narrative to `narrator` as it happens.
    pub fn simulate_days(
        &mut self,
        days: u32,
        narrator: &mut dyn Narrator,
    ) -> Result<Vec<DayOutcome>, EngineError> {
        self.engine.run_with_hook(&mut self.world, days, |outcome| {
            narrator.present(&outcome.narrative);
            if let Some(reason) = &outcome.end_reason {
                narrator.report_end(reason);
            }
        })
    }

    /// Indices into the roster of everyone currently sick.
    pub fn sick_survivors(&self) -> Vec<usize> {
        self.world
            .survivors()
            .iter()
            .enumerate()
            .filter(|(_, survivor)| survivor.is_sick())
            .map(|(index, _)| index)
            .collect()
    }

    pub fn give_food(&mut self, index: usize) -> Result<ActionReport, ActionError> {
        require("food", RATION_COST, self.world.shelter().food())?;
        let survivor = self
            .world
            .survivor_mut(index)
            .ok_or(ActionError::NoSuchSurvivor(index))?;
        survivor.eat();
        let name = survivor.name().to_string();
        self.world
            .shelter_mut()
            .adjust_resources(-(RATION_COST as i32), 0, 0);
        debug!(%name, "fed survivor");
        Ok(ActionReport::Done(format!("You gave food to {name}.")))
    }

    pub fn give_water(&mut self, index: usize) -> Result<ActionReport, ActionError> {
        require("water", RATION_COST, self.world.shelter().water())?;
        let survivor = self
            .world
            .survivor_mut(index)
            .ok_or(ActionError::NoSuchSurvivor(index))?;
        survivor.drink();
        let name = survivor.name().to_string();
        self.world
            .shelter_mut()
            .adjust_resources(0, -(RATION_COST as i32), 0);
        debug!(%name, "gave water to survivor");
        Ok(ActionReport::Done(format!("You gave water to {name}.")))
    }

    pub fn treat_survivor(&mut self, index: usize) -> Result<ActionReport, ActionError> {
        require("medicine", TREATMENT_COST, self.world.shelter().medicine())?;
        if self.sick_survivors().is_empty() {
            return Ok(ActionReport::NoTarget(
                "Let's celebrate, no one is sick!".to_string(),
            ));
        }
        let survivor = self
            .world
            .survivor_mut(index)
            .ok_or(ActionError::NoSuchSurvivor(index))?;
        if !survivor.is_sick() {
            return Ok(ActionReport::NoTarget(format!(
                "{} is not sick.",
                survivor.name()
            )));
        }
        survivor.heal();
        let name = survivor.name().to_string();
        self.world.shelter_mut().use_medicine();
        debug!(%name, "treated survivor");
        Ok(ActionReport::Done(format!("You treated {name}.")))
    }

    pub fn boost_all_morale(&mut self) -> Result<ActionReport, ActionError> {
        require("food", MORALE_FOOD_COST, self.world.shelter().food())?;
        require("water", MORALE_WATER_COST, self.world.shelter().water())?;
        self.world.shelter_mut().adjust_resources(
            -(MORALE_FOOD_COST as i32),
            -(MORALE_WATER_COST as i32),
            0,
        );
        for survivor in &mut self.world.survivors {
            survivor.boost_morale();
        }
        Ok(ActionReport::Done(
            "You organized a morale-boosting activity. Survivors feel better!".to_string(),
        ))
    }

    pub fn scavenge_food(&mut self) -> ActionReport {
        let mut rng = self.engine.rng_stream(GATHER_STREAM);
        let found = rng.gen_range(1..=5);
        if rng.chance(GATHER_FAIL_PERCENT) {
            return ActionReport::CameBackEmpty("Scavenging failed. No food found.".into());
        }
        self.world.shelter.adjust_resources(found, 0, 0);
        ActionReport::Done(format!("You scavenged and found {found} units of food."))
    }

    pub fn collect_water(&mut self) -> ActionReport {
        let mut rng = self.engine.rng_stream(GATHER_STREAM);
        let collected = rng.gen_range(1..=5);
        if rng.chance(GATHER_FAIL_PERCENT) {
            return ActionReport::CameBackEmpty(
                "Water collection failed. No water collected.".into(),
            );
        }
        self.world.shelter.adjust_resources(0, collected, 0);
        ActionReport::Done(format!("You collected {collected} units of water."))
    }

    pub fn search_medicine(&mut self) -> ActionReport {
        let mut rng = self.engine.rng_stream(GATHER_STREAM);
        let found = rng.gen_range(0..=2);
        if rng.chance(GATHER_FAIL_PERCENT) {
            return ActionReport::CameBackEmpty(
                "Medicine search failed. No medicine found.".into(),
            );
        }
        self.world.shelter.adjust(ResourceDelta {
            medicine: found,
            ..ResourceDelta::default()
        });
        ActionReport::Done(format!("You searched and found {found} units of medicine."))
    }

    /// Costs one round of ammunition on success; a miss keeps the round.
    pub fn hunt(&mut self) -> Result<ActionReport, ActionError> {
        require("ammunition", 1, self.world.shelter().ammunition())?;
        let mut rng = self.engine.rng_stream(GATHER_STREAM);
        let hunted = rng.gen_range(3..=7);
        if rng.chance(GATHER_FAIL_PERCENT) {
            return Ok(ActionReport::CameBackEmpty(
                "Hunting failed. No food found.".into(),
            ));
        }
        self.world.shelter.adjust_resources(hunted, 0, -1);
        Ok(ActionReport::Done(format!(
            "You hunted and found {hunted} units of food, using 1 unit of ammunition."
        )))
    }
}

fn require(resource: &'static str, needed: u32, available: u32) -> Result<(), ActionError> {
    if available < needed {
        return Err(ActionError::InsufficientResources {
            resource,
            needed,
            available,
        });
    }
    Ok(())
}
