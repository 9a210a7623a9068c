use anyhow::Result;
use tracing::debug;

use crate::{
    engine::{DayLog, System, SystemContext},
    rng::SystemRng,
    world::World,
};

/// Daily hunger and thirst for every survivor; the dead leave the roster.
pub struct SurvivorSystem;

impl SurvivorSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SurvivorSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for SurvivorSystem {
    fn name(&self) -> &str {
        "survivors"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
        log: &mut DayLog,
    ) -> Result<()> {
        let mut fallen = Vec::new();
        world.survivors.retain_mut(|survivor| {
            let alive = survivor.advance_day();
            if !alive {
                fallen.push(survivor.name().to_string());
            }
            alive
        });
        for name in fallen {
            debug!(day = ctx.day, %name, "survivor died");
            log.push(format!("{name} has died of hunger and thirst."));
        }
        Ok(())
    }
}
