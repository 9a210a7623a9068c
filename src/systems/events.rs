use anyhow::Result;
use tracing::debug;

use crate::{
    engine::{DayLog, System, SystemContext},
    events::EventTable,
    rng::SystemRng,
    world::World,
};

/// Rolls at most one event from the table each day and applies it.
pub struct EventSystem {
    table: EventTable,
    trigger_percent: u8,
}

impl EventSystem {
    pub fn new(table: EventTable, trigger_percent: u8) -> Self {
        Self {
            table,
            trigger_percent: trigger_percent.min(100),
        }
    }
}

impl Default for EventSystem {
    fn default() -> Self {
        Self::new(EventTable::canonical(), 30)
    }
}

impl System for EventSystem {
    fn name(&self) -> &str {
        "events"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
        log: &mut DayLog,
    ) -> Result<()> {
        let Some(entry) = self.table.roll(rng, self.trigger_percent) else {
            return Ok(());
        };
        debug!(
            day = ctx.day,
            scenario = ctx.scenario_name,
            event = entry.id,
            title = %entry.title,
            "event fired"
        );
        let resolution = entry.apply(world, rng);
        if resolution.catastrophe {
            log.catastrophe(entry.title.clone());
        }
        log.extend(resolution.lines);
        Ok(())
    }
}
