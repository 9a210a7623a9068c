use anyhow::Result;

use crate::{
    engine::{DayLog, System, SystemContext},
    rng::{Span, SystemRng},
    world::World,
};

/// Baseline daily consumption of food and water by the shelter as a whole.
pub struct AttritionSystem {
    food: Span,
    water: Span,
}

impl AttritionSystem {
    pub fn new(food: Span, water: Span) -> Self {
        Self { food, water }
    }
}

impl Default for AttritionSystem {
    fn default() -> Self {
        Self::new(Span::new(1, 3), Span::new(1, 3))
    }
}

impl System for AttritionSystem {
    fn name(&self) -> &str {
        "attrition"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
        log: &mut DayLog,
    ) -> Result<()> {
        let food = self.food.sample(rng).max(0);
        let water = self.water.sample(rng).max(0);
        world.shelter.adjust_resources(-food, -water, 0);
        log.push(format!("The shelter used {food} food and {water} water."));
        Ok(())
    }
}
