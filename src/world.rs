use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

use crate::rng::{RngExt, Span};

pub const MAX_HEALTH: i32 = 20;
pub const MAX_MORALE: i32 = 10;

const FEED_RELIEF: i32 = 3;
const DAILY_NEED: i32 = 2;
const STARVATION_DAMAGE: i32 = 5;
const TREATMENT_HEALING: i32 = 5;
const MORALE_BOOST: i32 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Survivor {
    name: String,
    health: i32,
    hunger: i32,
    thirst: i32,
    sick: bool,
    morale: i32,
}

impl Survivor {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_vitals(name, MAX_HEALTH, 5, 5, MAX_MORALE / 2)
    }

    /// Builds a survivor from explicit vitals, clamping health and morale into range.
    pub fn with_vitals(
        name: impl Into<String>,
        health: i32,
        hunger: i32,
        thirst: i32,
        morale: i32,
    ) -> Self {
        Self {
            name: name.into(),
            health: health.clamp(0, MAX_HEALTH),
            hunger: hunger.max(0),
            thirst: thirst.max(0),
            sick: false,
            morale: morale.clamp(0, MAX_MORALE),
        }
    }

    pub fn sick(mut self) -> Self {
        self.sick = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn hunger(&self) -> i32 {
        self.hunger
    }

    pub fn thirst(&self) -> i32 {
        self.thirst
    }

    pub fn is_sick(&self) -> bool {
        self.sick
    }

    pub fn morale(&self) -> i32 {
        self.morale
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    pub fn eat(&mut self) {
        self.hunger = (self.hunger - FEED_RELIEF).max(0);
    }

    pub fn drink(&mut self) {
        self.thirst = (self.thirst - FEED_RELIEF).max(0);
    }

    pub fn heal(&mut self) {
        if self.sick {
            self.sick = false;
            self.health = (self.health + TREATMENT_HEALING).min(MAX_HEALTH);
        }
    }

    pub fn make_sick(&mut self) {
        self.sick = true;
    }

    pub fn boost_morale(&mut self) {
        self.morale = (self.morale + MORALE_BOOST).min(MAX_MORALE);
    }

    /// Applies one day of hunger and thirst. Returns whether the survivor is still alive.
    ///
    /// Starvation damage is charged for a need that was already exhausted when
    /// the day began; a need that only bottoms out today hurts from tomorrow on.
    pub fn advance_day(&mut self) -> bool {
        let starving = self.hunger == 0 || self.thirst == 0;
        self.hunger = (self.hunger - DAILY_NEED).max(0);
        self.thirst = (self.thirst - DAILY_NEED).max(0);
        if starving {
            self.health = (self.health - STARVATION_DAMAGE).max(0);
        }
        self.health > 0
    }

    pub fn status_line(&self) -> String {
        format!(
            "{} - Health: {}, Hunger: {}, Thirst: {}, Sick: {}, Morale: {}/{}",
            self.name,
            self.health,
            self.hunger,
            self.thirst,
            if self.sick { "Yes" } else { "No" },
            self.morale,
            MAX_MORALE
        )
    }

    pub fn snapshot(&self) -> SurvivorSnapshot {
        SurvivorSnapshot {
            name: self.name.clone(),
            health: self.health,
            hunger: self.hunger,
            thirst: self.thirst,
            sick: self.sick,
            morale: self.morale,
        }
    }
}

/// Signed change to every shelter counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceDelta {
    pub food: i32,
    pub water: i32,
    pub medicine: i32,
    pub ammunition: i32,
}

impl ResourceDelta {
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }

    pub fn describe(&self) -> String {
        let parts: Vec<String> = [
            ("food", self.food),
            ("water", self.water),
            ("medicine", self.medicine),
            ("ammunition", self.ammunition),
        ]
        .into_iter()
        .filter(|(_, amount)| *amount != 0)
        .map(|(label, amount)| format!("{amount:+} {label}"))
        .collect();
        parts.join(", ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Shelter {
    food: u32,
    water: u32,
    medicine: u32,
    ammunition: u32,
}

impl Shelter {
    pub fn new(food: u32, water: u32, ammunition: u32) -> Self {
        Self {
            food,
            water,
            medicine: 0,
            ammunition,
        }
    }

    pub fn with_medicine(mut self, medicine: u32) -> Self {
        self.medicine = medicine;
        self
    }

    pub fn food(&self) -> u32 {
        self.food
    }

    pub fn water(&self) -> u32 {
        self.water
    }

    pub fn medicine(&self) -> u32 {
        self.medicine
    }

    pub fn ammunition(&self) -> u32 {
        self.ammunition
    }

    pub fn adjust_resources(&mut self, food: i32, water: i32, ammunition: i32) {
        self.adjust(ResourceDelta {
            food,
            water,
            medicine: 0,
            ammunition,
        });
    }

    /// Counters saturate at zero and are unbounded above.
    pub fn adjust(&mut self, delta: ResourceDelta) {
        self.food = self.food.saturating_add_signed(delta.food);
        self.water = self.water.saturating_add_signed(delta.water);
        self.medicine = self.medicine.saturating_add_signed(delta.medicine);
        self.ammunition = self.ammunition.saturating_add_signed(delta.ammunition);
    }

    pub fn use_medicine(&mut self) {
        self.medicine = self.medicine.saturating_sub(1);
    }

    pub fn is_depleted(&self) -> bool {
        self.food == 0 && self.water == 0 && self.medicine == 0 && self.ammunition == 0
    }
}

/// How newcomers are rolled, both at session start and for arrival events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurvivorProfile {
    #[serde(default = "default_health")]
    pub health: Span,
    #[serde(default = "default_need")]
    pub hunger: Span,
    #[serde(default = "default_need")]
    pub thirst: Span,
    #[serde(default = "default_morale")]
    pub morale: Span,
    #[serde(default = "default_sick_percent")]
    pub sick_percent: u8,
    #[serde(default = "default_names")]
    pub names: Vec<String>,
}

fn default_health() -> Span {
    Span::new(15, 20)
}

fn default_need() -> Span {
    Span::new(5, 9)
}

fn default_morale() -> Span {
    Span::new(3, 6)
}

fn default_sick_percent() -> u8 {
    20
}

fn default_names() -> Vec<String> {
    [
        "Marta", "Oskar", "Greta", "Nils", "Ivo", "Tamsin", "Bruno", "Ada", "Ferris", "Quill",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for SurvivorProfile {
    fn default() -> Self {
        Self {
            health: default_health(),
            hunger: default_need(),
            thirst: default_need(),
            morale: default_morale(),
            sick_percent: default_sick_percent(),
            names: default_names(),
        }
    }
}

impl SurvivorProfile {
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> Survivor {
        let name = self
            .names
            .choose(rng)
            .cloned()
            .unwrap_or_else(|| "Stranger".to_string());
        let survivor = Survivor::with_vitals(
            name,
            self.health.sample(rng).max(1),
            self.hunger.sample(rng),
            self.thirst.sample(rng),
            self.morale.sample(rng),
        );
        if rng.chance(self.sick_percent) {
            survivor.sick()
        } else {
            survivor
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurvivorSnapshot {
    pub name: String,
    pub health: i32,
    pub hunger: i32,
    pub thirst: i32,
    pub sick: bool,
    pub morale: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub scenario: String,
    pub day: u32,
    pub food: u32,
    pub water: u32,
    pub medicine: u32,
    pub ammunition: u32,
    pub survivors: Vec<SurvivorSnapshot>,
}

/// Everything a day-advance mutates: the roster, the shelter and the calendar.
#[derive(Debug, Clone)]
pub struct World {
    day: u32,
    pub(crate) shelter: Shelter,
    pub(crate) survivors: Vec<Survivor>,
    profile: SurvivorProfile,
}

impl World {
    pub fn new(shelter: Shelter, survivors: Vec<Survivor>, profile: SurvivorProfile) -> Self {
        Self {
            day: 0,
            shelter,
            survivors,
            profile,
        }
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn advance_time(&mut self) {
        self.day += 1;
    }

    pub fn shelter(&self) -> &Shelter {
        &self.shelter
    }

    pub fn shelter_mut(&mut self) -> &mut Shelter {
        &mut self.shelter
    }

    pub fn survivors(&self) -> &[Survivor] {
        &self.survivors
    }

    pub fn survivor_mut(&mut self, index: usize) -> Option<&mut Survivor> {
        self.survivors.get_mut(index)
    }

    pub fn profile(&self) -> &SurvivorProfile {
        &self.profile
    }

    /// Rolls a newcomer from the profile and appends it to the roster.
    pub fn recruit<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &Survivor {
        let survivor = self.profile.roll(rng);
        self.survivors.push(survivor);
        &self.survivors[self.survivors.len() - 1]
    }

    pub fn remove_survivor(&mut self, index: usize) -> Option<Survivor> {
        (index < self.survivors.len()).then(|| self.survivors.remove(index))
    }

    pub fn headcount(&self) -> usize {
        self.survivors.len()
    }

    pub fn snapshot(&self, scenario: &str) -> WorldSnapshot {
        WorldSnapshot {
            scenario: scenario.to_string(),
            day: self.day,
            food: self.shelter.food,
            water: self.shelter.water,
            medicine: self.shelter.medicine,
            ammunition: self.shelter.ammunition,
            survivors: self.survivors.iter().map(Survivor::snapshot).collect(),
        }
    }
}
