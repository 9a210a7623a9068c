//! Random events that can strike the shelter at the end of a day.
//!
//! The table is plain data: each entry names its effects as descriptors and a
//! single dispatcher ([`EventEntry::apply`]) interprets them. Scenario files can
//! replace the canonical table wholesale or extend it entry by entry.

use std::collections::HashSet;

use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rng::{RngExt, Span};
use crate::world::{ResourceDelta, World};

/// A resource change, either fixed or rolled when the event fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Fixed(i32),
    Range(Span),
}

impl Default for Amount {
    fn default() -> Self {
        Amount::Fixed(0)
    }
}

impl Amount {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> i32 {
        match self {
            Amount::Fixed(value) => *value,
            Amount::Range(span) => span.sample(rng),
        }
    }

    fn is_ordered(&self) -> bool {
        match self {
            Amount::Fixed(_) => true,
            Amount::Range(span) => span.is_ordered(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Effect {
    Resources {
        #[serde(default)]
        food: Amount,
        #[serde(default)]
        water: Amount,
        #[serde(default)]
        medicine: Amount,
        #[serde(default)]
        ammunition: Amount,
    },
    /// First survivor in roster order who is not already sick.
    SickenFirstHealthy,
    SickenAll,
    /// First sick survivor in roster order.
    HealFirstSick,
    NewArrival,
    RandomDeath,
    /// Ends the session regardless of stores or roster.
    Catastrophe,
}

impl Effect {
    fn supplies(food: i32, water: i32, ammunition: i32) -> Self {
        Effect::Resources {
            food: Amount::Fixed(food),
            water: Amount::Fixed(water),
            medicine: Amount::default(),
            ammunition: Amount::Fixed(ammunition),
        }
    }

    fn losses(food: Span, water: Span) -> Self {
        Effect::Resources {
            food: Amount::Range(food),
            water: Amount::Range(water),
            medicine: Amount::default(),
            ammunition: Amount::default(),
        }
    }

    fn is_ordered(&self) -> bool {
        match self {
            Effect::Resources {
                food,
                water,
                medicine,
                ammunition,
            } => [food, water, medicine, ammunition]
                .iter()
                .all(|amount| amount.is_ordered()),
            _ => true,
        }
    }
}

fn default_weight() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEntry {
    pub id: u32,
    pub title: String,
    pub message: String,
    #[serde(default = "default_weight")]
    pub weight: u32,
    #[serde(default)]
    pub effects: Vec<Effect>,
}

/// Narrative and side effects of one fired event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventResolution {
    pub event_id: u32,
    pub lines: Vec<String>,
    pub catastrophe: bool,
}

impl EventEntry {
    pub fn new(id: u32, title: &str, message: &str, effects: Vec<Effect>) -> Self {
        Self {
            id,
            title: title.to_string(),
            message: message.to_string(),
            weight: default_weight(),
            effects,
        }
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    pub fn headline(&self) -> String {
        format!("{} - {}", self.title, self.message)
    }

    /// Applies every effect in order. Targeted effects with no eligible survivor do nothing.
    pub fn apply<R: Rng + ?Sized>(&self, world: &mut World, rng: &mut R) -> EventResolution {
        let mut resolution = EventResolution {
            event_id: self.id,
            lines: vec![self.headline()],
            catastrophe: false,
        };
        for effect in &self.effects {
            match effect {
                Effect::Resources {
                    food,
                    water,
                    medicine,
                    ammunition,
                } => {
                    let delta = ResourceDelta {
                        food: food.sample(rng),
                        water: water.sample(rng),
                        medicine: medicine.sample(rng),
                        ammunition: ammunition.sample(rng),
                    };
                    if !delta.is_zero() {
                        world.shelter.adjust(delta);
                        resolution
                            .lines
                            .push(format!("Shelter stores: {}.", delta.describe()));
                    }
                }
                Effect::SickenFirstHealthy => {
                    if let Some(survivor) = world.survivors.iter_mut().find(|s| !s.is_sick()) {
                        survivor.make_sick();
                        resolution
                            .lines
                            .push(format!("{} has fallen ill.", survivor.name()));
                    }
                }
                Effect::SickenAll => {
                    let mut count = 0;
                    for survivor in world.survivors.iter_mut().filter(|s| !s.is_sick()) {
                        survivor.make_sick();
                        count += 1;
                    }
                    if count > 0 {
                        resolution
                            .lines
                            .push(format!("{count} survivor(s) have fallen ill."));
                    }
                }
                Effect::HealFirstSick => {
                    if let Some(survivor) = world.survivors.iter_mut().find(|s| s.is_sick()) {
                        survivor.heal();
                        resolution
                            .lines
                            .push(format!("{} has recovered.", survivor.name()));
                    }
                }
                Effect::NewArrival => {
                    let newcomer = world.recruit(rng);
                    resolution
                        .lines
                        .push(format!("{} joins the shelter.", newcomer.name()));
                }
                Effect::RandomDeath => {
                    if !world.survivors.is_empty() {
                        let index = rng.gen_range(0..world.survivors.len());
                        if let Some(fallen) = world.remove_survivor(index) {
                            resolution
                                .lines
                                .push(format!("{} has died.", fallen.name()));
                        }
                    }
                }
                Effect::Catastrophe => resolution.catastrophe = true,
            }
        }
        resolution
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("event table is empty")]
    Empty,
    #[error("event id {0} is defined more than once")]
    DuplicateId(u32),
    #[error("event weights must not all be zero")]
    ZeroWeight,
    #[error("event {0} has a range whose min exceeds its max")]
    UnorderedRange(u32),
    #[error("event weights add up to more than {}", u32::MAX)]
    WeightOverflow,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTable {
    entries: Vec<EventEntry>,
}

impl EventTable {
    pub fn new(entries: Vec<EventEntry>) -> Result<Self, TableError> {
        let table = Self { entries };
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<(), TableError> {
        if self.entries.is_empty() {
            return Err(TableError::Empty);
        }
        let mut seen = HashSet::new();
        for entry in &self.entries {
            if !seen.insert(entry.id) {
                return Err(TableError::DuplicateId(entry.id));
            }
            if !entry.effects.iter().all(Effect::is_ordered) {
                return Err(TableError::UnorderedRange(entry.id));
            }
        }
        let total = self
            .entries
            .iter()
            .try_fold(0u32, |total, entry| total.checked_add(entry.weight))
            .ok_or(TableError::WeightOverflow)?;
        if total == 0 {
            return Err(TableError::ZeroWeight);
        }
        Ok(())
    }

    pub fn entries(&self) -> &[EventEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&EventEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Adds an entry, replacing and returning any existing entry with the same id.
    pub fn insert(&mut self, entry: EventEntry) -> Option<EventEntry> {
        match self.entries.iter_mut().find(|existing| existing.id == entry.id) {
            Some(existing) => Some(std::mem::replace(existing, entry)),
            None => {
                self.entries.push(entry);
                None
            }
        }
    }

    pub fn remove(&mut self, id: u32) -> Option<EventEntry> {
        let index = self.entries.iter().position(|entry| entry.id == id)?;
        Some(self.entries.remove(index))
    }

    /// Gate roll against `trigger_percent`, then a weighted pick over the entries.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R, trigger_percent: u8) -> Option<&EventEntry> {
        if !rng.chance(trigger_percent) {
            return None;
        }
        self.entries.choose_weighted(rng, |entry| entry.weight).ok()
    }

    pub fn canonical() -> Self {
        let fire = Span::new(-4, -2);
        let theft = Span::new(-5, -3);
        let spoilage = Span::new(-2, -1);
        let entries = vec![
            EventEntry::new(
                1,
                "Scavenger's Luck",
                "a scavenging run turns up a small cache of food and water.",
                vec![Effect::supplies(5, 5, 0)],
            ),
            EventEntry::new(
                2,
                "Military Broadcast",
                "a faint radio signal hints at a safe zone somewhere nearby.",
                vec![],
            ),
            EventEntry::new(
                3,
                "Lone Survivor",
                "a stranger arrives at the gate carrying a few supplies.",
                vec![Effect::NewArrival, Effect::supplies(3, 3, 0)],
            ),
            EventEntry::new(
                4,
                "Secret Stash",
                "tidying the storeroom uncovers forgotten tins of food.",
                vec![Effect::supplies(5, 0, 0)],
            ),
            EventEntry::new(
                5,
                "Fortification",
                "the group spends the day reinforcing the barricades.",
                vec![],
            ),
            EventEntry::new(
                6,
                "Altruistic Trader",
                "a passing trader swaps supplies at a fair price.",
                vec![Effect::supplies(5, 5, 0)],
            ),
            EventEntry::new(
                7,
                "Rainwater Collection",
                "a storm fills every spare container with fresh water.",
                vec![Effect::supplies(0, 10, 0)],
            ),
            EventEntry::new(
                8,
                "Improvised Medicine",
                "someone brews a home remedy that cures a patient.",
                vec![Effect::HealFirstSick],
            ),
            EventEntry::new(
                9,
                "Pet Companion",
                "a stray dog wanders in and decides to stay.",
                vec![],
            ),
            EventEntry::new(
                10,
                "Unlooted Pharmacy",
                "a lucky trip into town comes back with bottled supplies.",
                vec![Effect::supplies(0, 5, 0)],
            ),
            EventEntry::new(
                11,
                "Raider Ambush",
                "raiders hit the shelter and make off with supplies.",
                vec![Effect::supplies(-5, -5, 0)],
            ),
            EventEntry::new(
                12,
                "Food Spoilage",
                "part of the food store has gone bad.",
                vec![Effect::supplies(-5, 0, 0)],
            ),
            EventEntry::new(
                13,
                "Water Contamination",
                "tainted water makes its way into the supply.",
                vec![Effect::supplies(0, -5, 0), Effect::SickenFirstHealthy],
            ),
            EventEntry::new(
                14,
                "Zombie Infestation",
                "a walker slips inside and wounds someone before it is put down.",
                vec![Effect::SickenFirstHealthy],
            ),
            EventEntry::new(
                15,
                "Shelter Collapse",
                "a section of the ceiling gives way.",
                vec![],
            ),
            EventEntry::new(
                16,
                "Mental Breakdown",
                "the strain gets to someone and they refuse to work today.",
                vec![],
            ),
            EventEntry::new(
                17,
                "Supplies Stolen",
                "a thief slips in overnight and empties a shelf.",
                vec![Effect::supplies(-5, -5, 0)],
            ),
            EventEntry::new(
                18,
                "Illness Outbreak",
                "a fever spreads through the shelter.",
                vec![Effect::SickenAll],
            ),
            EventEntry::new(
                19,
                "Equipment Failure",
                "a vital tool breaks beyond repair.",
                vec![],
            ),
            EventEntry::new(
                20,
                "Horde Sighting",
                "a huge horde is spotted moving along the ridge.",
                vec![],
            ),
            EventEntry::new(
                21,
                "Nuclear Strike",
                "a warhead detonates over the city. Nothing survives.",
                vec![Effect::Catastrophe],
            ),
            EventEntry::new(
                22,
                "Mutant",
                "a mutant batters the door and takes a storm of bullets to bring down.",
                vec![Effect::supplies(0, 0, -10)],
            ),
            EventEntry::new(
                23,
                "Ammunition Cache",
                "a survivor stumbles on a crate of ammunition.",
                vec![Effect::supplies(0, 0, 10)],
            ),
            EventEntry::new(
                24,
                "Resource Spoilage",
                "damp gets into the stores.",
                vec![Effect::losses(spoilage, spoilage)],
            ),
            EventEntry::new(
                25,
                "Random Death",
                "tragedy strikes without warning.",
                vec![Effect::RandomDeath],
            ),
            EventEntry::new(
                26,
                "Thief Attack",
                "a bold thief gets away with a large haul.",
                vec![Effect::losses(theft, theft)],
            ),
            EventEntry::new(
                27,
                "Fire",
                "a fire breaks out in the storeroom.",
                vec![Effect::losses(fire, fire)],
            ),
        ];
        Self { entries }
    }
}

impl Default for EventTable {
    fn default() -> Self {
        Self::canonical()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::RngManager;
    use crate::world::{Shelter, Survivor, SurvivorProfile};

    fn world_with(survivors: Vec<Survivor>) -> World {
        World::new(Shelter::new(10, 10, 10), survivors, SurvivorProfile::default())
    }

    #[test]
    fn canonical_table_is_valid() {
        let table = EventTable::canonical();
        assert_eq!(table.len(), 27);
        assert!(table.validate().is_ok());
        let ids: Vec<u32> = table.entries().iter().map(|entry| entry.id).collect();
        assert_eq!(ids, (1..=27).collect::<Vec<_>>());
        assert_eq!(
            table.get(21).map(|entry| entry.effects.clone()),
            Some(vec![Effect::Catastrophe])
        );
    }

    #[test]
    fn gate_at_zero_never_fires() {
        let table = EventTable::canonical();
        let mut rng = RngManager::new(1);
        let mut stream = rng.stream("events");
        for _ in 0..200 {
            assert!(table.roll(&mut stream, 0).is_none());
        }
    }

    #[test]
    fn gate_at_hundred_always_fires() {
        let table = EventTable::canonical();
        let mut rng = RngManager::new(1);
        let mut stream = rng.stream("events");
        for _ in 0..200 {
            assert!(table.roll(&mut stream, 100).is_some());
        }
    }

    #[test]
    fn weights_steer_the_pick() {
        let table = EventTable::new(vec![
            EventEntry::new(1, "Quiet", "nothing happens.", vec![]).with_weight(0),
            EventEntry::new(2, "Loud", "everything happens.", vec![]),
        ])
        .expect("table should validate");
        let mut rng = RngManager::new(9);
        let mut stream = rng.stream("events");
        for _ in 0..100 {
            assert_eq!(table.roll(&mut stream, 100).map(|entry| entry.id), Some(2));
        }
    }

    #[test]
    fn validation_rejects_bad_tables() {
        assert_eq!(EventTable::new(vec![]), Err(TableError::Empty));

        let duplicate = vec![
            EventEntry::new(4, "A", "a", vec![]),
            EventEntry::new(4, "B", "b", vec![]),
        ];
        assert_eq!(EventTable::new(duplicate), Err(TableError::DuplicateId(4)));

        let weightless = vec![EventEntry::new(1, "A", "a", vec![]).with_weight(0)];
        assert_eq!(EventTable::new(weightless), Err(TableError::ZeroWeight));

        let backwards = vec![EventEntry::new(
            7,
            "A",
            "a",
            vec![Effect::losses(Span::new(-1, -5), Span::fixed(0))],
        )];
        assert_eq!(EventTable::new(backwards), Err(TableError::UnorderedRange(7)));
    }

    #[test]
    fn validation_rejects_weights_past_u32() {
        let heavy = vec![
            EventEntry::new(1, "A", "a", vec![]).with_weight(u32::MAX),
            EventEntry::new(2, "B", "b", vec![]).with_weight(u32::MAX),
        ];
        assert_eq!(EventTable::new(heavy), Err(TableError::WeightOverflow));

        let mut table = EventTable::canonical();
        table.insert(
            EventEntry::new(28, "Flood", "the river rises.", vec![]).with_weight(u32::MAX),
        );
        assert_eq!(table.validate(), Err(TableError::WeightOverflow));

        let full = vec![
            EventEntry::new(1, "A", "a", vec![]).with_weight(u32::MAX - 1),
            EventEntry::new(2, "B", "b", vec![]),
        ];
        let table = EventTable::new(full).expect("weights fit in u32");
        let mut rng = RngManager::new(3);
        assert!(table.roll(&mut rng.stream("events"), 100).is_some());
    }

    #[test]
    fn insert_replaces_by_id_and_remove_drops() {
        let mut table = EventTable::canonical();
        let replaced = table.insert(EventEntry::new(2, "Clear Signal", "rescue is coming.", vec![]));
        assert_eq!(replaced.map(|entry| entry.title), Some("Military Broadcast".to_string()));
        assert_eq!(table.len(), 27);

        assert!(table.insert(EventEntry::new(28, "Airdrop", "crates fall.", vec![])).is_none());
        assert_eq!(table.len(), 28);

        assert_eq!(table.remove(21).map(|entry| entry.id), Some(21));
        assert!(table.get(21).is_none());
        assert!(table.remove(21).is_none());
    }

    #[test]
    fn sicken_first_healthy_touches_only_one() {
        let mut world = world_with(vec![
            Survivor::new("Ada").sick(),
            Survivor::new("Bruno"),
            Survivor::new("Greta"),
        ]);
        let mut rng = RngManager::new(2);
        let entry = EventEntry::new(14, "Bite", "ouch.", vec![Effect::SickenFirstHealthy]);
        let resolution = entry.apply(&mut world, &mut rng.stream("events"));

        let sick: Vec<bool> = world.survivors().iter().map(Survivor::is_sick).collect();
        assert_eq!(sick, vec![true, true, false]);
        assert_eq!(resolution.lines.last().map(String::as_str), Some("Bruno has fallen ill."));
    }

    #[test]
    fn outbreak_sickens_everyone() {
        let mut world = world_with(vec![
            Survivor::new("Ada"),
            Survivor::new("Bruno").sick(),
            Survivor::new("Greta"),
        ]);
        let mut rng = RngManager::new(2);
        let entry = EventEntry::new(18, "Fever", "cough.", vec![Effect::SickenAll]);
        entry.apply(&mut world, &mut rng.stream("events"));
        assert!(world.survivors().iter().all(Survivor::is_sick));
    }

    #[test]
    fn heal_first_sick_without_patients_is_silent() {
        let mut world = world_with(vec![Survivor::new("Ada")]);
        let before = world.snapshot("test");
        let mut rng = RngManager::new(2);
        let entry = EventEntry::new(8, "Remedy", "brew.", vec![Effect::HealFirstSick]);
        let resolution = entry.apply(&mut world, &mut rng.stream("events"));
        assert_eq!(world.snapshot("test"), before);
        assert_eq!(resolution.lines, vec!["Remedy - brew.".to_string()]);
    }

    #[test]
    fn heal_first_sick_picks_roster_order() {
        let mut world = world_with(vec![
            Survivor::with_vitals("Ada", 10, 5, 5, 5),
            Survivor::with_vitals("Bruno", 10, 5, 5, 5).sick(),
            Survivor::with_vitals("Greta", 10, 5, 5, 5).sick(),
        ]);
        let mut rng = RngManager::new(2);
        let entry = EventEntry::new(8, "Remedy", "brew.", vec![Effect::HealFirstSick]);
        entry.apply(&mut world, &mut rng.stream("events"));
        assert!(!world.survivors()[1].is_sick());
        assert_eq!(world.survivors()[1].health(), 15);
        assert!(world.survivors()[2].is_sick());
    }

    #[test]
    fn arrival_and_death_change_the_roster() {
        let mut world = world_with(vec![Survivor::new("Ada")]);
        let mut rng = RngManager::new(4);
        let table = EventTable::canonical();

        let arrival = table
            .get(3)
            .expect("event should exist")
            .apply(&mut world, &mut rng.stream("events"));
        assert_eq!(world.headcount(), 2);
        assert_eq!(world.shelter().food(), 13);
        assert_eq!(world.shelter().water(), 13);
        assert!(arrival.lines.iter().any(|line| line.ends_with("joins the shelter.")));

        table
            .get(25)
            .expect("event should exist")
            .apply(&mut world, &mut rng.stream("events"));
        assert_eq!(world.headcount(), 1);
    }

    #[test]
    fn random_death_on_empty_roster_is_silent() {
        let mut world = world_with(vec![]);
        let mut rng = RngManager::new(4);
        let resolution = EventTable::canonical()
            .get(25)
            .expect("event should exist")
            .apply(&mut world, &mut rng.stream("events"));
        assert_eq!(resolution.lines.len(), 1);
        assert_eq!(world.headcount(), 0);
    }

    #[test]
    fn ranged_losses_stay_within_bounds() {
        let table = EventTable::canonical();
        let mut rng = RngManager::new(8);
        for _ in 0..50 {
            let mut world = world_with(vec![]);
            table
                .get(27)
                .expect("event should exist")
                .apply(&mut world, &mut rng.stream("events"));
            assert!((6..=8).contains(&world.shelter().food()));
            assert!((6..=8).contains(&world.shelter().water()));
        }
    }

    #[test]
    fn catastrophe_is_flagged() {
        let mut world = world_with(vec![Survivor::new("Ada")]);
        let mut rng = RngManager::new(4);
        let resolution = EventTable::canonical()
            .get(21)
            .expect("event should exist")
            .apply(&mut world, &mut rng.stream("events"));
        assert!(resolution.catastrophe);
        assert_eq!(resolution.event_id, 21);
    }

    #[test]
    fn entries_parse_from_yaml() {
        let yaml = r#"
- id: 40
  title: Supply Drop
  message: a parachute lands in the yard.
  weight: 3
  effects:
    - kind: resources
      food: 4
      water: { min: 1, max: 2 }
    - kind: new_arrival
- id: 41
  title: Meteor
  message: the sky falls.
  effects:
    - kind: catastrophe
"#;
        let entries: Vec<EventEntry> = serde_yaml::from_str(yaml).expect("yaml should parse");
        let table = EventTable::new(entries).expect("table should validate");
        let drop = table.get(40).expect("event should exist");
        assert_eq!(drop.weight, 3);
        assert_eq!(
            drop.effects[0],
            Effect::Resources {
                food: Amount::Fixed(4),
                water: Amount::Range(Span::new(1, 2)),
                medicine: Amount::Fixed(0),
                ammunition: Amount::Fixed(0),
            }
        );
        assert_eq!(drop.effects[1], Effect::NewArrival);
        assert_eq!(table.get(41).expect("event should exist").weight, 1);
    }
}
