use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    events::{EventEntry, EventTable, TableError},
    rng::Span,
    world::{Shelter, SurvivorProfile, World},
};

fn default_name() -> String {
    "outpost".to_string()
}

fn default_store() -> Span {
    Span::new(5, 14)
}

fn default_roster() -> Span {
    Span::new(3, 6)
}

fn default_daily_use() -> Span {
    Span::new(1, 3)
}

fn default_trigger_percent() -> u8 {
    30
}

fn default_max_batch_days() -> u32 {
    5
}

fn default_day_delay_ms() -> u64 {
    1_000
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub start: StartConfig,
    #[serde(default)]
    pub survivors: SurvivorProfile,
    #[serde(default)]
    pub attrition: AttritionConfig,
    #[serde(default)]
    pub events: EventConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartConfig {
    #[serde(default = "default_store")]
    pub food: Span,
    #[serde(default = "default_store")]
    pub water: Span,
    #[serde(default)]
    pub medicine: Option<Span>,
    #[serde(default = "default_store")]
    pub ammunition: Span,
    #[serde(default = "default_roster")]
    pub roster: Span,
}

impl Default for StartConfig {
    fn default() -> Self {
        Self {
            food: default_store(),
            water: default_store(),
            medicine: None,
            ammunition: default_store(),
            roster: default_roster(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttritionConfig {
    #[serde(default = "default_daily_use")]
    pub food: Span,
    #[serde(default = "default_daily_use")]
    pub water: Span,
}

impl Default for AttritionConfig {
    fn default() -> Self {
        Self {
            food: default_daily_use(),
            water: default_daily_use(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventConfig {
    #[serde(default = "default_trigger_percent")]
    pub trigger_percent: u8,
    /// Replaces the built-in table when present.
    #[serde(default)]
    pub table: Option<Vec<EventEntry>>,
    /// Added to (or overriding by id) whichever table is in use.
    #[serde(default)]
    pub extra: Vec<EventEntry>,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            trigger_percent: default_trigger_percent(),
            table: None,
            extra: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacingConfig {
    #[serde(default = "default_max_batch_days")]
    pub max_batch_days: u32,
    #[serde(default = "default_day_delay_ms")]
    pub day_delay_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            max_batch_days: default_max_batch_days(),
            day_delay_ms: default_day_delay_ms(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("scenario validation error: {0}")]
    Validation(String),
    #[error("invalid event table: {0}")]
    Table(#[from] TableError),
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            name: default_name(),
            description: None,
            seed: None,
            start: StartConfig::default(),
            survivors: SurvivorProfile::default(),
            attrition: AttritionConfig::default(),
            events: EventConfig::default(),
            pacing: PacingConfig::default(),
        }
    }
}

impl Scenario {
    pub fn validate(&self) -> Result<(), ScenarioError> {
        let stores = [
            ("start.food", self.start.food),
            ("start.water", self.start.water),
            ("start.ammunition", self.start.ammunition),
            ("start.roster", self.start.roster),
            ("survivors.health", self.survivors.health),
            ("survivors.hunger", self.survivors.hunger),
            ("survivors.thirst", self.survivors.thirst),
            ("survivors.morale", self.survivors.morale),
            ("attrition.food", self.attrition.food),
            ("attrition.water", self.attrition.water),
        ]
        .into_iter()
        .chain(self.start.medicine.map(|span| ("start.medicine", span)));
        for (field, span) in stores {
            if !span.is_ordered() {
                return Err(ScenarioError::Validation(format!(
                    "{field} has min {} greater than max {}",
                    span.min, span.max
                )));
            }
            if span.min < 0 {
                return Err(ScenarioError::Validation(format!(
                    "{field} must not be negative"
                )));
            }
        }

        if self.start.roster.max == 0 {
            return Err(ScenarioError::Validation(
                "start.roster must allow at least one survivor".into(),
            ));
        }
        if self.survivors.health.min < 1 {
            return Err(ScenarioError::Validation(
                "survivors.health must start at 1 or more".into(),
            ));
        }
        if self.survivors.names.is_empty() {
            return Err(ScenarioError::Validation(
                "survivors.names must contain at least one name".into(),
            ));
        }
        for (field, percent) in [
            ("events.trigger_percent", self.events.trigger_percent),
            ("survivors.sick_percent", self.survivors.sick_percent),
        ] {
            if percent > 100 {
                return Err(ScenarioError::Validation(format!(
                    "{field} must be between 0 and 100, got {percent}"
                )));
            }
        }
        if self.pacing.max_batch_days == 0 {
            return Err(ScenarioError::Validation(
                "pacing.max_batch_days must be at least 1".into(),
            ));
        }

        self.event_table()?;
        Ok(())
    }

    /// The built-in table, or the scenario's own, with `extra` entries merged in by id.
    pub fn event_table(&self) -> Result<EventTable, ScenarioError> {
        let mut table = match &self.events.table {
            Some(entries) => EventTable::new(entries.clone())?,
            None => EventTable::canonical(),
        };
        for entry in &self.events.extra {
            table.insert(entry.clone());
        }
        table.validate()?;
        Ok(table)
    }

    /// CLI override first, then the scenario's seed, then fresh entropy.
    pub fn seed(&self, override_seed: Option<u64>) -> u64 {
        override_seed
            .or(self.seed)
            .unwrap_or_else(rand::random::<u64>)
    }

    pub fn build_world<R: Rng + ?Sized>(&self, rng: &mut R) -> World {
        let stock = |span: Span, rng: &mut R| span.sample(rng).max(0) as u32;
        let medicine = self
            .start
            .medicine
            .map(|span| stock(span, rng))
            .unwrap_or(0);
        let shelter = Shelter::new(
            stock(self.start.food, rng),
            stock(self.start.water, rng),
            stock(self.start.ammunition, rng),
        )
        .with_medicine(medicine);
        let headcount = self.start.roster.sample(rng).max(1);
        let survivors = (0..headcount).map(|_| self.survivors.roll(rng)).collect();
        World::new(shelter, survivors, self.survivors.clone())
    }
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        scenario
            .validate()
            .with_context(|| format!("Invalid scenario {}", path.display()))?;
        Ok(scenario)
    }
}
