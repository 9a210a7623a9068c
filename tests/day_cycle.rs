use anyhow::Result;
use holdout::{
    engine::{DayLog, EndReason, EngineBuilder, EngineSettings, System, SystemContext},
    narrator::Transcript,
    rng::SystemRng,
    scenario::Scenario,
    session::GameSession,
    systems::{AttritionSystem, SurvivorSystem},
    world::{Shelter, Survivor, SurvivorProfile, World},
};

struct CatastropheOn {
    day: u32,
}

impl System for CatastropheOn {
    fn name(&self) -> &str {
        "catastrophe_on"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        _world: &mut World,
        _rng: &mut SystemRng<'_>,
        log: &mut DayLog,
    ) -> Result<()> {
        if ctx.day == self.day {
            log.push("Nuclear Strike - the sky turns white.");
            log.catastrophe("Nuclear Strike");
        }
        Ok(())
    }
}

fn settings(seed: u64) -> EngineSettings {
    EngineSettings {
        scenario_name: "day_cycle".into(),
        seed,
    }
}

fn hardy_world() -> World {
    World::new(
        Shelter::new(100, 100, 10),
        vec![
            Survivor::with_vitals("Ada", 20, 9, 9, 5),
            Survivor::with_vitals("Bruno", 20, 9, 9, 5),
        ],
        SurvivorProfile::default(),
    )
}

#[test]
fn same_seed_replays_the_same_game() {
    let run = |seed| {
        let mut session =
            GameSession::new(Scenario::default(), seed).expect("scenario should load");
        let mut transcript = Transcript::new();
        let outcomes = session.simulate_days(15, &mut transcript).expect("batch should run");
        (outcomes, session.snapshot())
    };
    let (outcomes_a, snapshot_a) = run(99);
    let (outcomes_b, snapshot_b) = run(99);
    assert_eq!(outcomes_a, outcomes_b);
    assert_eq!(snapshot_a, snapshot_b);
}

#[test]
fn batch_halts_on_catastrophe_day() {
    let scenario = Scenario::default();
    let engine = EngineBuilder::new(settings(4))
        .with_system(SurvivorSystem::new())
        .with_system(AttritionSystem::default())
        .with_system(CatastropheOn { day: 2 })
        .build();
    let mut session = GameSession::from_parts(scenario, hardy_world(), engine);

    let mut transcript = Transcript::new();
    let outcomes = session.simulate_days(3, &mut transcript).expect("batch should run");

    assert_eq!(outcomes.len(), 2);
    assert_eq!(session.day(), 2);
    assert!(outcomes[1].ended);
    assert!(session.is_over());
    assert_eq!(
        transcript.end,
        Some(EndReason::Catastrophe {
            event: "Nuclear Strike".into()
        })
    );
    assert!(session.advance_one_day().is_err());
}

#[test]
fn starving_last_survivor_ends_the_game() {
    let scenario = Scenario::default();
    let engine = EngineBuilder::new(settings(4))
        .with_system(SurvivorSystem::new())
        .build();
    let world = World::new(
        Shelter::new(10, 10, 0),
        vec![Survivor::with_vitals("Ivo", 4, 0, 4, 5)],
        SurvivorProfile::default(),
    );
    let mut session = GameSession::from_parts(scenario, world, engine);

    let outcome = session.advance_one_day().expect("day should advance");
    assert!(outcome.ended);
    assert_eq!(outcome.end_reason, Some(EndReason::RosterWiped));
    assert!(session.survivors().is_empty());
    assert_eq!(session.end_reason(), Some(&EndReason::RosterWiped));
}

#[test]
fn every_day_follows_upkeep_attrition_then_event() {
    let mut session = GameSession::new(Scenario::default(), 2024).expect("scenario should load");
    let outcome = session.advance_one_day().expect("day should advance");
    let attrition = outcome
        .narrative
        .iter()
        .position(|line| line.starts_with("The shelter used"))
        .expect("attrition is always narrated");
    assert!(outcome.narrative[..attrition]
        .iter()
        .all(|line| line.contains("has died")));
    assert_eq!(outcome.day, 1);
}

#[test]
fn long_runs_keep_invariants() {
    for seed in 0..20 {
        let mut session =
            GameSession::new(Scenario::default(), seed).expect("scenario should load");
        for _ in 0..60 {
            if session.is_over() {
                break;
            }
            session.advance_one_day().expect("day should advance");
            for survivor in session.survivors() {
                assert!((0..=20).contains(&survivor.health()));
                assert!((0..=10).contains(&survivor.morale()));
                assert!(survivor.health() > 0, "dead survivors leave the roster");
            }
        }
    }
}
