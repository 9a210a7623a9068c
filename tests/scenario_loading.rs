use std::path::PathBuf;

use holdout::{
    rng::{RngManager, Span},
    scenario::ScenarioLoader,
    GameSession,
};

fn scenario_loader() -> ScenarioLoader {
    ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn outpost_fixture_matches_builtin_defaults() {
    let scenario = scenario_loader()
        .load(PathBuf::from("scenarios/outpost.yaml"))
        .expect("scenario parses");
    assert_eq!(scenario.name, "outpost");
    assert_eq!(scenario.seed, Some(7));
    assert_eq!(scenario.events.trigger_percent, 30);
    assert_eq!(scenario.attrition.food, Span::new(1, 3));
    assert_eq!(scenario.survivors.names.len(), 10);
    assert_eq!(scenario.event_table().expect("event table should build").len(), 27);
}

#[test]
fn long_winter_extends_the_event_table() {
    let scenario = scenario_loader()
        .load("scenarios/long_winter.yaml")
        .expect("scenario parses");
    let table = scenario.event_table().expect("event table should build");
    assert_eq!(table.len(), 29);
    assert_eq!(table.get(2).expect("event should exist").title, "Frozen Radio");
    assert_eq!(table.get(28).expect("event should exist").weight, 3);
    assert_eq!(scenario.pacing.max_batch_days, 7);

    let mut rng = RngManager::new(scenario.seed(None));
    let world = scenario.build_world(&mut rng.stream("setup"));
    assert_eq!(world.headcount(), 4);
    assert!((1..=2).contains(&world.shelter().medicine()));
}

#[test]
fn invalid_scenario_is_rejected_with_context() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("broken.yaml");
    std::fs::write(
        &path,
        "name: broken\nattrition:\n  food: { min: 5, max: 1 }\n",
    )
    .expect("fixture should write");

    let err = ScenarioLoader::new(dir.path())
        .load("broken.yaml")
        .unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("Invalid scenario"), "{message}");
    assert!(message.contains("attrition.food"), "{message}");
}

#[test]
fn unparseable_yaml_reports_the_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    std::fs::write(dir.path().join("garbled.yaml"), "events: [not, a, map")
        .expect("fixture should write");
    let err = ScenarioLoader::new(dir.path())
        .load("garbled.yaml")
        .unwrap_err();
    assert!(err.to_string().contains("Failed to parse"));
}

#[test]
fn missing_file_is_an_error() {
    let err = scenario_loader().load("scenarios/nowhere.yaml").unwrap_err();
    assert!(err.to_string().contains("Failed to read scenario file"));
}

#[test]
fn custom_table_replaces_the_canonical_one() {
    let dir = tempfile::tempdir().expect("temp dir");
    std::fs::write(
        dir.path().join("calm.yaml"),
        r#"
name: calm
seed: 3
events:
  trigger_percent: 100
  table:
    - id: 1
      title: Birdsong
      message: nothing at all happens.
"#,
    )
    .expect("fixture should write");
    let scenario = ScenarioLoader::new(dir.path()).load("calm.yaml").expect("scenario should load");
    let mut session = GameSession::new(scenario, 3).expect("scenario should load");
    let outcome = session.advance_one_day().expect("day should advance");
    assert!(outcome
        .narrative
        .iter()
        .any(|line| line == "Birdsong - nothing at all happens."));
}
