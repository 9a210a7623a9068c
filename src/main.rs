use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use holdout::{
    console::{Console, ConsoleSettings},
    engine::DayOutcome,
    narrator::Transcript,
    scenario::{Scenario, ScenarioLoader},
    session::GameSession,
    world::WorldSnapshot,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Keep a shelter of survivors alive, one day at a time")]
struct Cli {
    /// Path to a scenario YAML file (built-in defaults when omitted)
    #[arg(long, global = true)]
    scenario: Option<PathBuf>,

    /// Seed for every random roll (overrides the scenario; random when both are absent)
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Play interactively through the menus
    Play {
        /// Pause between simulated days, in milliseconds
        #[arg(long)]
        day_delay_ms: Option<u64>,
    },
    /// Run a batch of days with no input and print what happened
    Simulate {
        #[arg(long, default_value_t = 10)]
        days: u32,

        /// Print a JSON report instead of the narrative
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct SimulationReport<'a> {
    seed: u64,
    days_requested: u32,
    ended: bool,
    outcomes: &'a [DayOutcome],
    final_state: WorldSnapshot,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "holdout=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let scenario = match &cli.scenario {
        Some(path) => ScenarioLoader::new(".").load(path)?,
        None => Scenario::default(),
    };
    let seed = scenario.seed(cli.seed);
    let mut session = GameSession::new(scenario, seed)?;

    match cli.command.unwrap_or(Command::Play { day_delay_ms: None }) {
        Command::Play { day_delay_ms } => {
            let mut settings = ConsoleSettings::from_session(&session);
            if let Some(ms) = day_delay_ms {
                settings.day_delay = Duration::from_millis(ms);
            }
            let input = tokio::io::BufReader::new(tokio::io::stdin());
            let mut console = Console::new(input, std::io::stdout(), settings);
            console.run(&mut session).await?;
        }
        Command::Simulate { days, json } => {
            let mut transcript = Transcript::new();
            let outcomes = session.simulate_days(days, &mut transcript)?;
            if json {
                let report = SimulationReport {
                    seed: session.seed(),
                    days_requested: days,
                    ended: session.is_over(),
                    outcomes: &outcomes,
                    final_state: session.snapshot(),
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for outcome in &outcomes {
                    println!("--- Day {} ---", outcome.day);
                    for line in &outcome.narrative {
                        println!("{line}");
                    }
                }
                println!();
                println!(
                    "Scenario '{}' (seed {}) stopped after {} days with {} survivors.",
                    session.scenario().name,
                    session.seed(),
                    session.day(),
                    session.survivors().len()
                );
                for survivor in session.survivors() {
                    println!("  {}", survivor.status_line());
                }
            }
        }
    }
    Ok(())
}
