//! Interactive text front end. Reads one line per prompt and drives a
//! [`GameSession`] through its public actions.

pub mod menu;

use std::{io::Write, time::Duration};

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::warn;

use crate::{
    engine::EndReason,
    narrator::Narrator,
    session::{ActionError, ActionReport, GameSession, RATION_COST, TREATMENT_COST},
};

use self::menu::{parse_choice, render, InputError, GATHER_MENU, MAIN_MENU, MANAGE_MENU};

#[derive(Debug, Clone)]
pub struct ConsoleSettings {
    pub day_delay: Duration,
    pub max_batch_days: u32,
}

impl ConsoleSettings {
    pub fn from_session(session: &GameSession) -> Self {
        let pacing = &session.scenario().pacing;
        Self {
            day_delay: Duration::from_millis(pacing.day_delay_ms),
            max_batch_days: pacing.max_batch_days,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Writes narrative straight to the console.
struct ConsoleNarrator<'a, W: Write> {
    out: &'a mut W,
    error: Option<std::io::Error>,
}

impl<'a, W: Write> ConsoleNarrator<'a, W> {
    fn new(out: &'a mut W) -> Self {
        Self { out, error: None }
    }

    fn write(&mut self, line: &str) {
        if self.error.is_none() {
            if let Err(err) = writeln!(self.out, "{line}") {
                self.error = Some(err);
            }
        }
    }

    fn finish(self) -> std::io::Result<()> {
        match self.error {
            Some(err) => Err(err),
            None => self.out.flush(),
        }
    }
}

impl<W: Write> Narrator for ConsoleNarrator<'_, W> {
    fn present(&mut self, lines: &[String]) {
        for line in lines {
            self.write(line);
        }
    }

    fn report_end(&mut self, _reason: &EndReason) {
        self.write("=== GAME OVER ===");
    }
}

pub struct Console<R, W> {
    input: R,
    output: W,
    settings: ConsoleSettings,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(input: R, output: W, settings: ConsoleSettings) -> Self {
        Self {
            input,
            output,
            settings,
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Main menu loop. Returns when the player exits, input closes or the session ends.
    pub async fn run(&mut self, session: &mut GameSession) -> Result<()> {
        loop {
            self.say("")?;
            self.say(format!("Day: {}", session.day()))?;
            self.say_all(render("Menu", &MAIN_MENU))?;
            let Some(choice) = self.prompt_choice("Select an option: ", MAIN_MENU.len()).await?
            else {
                return Ok(());
            };
            let choice = match choice {
                Ok(choice) => choice,
                Err(err) => {
                    self.reject(&err)?;
                    continue;
                }
            };
            let flow = match choice {
                1 => self.simulate(session).await?,
                2 => {
                    self.inventory(session)?;
                    Flow::Continue
                }
                3 => self.manage(session).await?,
                4 => self.gather(session).await?,
                _ => {
                    self.say("Exiting game...")?;
                    Flow::Quit
                }
            };
            if flow == Flow::Quit || session.is_over() {
                return Ok(());
            }
        }
    }

    async fn simulate(&mut self, session: &mut GameSession) -> Result<Flow> {
        let max = self.settings.max_batch_days as usize;
        let prompt = format!("Enter the number of days to simulate (1-{max}): ");
        let Some(days) = self.prompt_choice(&prompt, max).await? else {
            return Ok(Flow::Quit);
        };
        let days = match days {
            Ok(days) => days,
            Err(err) => {
                self.reject(&err)?;
                return Ok(Flow::Continue);
            }
        };
        self.say(format!("Simulating {days} days..."))?;
        for _ in 0..days {
            if !self.settings.day_delay.is_zero() {
                tokio::time::sleep(self.settings.day_delay).await;
            }
            self.say(format!("--- Day {} ---", session.day() + 1))?;
            let mut narrator = ConsoleNarrator::new(&mut self.output);
            session.simulate_days(1, &mut narrator)?;
            narrator.finish()?;
            if session.is_over() {
                return Ok(Flow::Quit);
            }
        }
        self.say("Simulation complete.")?;
        Ok(Flow::Continue)
    }

    fn inventory(&mut self, session: &GameSession) -> Result<()> {
        let shelter = session.shelter();
        self.say_all([
            "=== Inventory ===".to_string(),
            format!("Food: {}", shelter.food()),
            format!("Water: {}", shelter.water()),
            format!("Medicine: {}", shelter.medicine()),
            format!("Ammunition: {}", shelter.ammunition()),
        ])
    }

    async fn manage(&mut self, session: &mut GameSession) -> Result<Flow> {
        loop {
            self.say_all(render("Manage Survivors", &MANAGE_MENU))?;
            let Some(choice) = self.prompt_choice("Choose an action: ", MANAGE_MENU.len()).await?
            else {
                return Ok(Flow::Quit);
            };
            let choice = match choice {
                Ok(choice) => choice,
                Err(err) => {
                    self.reject(&err)?;
                    continue;
                }
            };
            match choice {
                1 | 2 => {
                    let (label, stock) = if choice == 1 {
                        ("food", session.shelter().food())
                    } else {
                        ("water", session.shelter().water())
                    };
                    if stock < RATION_COST {
                        self.report(Err(ActionError::InsufficientResources {
                            resource: label,
                            needed: RATION_COST,
                            available: stock,
                        }))?;
                        continue;
                    }
                    let names: Vec<String> = session
                        .survivors()
                        .iter()
                        .map(|survivor| survivor.name().to_string())
                        .collect();
                    let Some(index) = self.pick(&format!("give {label} to"), &names).await? else {
                        continue;
                    };
                    let outcome = if choice == 1 {
                        session.give_food(index)
                    } else {
                        session.give_water(index)
                    };
                    self.report(outcome)?;
                }
                3 => {
                    if session.shelter().medicine() < TREATMENT_COST {
                        self.say("No medicine available!")?;
                        continue;
                    }
                    let sick = session.sick_survivors();
                    if sick.is_empty() {
                        self.say("Let's celebrate, no one is sick!")?;
                        continue;
                    }
                    let names: Vec<String> = sick
                        .iter()
                        .map(|&index| session.survivors()[index].name().to_string())
                        .collect();
                    let Some(pick) = self.pick("treat", &names).await? else {
                        continue;
                    };
                    let outcome = session.treat_survivor(sick[pick]);
                    self.report(outcome)?;
                }
                4 => {
                    let outcome = session.boost_all_morale();
                    self.report(outcome)?;
                }
                5 => {
                    let lines: Vec<String> = std::iter::once("--- Survivor Status ---".to_string())
                        .chain(session.survivors().iter().map(|s| s.status_line()))
                        .collect();
                    self.say_all(lines)?;
                }
                _ => return Ok(Flow::Continue),
            }
        }
    }

    async fn gather(&mut self, session: &mut GameSession) -> Result<Flow> {
        self.say_all(render("Gather Resources", &GATHER_MENU))?;
        let Some(choice) = self.prompt_choice("Choose an action: ", GATHER_MENU.len()).await?
        else {
            return Ok(Flow::Quit);
        };
        let report = match choice {
            Ok(1) => Ok(session.scavenge_food()),
            Ok(2) => Ok(session.collect_water()),
            Ok(3) => Ok(session.search_medicine()),
            Ok(4) => session.hunt(),
            Ok(_) => return Ok(Flow::Continue),
            Err(err) => {
                self.reject(&err)?;
                return Ok(Flow::Continue);
            }
        };
        self.report(report)?;
        Ok(Flow::Continue)
    }

    /// Lists `names` and returns the chosen 0-based index, or `None` on bad input.
    async fn pick(&mut self, verb: &str, names: &[String]) -> Result<Option<usize>> {
        if names.is_empty() {
            self.say("There is no one left to look after.")?;
            return Ok(None);
        }
        self.say(format!("Select a survivor to {verb}:"))?;
        let listing: Vec<String> = names
            .iter()
            .enumerate()
            .map(|(index, name)| format!("{}. {name}", index + 1))
            .collect();
        self.say_all(listing)?;
        match self.prompt_choice("> ", names.len()).await? {
            Some(Ok(choice)) => Ok(Some(choice - 1)),
            Some(Err(err)) => {
                self.reject(&err)?;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn prompt_choice(
        &mut self,
        prompt: &str,
        max: usize,
    ) -> Result<Option<Result<usize, InputError>>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(parse_choice(&line, max)))
    }

    fn report(&mut self, outcome: Result<ActionReport, ActionError>) -> Result<()> {
        match outcome {
            Ok(report) => self.say(report.message()),
            Err(err) => self.say(err.to_string()),
        }
    }

    fn reject(&mut self, err: &InputError) -> Result<()> {
        warn!(%err, "rejected menu input");
        self.say(err.to_string())
    }

    fn say(&mut self, line: impl AsRef<str>) -> Result<()> {
        writeln!(self.output, "{}", line.as_ref())?;
        Ok(())
    }

    fn say_all(&mut self, lines: impl IntoIterator<Item = String>) -> Result<()> {
        for line in lines {
            writeln!(self.output, "{line}")?;
        }
        self.output.flush()?;
        Ok(())
    }
}
