//! Interactive text menu over the ranking workflows

use crate::error::{ranking_error, RankingError, Result};
use crate::rating::StateStore;
use crate::service::app::RankingService;
use crate::source::TournamentSource;
use std::io::{BufRead, Write};
use tracing::{debug, warn};

const OPTIONS: &str = "1. Add a tournament\n2. Look up a player\n3. Rebuild all rankings\n4. Exit";

/// Where the menu loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuState {
    Prompt,
    AskContinue,
    Done,
}

/// A validated menu selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    AddTournament,
    PlayerLookup,
    Rebuild,
    Exit,
}

impl MenuChoice {
    /// Parse a numbered option, rejecting non-numeric or out of range input
    pub fn parse(input: &str) -> Result<Self> {
        let number: u32 = input.trim().parse().map_err(|_| RankingError::MalformedInput {
            reason: format!("'{}' is not a number", input.trim()),
        })?;

        match number {
            1 => Ok(MenuChoice::AddTournament),
            2 => Ok(MenuChoice::PlayerLookup),
            3 => Ok(MenuChoice::Rebuild),
            4 => Ok(MenuChoice::Exit),
            other => Err(RankingError::MalformedInput {
                reason: format!("option {} is out of range", other),
            }
            .into()),
        }
    }
}

/// Drives a `RankingService` from line-based input
pub struct InteractiveMenu<'a, S: TournamentSource, T: StateStore> {
    service: &'a RankingService<S, T>,
}

impl<'a, S: TournamentSource, T: StateStore> InteractiveMenu<'a, S, T> {
    pub fn new(service: &'a RankingService<S, T>) -> Self {
        Self { service }
    }

    /// Run until the user exits or input ends
    ///
    /// Workflow errors are reported and the loop continues.
    pub async fn run<R: BufRead, W: Write>(&self, mut input: R, mut output: W) -> Result<()> {
        let mut state = MenuState::Prompt;
        writeln!(output, "What would you like to do?\n{}", OPTIONS)?;

        while state != MenuState::Done {
            debug!("Menu state {:?}", state);
            state = match state {
                MenuState::Prompt => self.prompt(&mut input, &mut output).await?,
                MenuState::AskContinue => ask_continue(&mut input, &mut output)?,
                MenuState::Done => MenuState::Done,
            };
        }

        writeln!(output, "Done.")?;
        output.flush()?;
        Ok(())
    }

    async fn prompt<R: BufRead, W: Write>(&self, input: &mut R, output: &mut W) -> Result<MenuState> {
        let Some(line) = read_answer(input, output, "Choose an option: ")? else {
            return Ok(MenuState::Done);
        };

        let choice = match MenuChoice::parse(&line) {
            Ok(choice) => choice,
            Err(e) => {
                warn!("Rejected menu input: {}", e);
                writeln!(output, "Invalid option. Please try again.\n{}", OPTIONS)?;
                return Ok(MenuState::Prompt);
            }
        };

        match choice {
            MenuChoice::AddTournament => {
                let Some(tournament) =
                    read_answer(input, output, "Please enter a tournament identifier: ")?
                else {
                    return Ok(MenuState::Done);
                };
                writeln!(output, "Adding {}...", tournament)?;
                match self.service.add_tournament(&tournament).await {
                    Ok(outcome) => writeln!(
                        output,
                        "Success. {} matches applied, {} players ranked.",
                        outcome.summary.edges_applied, outcome.total_players
                    )?,
                    Err(e) => report_error(output, &e)?,
                }
            }
            MenuChoice::PlayerLookup => {
                let Some(player) = read_answer(input, output, "Please enter a player name: ")?
                else {
                    return Ok(MenuState::Done);
                };
                match self.service.player_summary(&player) {
                    Ok(summary) => write!(output, "{}", summary)?,
                    Err(e) => report_error(output, &e)?,
                }
            }
            MenuChoice::Rebuild => {
                writeln!(output, "Running...")?;
                match self.service.rebuild_all().await {
                    Ok(outcome) => {
                        writeln!(output, "Tournaments checked:")?;
                        for summary in &outcome.tournaments {
                            writeln!(output, "* {}", summary.tournament)?;
                        }
                        writeln!(output, "{} players ranked.", outcome.total_players)?;
                    }
                    Err(e) => report_error(output, &e)?,
                }
            }
            MenuChoice::Exit => return Ok(MenuState::Done),
        }

        Ok(MenuState::AskContinue)
    }
}

fn ask_continue<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<MenuState> {
    let Some(answer) = read_answer(input, output, "Would you like to do anything else? (y/n): ")?
    else {
        return Ok(MenuState::Done);
    };

    match answer.to_ascii_lowercase().as_str() {
        "y" | "yes" => {
            writeln!(output, "{}", OPTIONS)?;
            Ok(MenuState::Prompt)
        }
        "n" | "no" => Ok(MenuState::Done),
        _ => {
            writeln!(output, "Invalid option. Please try again.")?;
            Ok(MenuState::AskContinue)
        }
    }
}

/// Print `prompt` and read one trimmed line; `None` at end of input
fn read_answer<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
) -> Result<Option<String>> {
    write!(output, "{}", prompt)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn report_error<W: Write>(output: &mut W, err: &anyhow::Error) -> Result<()> {
    match ranking_error(err) {
        Some(RankingError::UnknownPlayer { player_id }) => {
            writeln!(output, "No player named '{}' has been ranked.", player_id)?
        }
        Some(RankingError::DuplicateTournament { tournament }) => {
            writeln!(output, "Tournament '{}' was already added.", tournament)?
        }
        _ => writeln!(output, "Failed: {}", err)?,
    }
    Ok(())
}
