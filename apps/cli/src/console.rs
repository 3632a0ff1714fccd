//! Terminal interaction: prompts, allocation commands and the allocation loop.
//!
//! Reader and writer are generic so the loops can be driven from a byte
//! buffer in tests.

use std::io::{BufRead, Write};
use std::str::FromStr;

use anyhow::{bail, Result};
use divvy_core::allocation::{AllocationCommand, AllocationEngine, AllocationView, Participant};
use divvy_core::{AllocationState, Owner, POOL_NAME};
use tracing::debug;

// =============================================================================
// Prompt
// =============================================================================

/// Line-oriented prompt over any reader/writer pair.
pub struct Prompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Prompt { input, output }
    }

    /// Prints `message` and reads one trimmed line. `None` at end of input.
    pub fn ask(&mut self, message: &str) -> Result<Option<String>> {
        write!(self.output, "{}\n< ", message)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Asks a yes/no question. End of input counts as no.
    pub fn confirm(&mut self, question: &str) -> Result<bool> {
        loop {
            match self.ask(&format!("{} (y/n)", question))?.as_deref() {
                Some("y") | Some("Y") | Some("yes") => return Ok(true),
                Some("n") | Some("N") | Some("no") | None => return Ok(false),
                Some(_) => self.say("Please answer y or n.")?,
            }
        }
    }

    pub fn say(&mut self, message: impl std::fmt::Display) -> Result<()> {
        writeln!(self.output, "{}", message)?;
        Ok(())
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }
}

// =============================================================================
// Allocation Input
// =============================================================================

/// One line typed during allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Previous,
    Next,
    Assign(String),
    Pool,
    Submit,
    Cancel,
    Help,
}

impl FromStr for Input {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (word, rest) = s.split_once(char::is_whitespace).unwrap_or((s, ""));

        match word.to_lowercase().as_str() {
            "p" | "prev" | "previous" => Ok(Input::Previous),
            "n" | "next" => Ok(Input::Next),
            "a" | "assign" if !rest.trim().is_empty() => Ok(Input::Assign(rest.trim().to_string())),
            "a" | "assign" => bail!("Usage: a <name>"),
            "pool" | "c" | "combined" => Ok(Input::Pool),
            "s" | "submit" => Ok(Input::Submit),
            "x" | "cancel" => Ok(Input::Cancel),
            "h" | "?" | "help" => Ok(Input::Help),
            other => bail!("Unknown command '{}'. Type 'h' for help.", other),
        }
    }
}

impl Input {
    /// Maps typed input to an engine command.
    ///
    /// Names are matched case-insensitively against the participants; an
    /// unknown name is reported here and never reaches the engine.
    pub fn to_command(&self, participants: &[Participant]) -> Result<Option<AllocationCommand>> {
        let command = match self {
            Input::Previous => AllocationCommand::Previous,
            Input::Next => AllocationCommand::Next,
            Input::Pool => AllocationCommand::AssignTo(Owner::Pool),
            Input::Submit => AllocationCommand::Submit,
            Input::Cancel => AllocationCommand::Cancel,
            Input::Help => return Ok(None),
            Input::Assign(name) => {
                let wanted = name.to_lowercase();
                match participants.iter().find(|p| p.name == wanted) {
                    Some(p) => AllocationCommand::AssignTo(Owner::Participant(p.id)),
                    None => bail!("'{}' is not sharing this receipt", name),
                }
            }
        };
        Ok(Some(command))
    }
}

const HELP: &str = "p: previous | n: next | a <name>: assign | pool: shared | s: submit | x: cancel";

/// Owner label for display.
pub fn owner_label(owner: Owner, participants: &[Participant]) -> String {
    match owner {
        Owner::Pool => POOL_NAME.to_string(),
        Owner::Participant(id) => participants
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| id.to_string()),
    }
}

fn render_view(view: &AllocationView, participants: &[Participant]) -> String {
    format!(
        "[{}/{}] {}  {}  -> {}",
        view.position,
        view.item_count,
        view.item_name,
        view.price,
        owner_label(view.owner, participants)
    )
}

/// Runs the allocation loop until submit or cancel.
///
/// Returns `true` when the allocation was submitted.
pub fn drive_allocation<R: BufRead, W: Write>(
    engine: &mut AllocationEngine,
    prompt: &mut Prompt<R, W>,
) -> Result<bool> {
    let participants = engine.participants().to_vec();
    prompt.say(HELP)?;
    let mut view = engine.view();

    loop {
        let Some(line) = prompt.ask(&render_view(&view, &participants))? else {
            bail!("Input ended before the allocation was submitted");
        };

        let command = match line.parse::<Input>().and_then(|i| i.to_command(&participants)) {
            Ok(Some(command)) => command,
            Ok(None) => {
                prompt.say(HELP)?;
                continue;
            }
            Err(e) => {
                prompt.say(e)?;
                continue;
            }
        };

        if command == AllocationCommand::Submit
            && !prompt.confirm("Submit this allocation?")?
        {
            continue;
        }

        match engine.apply(command) {
            Ok(next) => {
                debug!(?command, position = next.position, "Allocation step");
                view = next;
            }
            Err(e) => prompt.say(e)?,
        }

        match view.state {
            AllocationState::Submitted => return Ok(true),
            AllocationState::Cancelled => return Ok(false),
            AllocationState::Reviewing => {
                prompt.say("All items visited. 's' to submit, 'p' to go back.")?
            }
            AllocationState::Assigning => {}
        }
    }
}
