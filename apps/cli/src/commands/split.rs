//! `divvy split FILE --with A,B [--payer A]`: allocate and settle one
//! receipt, reading allocation commands from the terminal.

use std::io::{BufRead, Write};

use anyhow::{bail, Context, Result};
use divvy_core::session::Session;
use divvy_core::ValidationError;
use divvy_core::CoreError;
use tracing::info;

use super::read_receipt_lines;
use crate::cli::SplitArgs;
use crate::console::{drive_allocation, Prompt};

/// Runs one split against an open session.
///
/// Shoppers named in `--with` that are not registered yet are registered.
/// Returns `false` when the allocation was cancelled.
pub fn run<R: BufRead, W: Write>(
    args: &SplitArgs,
    session: &mut Session,
    prompt: &mut Prompt<R, W>,
) -> Result<bool> {
    for name in &args.with {
        match session.register(name) {
            Ok(id) => info!(%id, name = %name, "Registered new shopper"),
            Err(CoreError::Validation(ValidationError::Duplicate { .. })) => {}
            Err(e) => return Err(e).with_context(|| format!("Cannot register '{}'", name)),
        }
    }

    let lines = read_receipt_lines(&args.file)?;
    let receipt = session
        .scan(&lines)
        .with_context(|| format!("Could not read {} as a receipt", args.file.display()))?;
    for warning in receipt.warnings() {
        prompt.say(format!("Warning: {}", warning))?;
    }

    let payer = match &args.payer {
        Some(payer) => payer.clone(),
        None => match args.with.first() {
            Some(first) => first.clone(),
            None => bail!("--with needs at least two shoppers"),
        },
    };

    let mut engine = session.begin_allocation(&args.with)?;
    if !drive_allocation(&mut engine, prompt)? {
        prompt.say("Allocation cancelled.")?;
        return Ok(false);
    }

    let report = session.settle(engine, &payer)?;
    if args.json {
        prompt.say(serde_json::to_string_pretty(&report)?)?;
    } else {
        prompt.say(&report)?;
    }
    Ok(true)
}
