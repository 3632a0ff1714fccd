//! The interactive menu started by a bare `divvy`.
//!
//! ```text
//! s  Scan Receipt              r  Register Shopper
//! d  Divide Receipt            l  Show Registered Shoppers
//! q  Quit Program (saves the shopper ledger)
//! ```

use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::Result;
use divvy_core::session::Session;
use divvy_core::MIN_PARTICIPANTS;
use tracing::{info, warn};

use super::read_receipt_lines;
use crate::console::{drive_allocation, Prompt};

const MENU: &str = "\
s: Scan Receipt | d: Divide Receipt | r: Register Shopper | l: Show Registered Shoppers | q: Quit Program";

/// Runs the menu until `q` or end of input.
pub fn run<R: BufRead, W: Write>(session: &mut Session, prompt: &mut Prompt<R, W>) -> Result<()> {
    prompt.say("Welcome to Divvy!")?;

    loop {
        let Some(choice) = prompt.ask(MENU)? else {
            return Ok(());
        };

        match choice.to_lowercase().as_str() {
            "s" => scan(session, prompt)?,
            "d" => divide(session, prompt)?,
            "r" => register(session, prompt)?,
            "l" => list(session, prompt)?,
            "q" => return Ok(()),
            other => prompt.say(format!("'{}' is not a menu option.", other))?,
        }
    }
}

fn scan<R: BufRead, W: Write>(session: &mut Session, prompt: &mut Prompt<R, W>) -> Result<()> {
    let Some(path) = prompt.ask("Receipt text file:")? else {
        return Ok(());
    };

    let lines = match read_receipt_lines(Path::new(&path)) {
        Ok(lines) => lines,
        Err(e) => return prompt.say(format!("{:#}", e)),
    };

    match session.scan(&lines) {
        Ok(receipt) => {
            prompt.say(&*receipt)?;
            for warning in receipt.warnings() {
                prompt.say(format!("Warning: {}", warning))?;
            }
            prompt.say("Receipt Scanned.")
        }
        Err(e) => {
            warn!(error = %e, "Scan failed");
            prompt.say(format!("Scan failed: {}", e))
        }
    }
}

fn register<R: BufRead, W: Write>(session: &mut Session, prompt: &mut Prompt<R, W>) -> Result<()> {
    let Some(name) = prompt.ask("New shopper's name ('x' to return to menu):")? else {
        return Ok(());
    };
    if name.eq_ignore_ascii_case("x") {
        return Ok(());
    }

    match session.register(&name) {
        Ok(_) => prompt.say(format!("Registered {}.", name.trim().to_lowercase())),
        Err(e) => prompt.say(e),
    }
}

fn list<R: BufRead, W: Write>(session: &Session, prompt: &mut Prompt<R, W>) -> Result<()> {
    if session.roster().is_empty() {
        return prompt.say("No shoppers registered.");
    }
    for shopper in session.roster().iter() {
        prompt.say(format!("{}  (spent {})", shopper.name, shopper.spending_tracker))?;
    }
    Ok(())
}

fn divide<R: BufRead, W: Write>(session: &mut Session, prompt: &mut Prompt<R, W>) -> Result<()> {
    if session.receipt().is_none() {
        return prompt.say("Scan a receipt first.");
    }
    if session.roster().len() < MIN_PARTICIPANTS {
        return prompt.say(format!(
            "Dividing requires at least {} registered shoppers.",
            MIN_PARTICIPANTS
        ));
    }

    let Some(names) = prompt.ask("Shoppers splitting this receipt (comma separated):")? else {
        return Ok(());
    };
    let names: Vec<&str> = names.split(',').map(str::trim).collect();

    let mut engine = match session.begin_allocation(&names) {
        Ok(engine) => engine,
        Err(e) => return prompt.say(e),
    };

    match drive_allocation(&mut engine, prompt) {
        Ok(true) => {}
        Ok(false) => return prompt.say("Allocation cancelled."),
        Err(e) => {
            warn!(error = %e, "Allocation abandoned");
            return prompt.say(format!("Allocation cancelled: {}", e));
        }
    }

    loop {
        let Some(payer) = prompt.ask("Who paid?")? else {
            return Ok(());
        };
        if !names.iter().any(|n| n.eq_ignore_ascii_case(payer.trim())) {
            prompt.say(format!("'{}' is not sharing this receipt.", payer))?;
            continue;
        }

        let report = session.settle(engine, &payer)?;
        info!(payer = %payer, "Receipt divided");
        return prompt.say(&report);
    }
}
