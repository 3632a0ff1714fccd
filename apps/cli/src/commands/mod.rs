//! Command implementations and the helpers they share.

pub mod menu;
pub mod scan;
pub mod split;

use std::path::Path;

use anyhow::{Context, Result};
use divvy_core::session::{Roster, Session, SpendingStore};
use divvy_store::{DivvyConfig, ShopperLedger};
use tracing::info;

/// Reads a receipt text file, one receipt line per line.
pub fn read_receipt_lines(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read receipt {}", path.display()))?;
    Ok(contents.lines().map(str::to_string).collect())
}

/// Loads the shopper ledger and builds a session around it.
pub fn open_session(config: &DivvyConfig) -> Result<(Session, ShopperLedger)> {
    let ledger = config.ledger()?;
    let spending = ledger
        .load()
        .with_context(|| format!("Failed to load shoppers from {}", ledger.path().display()))?;
    let roster = Roster::from_spending(spending)?;
    info!(shoppers = roster.len(), "Session opened");

    let session = Session::with_roster(roster, config.parser.clone(), config.settlement);
    Ok((session, ledger))
}

/// Writes the session's spending trackers back to the ledger.
pub fn close_session(session: &Session, ledger: &ShopperLedger) -> Result<()> {
    ledger
        .save(&session.spending_snapshot())
        .with_context(|| format!("Failed to save shoppers to {}", ledger.path().display()))
}
