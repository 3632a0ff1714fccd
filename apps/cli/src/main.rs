//! # divvy
//!
//! Terminal front end for dividing a grocery receipt.
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  init tracing (stderr, RUST_LOG, default divvy=info)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DivvyConfig::load(--config)  ──► --ledger override                     │
//! │       │                                                                 │
//! │       ├── scan   ──► ReceiptParser ──► print receipt                    │
//! │       ├── split  ──► Session ──► allocation loop ──► report ──► ledger  │
//! │       └── (none) ──► Session ──► menu loop ──────────────────► ledger   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cli;
mod commands;
mod console;

use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use divvy_store::DivvyConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::console::Prompt;

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = DivvyConfig::load(cli.config.clone()).context("Failed to load configuration")?;
    if let Some(ledger) = cli.ledger.clone() {
        config.storage.ledger_path = Some(ledger);
    }
    info!(
        header_rows = config.parser.header_rows,
        name_gap = config.parser.name_gap,
        residue = %config.settlement.residue,
        "Configuration loaded"
    );

    let stdin = io::stdin();
    let stdout = io::stdout();

    match &cli.command {
        Some(Commands::Scan(args)) => commands::scan::run(args, &config, &mut stdout.lock()),
        Some(Commands::Split(args)) => {
            let (mut session, ledger) = commands::open_session(&config)?;
            let mut prompt = Prompt::new(stdin.lock(), stdout.lock());
            if commands::split::run(args, &mut session, &mut prompt)? {
                commands::close_session(&session, &ledger)?;
            }
            Ok(())
        }
        None => {
            let (mut session, ledger) = commands::open_session(&config)?;
            let mut prompt = Prompt::new(stdin.lock(), stdout.lock());
            let outcome = commands::menu::run(&mut session, &mut prompt);
            commands::close_session(&session, &ledger)?;
            info!("Goodbye");
            outcome
        }
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show parser decisions line by line
/// - `RUST_LOG=divvy_core=trace` - Core crate only
/// - Default: `divvy=info` plus warnings from everything else
///
/// Logs go to stderr so they never mix with receipt or report output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,divvy=info,divvy_core=info,divvy_store=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
