//! # divvy-store: File Layer for Divvy
//!
//! Reads and writes the files around a Divvy session: the shopper ledger and
//! the `divvy.toml` configuration.
//!
//! ## Usage
//! ```rust,no_run
//! use divvy_core::session::{Roster, Session, SpendingStore};
//! use divvy_store::DivvyConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DivvyConfig::load(None)?;
//! let ledger = config.ledger()?;
//!
//! let roster = Roster::from_spending(ledger.load()?)?;
//! let session = Session::with_roster(roster, config.parser.clone(), config.settlement);
//!
//! // ... scan, allocate, settle ...
//!
//! ledger.save(&session.spending_snapshot())?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod ledger;

pub use config::{DivvyConfig, StorageSettings};
pub use error::{StoreError, StoreResult};
pub use ledger::ShopperLedger;
