//! # divvy-core: Pure Logic for Divvy
//!
//! This crate turns extracted receipt text into priced items, lets a group
//! decide who takes what, and computes who owes the payer. It performs no
//! I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Divvy Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    divvy (terminal app)                         │   │
//! │  │    menu ──► scan ──► allocation loop ──► settlement report      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ divvy-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  parser   │  │  receipt  │  │allocation │  │settlement │  │   │
//! │  │   │ normalize │  │ Receipt   │  │  Engine   │  │  Report   │  │   │
//! │  │   │ reconcile │  │ Assembler │  │  Carts    │  │  Residue  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO FILES • NO TERMINAL • DETERMINISTIC (except ids/clocks)   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 divvy-store (File Layer)                        │   │
//! │  │              shopper ledger, divvy.toml config                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type with integer arithmetic
//! - [`types`] - Items, participants, owners, discount rates
//! - [`parser`] - Line normalizer, field extractor, discount reconciler
//! - [`receipt`] - Receipt aggregate and assembler
//! - [`allocation`] - Allocation state machine
//! - [`settlement`] - Pool split and owed amounts
//! - [`session`] - Shopper roster and the per-run workflow
//! - [`validation`] - Name and selection rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use divvy_core::parser::ParserProfile;
//! use divvy_core::session::Session;
//! use divvy_core::settlement::SettlementPolicy;
//! use divvy_core::allocation::AllocationCommand;
//!
//! let profile = ParserProfile { header_rows: 0, ..ParserProfile::default() };
//! let mut session = Session::new(profile, SettlementPolicy::default());
//! session.register("ann").unwrap();
//! session.register("bob").unwrap();
//!
//! session.scan(&["Pizza   9.00", "TOTAL   9.00"]).unwrap();
//! let mut engine = session.begin_allocation(&["ann", "bob"]).unwrap();
//! engine.apply(AllocationCommand::Submit).unwrap();
//!
//! let report = session.settle(engine, "ann").unwrap();
//! assert_eq!(report.to_string(), "bob owes ann: $4.50\n");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod allocation;
pub mod error;
pub mod money;
pub mod parser;
pub mod receipt;
pub mod session;
pub mod settlement;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use allocation::{AllocationCommand, AllocationEngine, AllocationState, AllocationView};
pub use error::{
    AllocationError, CoreError, CoreResult, ParseError, ReconciliationWarning, SettlementError,
    ValidationError,
};
pub use money::Money;
pub use parser::{ParserProfile, ReceiptParser};
pub use receipt::Receipt;
pub use session::{Roster, Session, SpendingStore};
pub use settlement::{ResiduePolicy, SettlementEngine, SettlementPolicy, SettlementReport};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Lines skipped at the top of a receipt by default (store name and address
/// block of the supported digital receipts).
pub const DEFAULT_HEADER_ROWS: usize = 4;

/// Display name of the shared pool.
pub const POOL_NAME: &str = "Combined";

/// Fewest shoppers a receipt can be divided between.
pub const MIN_PARTICIPANTS: usize = 2;

/// Longest accepted shopper name, in characters.
pub const MAX_NAME_LEN: usize = 50;
