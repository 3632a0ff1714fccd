//! # Error Types
//!
//! Domain-specific error types for divvy-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  divvy-core errors (this file)                                          │
//! │  ├── ParseError            - scan abandoned / line recovered as noise   │
//! │  ├── AllocationError       - command rejected, state unchanged          │
//! │  ├── SettlementError       - settlement could not be computed           │
//! │  ├── ValidationError       - input validation failures                  │
//! │  └── CoreError             - wraps all of the above                     │
//! │                                                                         │
//! │  ReconciliationWarning     - advisory only, carried on the Receipt      │
//! │                                                                         │
//! │  divvy-store errors (separate crate)                                    │
//! │  └── StoreError            - ledger / config file failures              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Propagation Policy
//! - Parse failures are fatal to the current scan, never to the session.
//! - Allocation failures are per-command; prior progress is kept.

use serde::Serialize;
use thiserror::Error;

use crate::money::Money;
use crate::types::{ItemId, ParticipantId};

// =============================================================================
// Parse Error
// =============================================================================

/// Receipt parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// No total row was located, so the layout cannot be trusted.
    ///
    /// ## When This Occurs
    /// - The document is not a supported receipt layout
    /// - The header offset skipped past the whole document
    /// - The total line has no parseable amount
    #[error("Unrecoverable layout: no TOTAL line found after {lines_scanned} lines")]
    NoTotalFound { lines_scanned: usize },

    /// A trailing token is not a monetary amount.
    ///
    /// Recovered locally: the line is classified as noise.
    #[error("Price is not a number: {text:?}")]
    PriceUnparseable { text: String },
}

// =============================================================================
// Reconciliation Warning
// =============================================================================

/// Advisory findings from assembling a receipt. The receipt stays usable.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ReconciliationWarning {
    /// Summed item prices differ from the printed total beyond tolerance.
    #[error("Receipt does not match calculated total: items sum to {computed}, receipt says {declared}")]
    TotalMismatch { computed: Money, declared: Money },

    /// A discount line had no item above it to attach to.
    #[error("Discount of {amount} on line {record} has no preceding item")]
    OrphanDiscount { record: usize, amount: Money },
}

// =============================================================================
// Allocation Error
// =============================================================================

/// Allocation command errors. The engine state is unchanged after any of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    /// Assignment target is not part of this allocation.
    #[error("Unknown participant: {0}")]
    InvalidParticipant(ParticipantId),

    /// The receipt has no items to allocate.
    #[error("Receipt has no items to allocate")]
    EmptyReceipt,

    /// No participants were supplied.
    #[error("At least one participant is required")]
    NoParticipants,

    /// The same participant was listed twice.
    #[error("Participant {0} is listed more than once")]
    DuplicateParticipant(ParticipantId),

    /// An item id that is not on the receipt.
    #[error("Item {0} is not on this receipt")]
    UnknownItem(ItemId),

    /// The allocation was submitted or cancelled and accepts no more changes.
    #[error("Allocation is already {state}")]
    Finalized { state: String },

    /// The allocation has not been submitted yet.
    #[error("Allocation has not been submitted")]
    NotSubmitted,
}

// =============================================================================
// Settlement Error
// =============================================================================

/// Settlement errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettlementError {
    /// The payer is not one of the allocation's participants.
    #[error("Payer {0} is not part of this receipt")]
    UnknownPayer(ParticipantId),

    /// Nobody to split between.
    #[error("Settlement requires at least one participant")]
    NoParticipants,
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not registered.
    #[error("{field} '{value}' is not registered")]
    NotRegistered { field: String, value: String },

    /// Duplicate value (e.g., shopper registered twice).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Core Error
// =============================================================================

/// Umbrella error for session-level operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Allocation(#[from] AllocationError),

    #[error(transparent)]
    Settlement(#[from] SettlementError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// An operation needs a scanned receipt and none is loaded.
    #[error("No receipt has been scanned")]
    NoReceipt,
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
