//! # Validation Module
//!
//! Input validation for shopper names and participant selections.
//!
//! ## Where Validation Happens
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Terminal input ──► validate_participant_name ──► Roster::register      │
//! │                                                                         │
//! │  Ledger file    ──► validate_participant_name ──► Roster::from_spending │
//! │                                                                         │
//! │  "divide" menu  ──► validate_selection        ──► begin_allocation      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The ledger is written as `name,spending` with no quoting, so a comma in a
//! name would corrupt it. Names with commas are rejected here.

use std::collections::BTreeSet;

use crate::error::ValidationError;
use crate::{MAX_NAME_LEN, MIN_PARTICIPANTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates a shopper name and returns its normalized (trimmed, lowercase)
/// form.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - No commas or line breaks
///
/// ## Example
/// ```rust
/// use divvy_core::validation::validate_participant_name;
///
/// assert_eq!(validate_participant_name("  Ann ").unwrap(), "ann");
/// assert!(validate_participant_name("").is_err());
/// assert!(validate_participant_name("Smith, J").is_err());
/// ```
pub fn validate_participant_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    if name.contains(',') || name.contains('\n') || name.contains('\r') {
        return Err(ValidationError::InvalidFormat {
            field: "name".to_string(),
            reason: "must not contain commas or line breaks".to_string(),
        });
    }

    Ok(name.to_lowercase())
}

/// Validates the shoppers picked for one receipt and returns their
/// normalized names in selection order.
pub fn validate_selection<S: AsRef<str>>(names: &[S]) -> ValidationResult<Vec<String>> {
    if names.len() < MIN_PARTICIPANTS {
        return Err(ValidationError::OutOfRange {
            field: "participants".to_string(),
            min: MIN_PARTICIPANTS as i64,
            max: i64::from(u32::MAX),
        });
    }

    let mut seen = BTreeSet::new();
    let mut normalized = Vec::with_capacity(names.len());
    for name in names {
        let name = validate_participant_name(name.as_ref())?;
        if !seen.insert(name.clone()) {
            return Err(ValidationError::Duplicate {
                field: "participant".to_string(),
                value: name,
            });
        }
        normalized.push(name);
    }

    Ok(normalized)
}
