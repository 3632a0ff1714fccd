//! # Receipt Parser
//!
//! Turns extracted receipt text into a [`Receipt`].
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Parsing Pipeline                                │
//! │                                                                         │
//! │  raw lines ──► skip header_rows                                         │
//! │                   │                                                     │
//! │                   ├──► LineNormalizer ──► logical lines                 │
//! │                   │          │                                          │
//! │                   │          ▼                                          │
//! │                   │    FieldExtractor (item scan) ──► records           │
//! │                   │                                      │              │
//! │                   └──► FieldExtractor (total scan) ──► TotalMarker      │
//! │                                                          │              │
//! │                                                          ▼              │
//! │                                    DiscountReconciler ──► Reconciled    │
//! │                                                          │              │
//! │                                                          ▼              │
//! │                                    ReceiptAssembler  ──► Receipt        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use divvy_core::parser::{ParserProfile, ReceiptParser};
//!
//! let profile = ParserProfile {
//!     header_rows: 0,
//!     ..ParserProfile::default()
//! };
//! let lines = ["Milk   3.00", "Member Price Saving -1.00", "TOTAL   2.00"];
//! let receipt = ReceiptParser::new(profile).parse(&lines).unwrap();
//!
//! assert_eq!(receipt.items().count(), 1);
//! assert_eq!(receipt.computed_total().cents(), 200);
//! ```

pub mod extractor;
pub mod lexer;
pub mod normalizer;
pub mod reconciler;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ParseError, ValidationError};
use crate::receipt::{Receipt, ReceiptAssembler};
use crate::DEFAULT_HEADER_ROWS;

pub use extractor::{FieldExtractor, ParsedRecord};
pub use lexer::{LexedLine, LineLexer};
pub use normalizer::LineNormalizer;
pub use reconciler::{DiscountReconciler, ParsedItem, Reconciled, WholeReceiptDiscount};

// =============================================================================
// Parser Profile
// =============================================================================

/// Layout settings for one receipt format family.
///
/// Loaded from the `[parser]` section of the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserProfile {
    /// Lines skipped at the top of the document (store name, address).
    pub header_rows: usize,

    /// Consecutive spaces that end an item name.
    pub name_gap: usize,

    /// Trailing spaces that mark a line as continuing on the next one.
    pub continuation_padding: usize,

    pub total_marker: String,
    pub subtotal_marker: String,
    pub promotional_marker: String,
    pub reduced_price_marker: String,

    /// Items containing this text (any case) are exempt from the
    /// whole-receipt discount.
    pub gift_card_marker: String,

    /// Allowed difference between summed items and the printed total.
    pub reconcile_tolerance_cents: i64,
}

impl Default for ParserProfile {
    fn default() -> Self {
        ParserProfile {
            header_rows: DEFAULT_HEADER_ROWS,
            name_gap: 3,
            continuation_padding: 2,
            total_marker: "TOTAL".to_string(),
            subtotal_marker: "SUBTOTAL".to_string(),
            promotional_marker: "^Promotional Price".to_string(),
            reduced_price_marker: "PRICE REDUCED".to_string(),
            gift_card_marker: "GIFT CARD".to_string(),
            reconcile_tolerance_cents: 1,
        }
    }
}

impl ParserProfile {
    /// Validates the profile.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name_gap < 2 {
            return Err(ValidationError::OutOfRange {
                field: "name_gap".to_string(),
                min: 2,
                max: i64::from(u16::MAX),
            });
        }

        if self.continuation_padding < 1 {
            return Err(ValidationError::OutOfRange {
                field: "continuation_padding".to_string(),
                min: 1,
                max: i64::from(u16::MAX),
            });
        }

        if self.reconcile_tolerance_cents < 0 {
            return Err(ValidationError::OutOfRange {
                field: "reconcile_tolerance_cents".to_string(),
                min: 0,
                max: i64::MAX,
            });
        }

        for (field, marker) in [
            ("total_marker", &self.total_marker),
            ("subtotal_marker", &self.subtotal_marker),
            ("promotional_marker", &self.promotional_marker),
            ("reduced_price_marker", &self.reduced_price_marker),
            ("gift_card_marker", &self.gift_card_marker),
        ] {
            if marker.trim().is_empty() {
                return Err(ValidationError::Required {
                    field: field.to_string(),
                });
            }
        }

        Ok(())
    }
}

// =============================================================================
// Receipt Parser
// =============================================================================

/// Runs the full pipeline for one profile.
#[derive(Debug, Clone, Default)]
pub struct ReceiptParser {
    profile: ParserProfile,
}

impl ReceiptParser {
    pub fn new(profile: ParserProfile) -> Self {
        ReceiptParser { profile }
    }

    /// Parses one document.
    ///
    /// ## Errors
    /// [`ParseError::NoTotalFound`] when no total row is present after the
    /// header. Nothing partial is returned in that case.
    pub fn parse<S: AsRef<str>>(&self, lines: &[S]) -> Result<Receipt, ParseError> {
        let body = lines.get(self.profile.header_rows..).unwrap_or(&[]);
        debug!(
            lines = lines.len(),
            header_rows = self.profile.header_rows,
            "Parsing receipt"
        );

        let extractor = FieldExtractor::new(&self.profile);

        let mut records: Vec<ParsedRecord> = LineNormalizer::new(&self.profile)
            .normalize(body)
            .iter()
            .map(|line| extractor.extract(line, false))
            .collect();

        let total = body
            .iter()
            .map(|line| extractor.extract(line.as_ref(), true))
            .find(|record| matches!(record, ParsedRecord::TotalMarker { .. }))
            .ok_or(ParseError::NoTotalFound {
                lines_scanned: body.len(),
            })?;
        records.push(total);

        let reconciled = DiscountReconciler::new().reconcile(records);
        let receipt = ReceiptAssembler::new(&self.profile).assemble(reconciled)?;

        info!(
            scan_id = %receipt.scan_id(),
            items = receipt.len(),
            total = %receipt.computed_total(),
            warnings = receipt.warnings().len(),
            "Receipt parsed"
        );

        Ok(receipt)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
