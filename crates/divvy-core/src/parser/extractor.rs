//! # Field Extractor
//!
//! Classifies one logical line as an item, a discount, the total row, or
//! noise.
//!
//! ## Classification Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  total scan?  ──yes──►  "TOTAL" token + amount ──► TotalMarker          │
//! │       │                 otherwise              ──► Noise                │
//! │       no                                                                │
//! │       ▼                                                                 │
//! │  lex name + amount                                                      │
//! │       │                                                                 │
//! │       ├── no name or no amount           ──► Noise                      │
//! │       ├── a total row                    ──► Noise                      │
//! │       ├── name matches a discount        ──► Discount { kind, amount }  │
//! │       └── otherwise                      ──► Item { name, price }       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::debug;

use super::lexer::LineLexer;
use super::ParserProfile;
use crate::money::Money;
use crate::types::{DiscountKind, DiscountRate};

const MEMBER_SAVING_PREFIX: &str = "MEMBERPRICESAVING";
const EVERYDAY_EXTRA_PREFIX: &str = "EVERYDAYEXTRA";
const OFFER_MARKER: &str = "OFFER";

/// One classified logical line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedRecord {
    Item {
        name: String,
        price: Money,
    },
    /// An adjustment printed below the line it affects. `amount` is always
    /// negative.
    Discount {
        kind: DiscountKind,
        amount: Money,
        percent: Option<DiscountRate>,
    },
    TotalMarker {
        amount: Money,
    },
    Noise,
}

/// Per-line classifier.
#[derive(Debug, Clone, Copy)]
pub struct FieldExtractor<'p> {
    profile: &'p ParserProfile,
    lexer: LineLexer,
}

impl<'p> FieldExtractor<'p> {
    pub fn new(profile: &'p ParserProfile) -> Self {
        FieldExtractor {
            profile,
            lexer: LineLexer::new(profile.name_gap),
        }
    }

    /// Classifies `line`.
    ///
    /// With `is_total_scan` set only the total row is recognised; every
    /// other line is noise.
    pub fn extract(&self, line: &str, is_total_scan: bool) -> ParsedRecord {
        if is_total_scan {
            return self.extract_total(line);
        }

        let lexed = self.lexer.lex(line);
        let (name, amount) = match (lexed.name, lexed.amount) {
            (Some(name), Some(amount)) => (name, amount),
            _ => {
                debug!(line, "No name/price pair, treating as noise");
                return ParsedRecord::Noise;
            }
        };

        if self.is_total_row(line) {
            debug!(line, "Total row outside the total scan");
            return ParsedRecord::Noise;
        }

        if let Some(kind) = discount_kind(name) {
            return ParsedRecord::Discount {
                kind,
                amount: -amount.abs(),
                percent: DiscountRate::from_percent_text(line),
            };
        }

        ParsedRecord::Item {
            name: name.to_string(),
            price: amount,
        }
    }

    fn extract_total(&self, line: &str) -> ParsedRecord {
        if !self.is_total_row(line) {
            return ParsedRecord::Noise;
        }

        match self.lexer.lex_amount(line) {
            Ok(amount) => ParsedRecord::TotalMarker { amount },
            Err(err) => {
                debug!(line, error = %err, "Total row without a usable amount");
                ParsedRecord::Noise
            }
        }
    }

    fn is_total_row(&self, line: &str) -> bool {
        line.split_whitespace()
            .any(|token| token == self.profile.total_marker)
    }
}

/// Matches a line name against the known discount wordings.
///
/// Whitespace is ignored for the prefix patterns, so `Member Price Saving`
/// and `MemberPriceSaving` are the same discount.
fn discount_kind(name: &str) -> Option<DiscountKind> {
    let compact: String = name
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();

    if compact.starts_with(MEMBER_SAVING_PREFIX) {
        Some(DiscountKind::MemberSaving)
    } else if compact.starts_with(EVERYDAY_EXTRA_PREFIX) {
        Some(DiscountKind::EverydayExtra)
    } else if name.contains(OFFER_MARKER) {
        Some(DiscountKind::Offer)
    } else {
        None
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
