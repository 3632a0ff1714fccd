//! # Discount Reconciler
//!
//! Folds discount lines back into the item they follow. A discount
//! attaches to the record right above it, looking past earlier discounts
//! only; anything else in between leaves it orphaned.
//!
//! ## Single Pass
//! ```text
//!  idx  record                               action
//!  ───  ──────────────────────────────────   ─────────────────────────────
//!   0   Item     Milk          3.00
//!   1   Discount MemberSaving -1.00          Milk -= 1.00, remove 1
//!   2   Discount Offer        -0.50          Milk -= 0.50, remove 2
//!   3   Item     Bread         2.50
//!   4   Noise                                remove 4
//!   5   Discount EverydayExtra -0.45         whole-receipt, remove 5
//!   6   TotalMarker            4.05          declared total, remove 6
//!
//!  remove set {1, 2, 4, 5, 6} applied in descending order
//!  ──► [Milk 1.50, Bread 2.50]
//! ```

use std::collections::BTreeSet;

use tracing::{debug, warn};

use super::extractor::ParsedRecord;
use crate::error::ReconciliationWarning;
use crate::money::Money;
use crate::types::{DiscountKind, DiscountRate};

/// An item that survived reconciliation, discounts folded in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedItem {
    pub name: String,
    pub price: Money,
}

/// Whole-receipt discount collected from `EverydayExtra` lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WholeReceiptDiscount {
    /// Sum of all whole-receipt discount lines (negative).
    pub amount: Money,
    /// Percentage printed on the first such line, when present.
    pub percent: Option<DiscountRate>,
}

/// Output of [`DiscountReconciler::reconcile`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reconciled {
    pub items: Vec<ParsedItem>,
    pub whole_receipt: Option<WholeReceiptDiscount>,
    pub declared_total: Option<Money>,
    pub warnings: Vec<ReconciliationWarning>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DiscountReconciler;

impl DiscountReconciler {
    pub fn new() -> Self {
        DiscountReconciler
    }

    /// Applies every discount, keeps the first total and drops the rest.
    pub fn reconcile(&self, mut records: Vec<ParsedRecord>) -> Reconciled {
        let mut remove = BTreeSet::new();
        let mut whole_receipt: Option<WholeReceiptDiscount> = None;
        let mut declared_total = None;
        let mut warnings = Vec::new();

        for idx in 0..records.len() {
            match records[idx].clone() {
                ParsedRecord::Item { .. } => {}
                ParsedRecord::Discount { kind, amount, .. } if kind.is_item_level() => {
                    remove.insert(idx);
                    let target = records[..idx]
                        .iter_mut()
                        .rev()
                        .find(|r| !matches!(r, ParsedRecord::Discount { .. }));
                    match target {
                        Some(ParsedRecord::Item { name, price }) => {
                            *price += amount;
                            debug!(item = %name, %amount, ?kind, "Applied item discount");
                        }
                        _ => {
                            warn!(record = idx, %amount, ?kind, "Discount has no preceding item");
                            warnings.push(ReconciliationWarning::OrphanDiscount {
                                record: idx,
                                amount,
                            });
                        }
                    }
                }
                ParsedRecord::Discount {
                    kind: DiscountKind::EverydayExtra,
                    amount,
                    percent,
                } => {
                    remove.insert(idx);
                    let whole = whole_receipt.get_or_insert_with(WholeReceiptDiscount::default);
                    whole.amount += amount;
                    whole.percent = whole.percent.or(percent);
                    debug!(%amount, ?percent, "Whole-receipt discount");
                }
                ParsedRecord::Discount { .. } => {
                    remove.insert(idx);
                }
                ParsedRecord::TotalMarker { amount } => {
                    remove.insert(idx);
                    if declared_total.is_none() {
                        declared_total = Some(amount);
                    } else {
                        debug!(%amount, "Ignoring later total row");
                    }
                }
                ParsedRecord::Noise => {
                    remove.insert(idx);
                }
            }
        }

        for idx in remove.into_iter().rev() {
            records.remove(idx);
        }

        let items = records
            .into_iter()
            .filter_map(|record| match record {
                ParsedRecord::Item { name, price } => Some(ParsedItem { name, price }),
                _ => None,
            })
            .collect();

        Reconciled {
            items,
            whole_receipt,
            declared_total,
            warnings,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
