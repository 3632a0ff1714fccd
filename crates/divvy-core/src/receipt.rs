//! # Receipt
//!
//! The aggregate produced by one scan, and the assembler that builds it.
//!
//! ## Assembly Steps
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Reconciled items         ReceiptAssembler                 Receipt      │
//! │  ────────────────         ────────────────                 ───────      │
//! │  Milk      2.00   ──►  1. id #1, name "Milk"          ──►  #1 Milk      │
//! │  Milk      2.00   ──►  2. id #2, name "Milk #2"       ──►  #2 Milk #2   │
//! │  Gift Card 20.00  ──►  3. whole-receipt rate applied  ──►  #3 Gift Card │
//! │                           (gift cards exempt)                           │
//! │                        4. sum vs declared total                         │
//! │                           (mismatch = warning only)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::error::{ParseError, ReconciliationWarning};
use crate::money::Money;
use crate::parser::{ParserProfile, Reconciled};
use crate::types::{DiscountRate, GroceryItem, ItemId};

// =============================================================================
// Receipt
// =============================================================================

/// One scanned receipt. Items are keyed by id, and id order is receipt order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    scan_id: Uuid,
    scanned_at: DateTime<Utc>,
    items: BTreeMap<ItemId, GroceryItem>,
    declared_total: Money,
    applied_discount_rate: DiscountRate,
    whole_receipt_discount: Money,
    warnings: Vec<ReconciliationWarning>,
}

impl Receipt {
    pub fn scan_id(&self) -> Uuid {
        self.scan_id
    }

    /// Items in receipt order.
    pub fn items(&self) -> impl Iterator<Item = &GroceryItem> + '_ {
        self.items.values()
    }

    /// Item ids in receipt order.
    pub fn item_ids(&self) -> Vec<ItemId> {
        self.items.keys().copied().collect()
    }

    pub fn item(&self, id: ItemId) -> Option<&GroceryItem> {
        self.items.get(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The total printed on the receipt.
    pub fn declared_total(&self) -> Money {
        self.declared_total
    }

    /// Sum of the item prices after all discounts.
    pub fn computed_total(&self) -> Money {
        self.items.values().map(GroceryItem::price).sum()
    }

    /// Whole-receipt rate applied to item prices; zero when there was none.
    pub fn applied_discount_rate(&self) -> DiscountRate {
        self.applied_discount_rate
    }

    /// Amount printed on the whole-receipt discount lines (zero or negative).
    pub fn whole_receipt_discount(&self) -> Money {
        self.whole_receipt_discount
    }

    pub fn warnings(&self) -> &[ReconciliationWarning] {
        &self.warnings
    }

    /// Sum of the given items' prices. Unknown ids contribute nothing.
    pub fn total_of<'a, I>(&self, ids: I) -> Money
    where
        I: IntoIterator<Item = &'a ItemId>,
    {
        ids.into_iter()
            .filter_map(|id| self.items.get(id))
            .map(GroceryItem::price)
            .sum()
    }
}

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Number of items in receipt: {}", self.items.len())?;
        for (number, item) in self.items.values().enumerate() {
            writeln!(f, "Item number: {}", number + 1)?;
            writeln!(f, "{}", item)?;
        }
        write!(f, "\nTotal: {}", self.computed_total())
    }
}

// =============================================================================
// Receipt Assembler
// =============================================================================

/// Builds a [`Receipt`] from reconciled records.
///
/// Owns the id counter for one parse, so ids always start at 1.
#[derive(Debug)]
pub struct ReceiptAssembler<'p> {
    profile: &'p ParserProfile,
    next_id: u32,
    seen_names: HashMap<String, usize>,
}

impl<'p> ReceiptAssembler<'p> {
    pub fn new(profile: &'p ParserProfile) -> Self {
        ReceiptAssembler {
            profile,
            next_id: 1,
            seen_names: HashMap::new(),
        }
    }

    pub fn assemble(mut self, reconciled: Reconciled) -> Result<Receipt, ParseError> {
        let declared_total = reconciled
            .declared_total
            .ok_or(ParseError::NoTotalFound {
                lines_scanned: reconciled.items.len(),
            })?;

        let eligible_subtotal: Money = reconciled
            .items
            .iter()
            .filter(|item| !self.is_gift_card(&item.name))
            .map(|item| item.price)
            .sum();

        let (whole_receipt_discount, rate) = match reconciled.whole_receipt {
            Some(whole) => {
                let rate = whole
                    .percent
                    .or_else(|| DiscountRate::from_amount(whole.amount, eligible_subtotal))
                    .unwrap_or_default();
                (whole.amount, rate)
            }
            None => (Money::zero(), DiscountRate::zero()),
        };

        let mut items = BTreeMap::new();
        for parsed in reconciled.items {
            let price = if rate.is_zero() || self.is_gift_card(&parsed.name) {
                parsed.price
            } else {
                parsed.price.apply_discount(rate)
            };
            let id = self.next_id();
            let name = self.unique_name(parsed.name);
            items.insert(id, GroceryItem::new(id, name, price));
        }

        let mut warnings = reconciled.warnings;
        let computed: Money = items.values().map(GroceryItem::price).sum();
        if (computed - declared_total).abs().cents() > self.profile.reconcile_tolerance_cents {
            warn!(
                %computed,
                declared = %declared_total,
                "Receipt does not match calculated total"
            );
            warnings.push(ReconciliationWarning::TotalMismatch {
                computed,
                declared: declared_total,
            });
        }

        Ok(Receipt {
            scan_id: Uuid::new_v4(),
            scanned_at: Utc::now(),
            items,
            declared_total,
            applied_discount_rate: rate,
            whole_receipt_discount,
            warnings,
        })
    }

    fn next_id(&mut self) -> ItemId {
        let id = ItemId(self.next_id);
        self.next_id += 1;
        id
    }

    fn unique_name(&mut self, name: String) -> String {
        let count = self.seen_names.entry(name.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            name
        } else {
            format!("{} #{}", name, count)
        }
    }

    fn is_gift_card(&self, name: &str) -> bool {
        name.to_uppercase()
            .contains(&self.profile.gift_card_marker.to_uppercase())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
