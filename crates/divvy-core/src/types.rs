//! # Domain Types
//!
//! Core domain types shared by the parser, allocation and settlement layers.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  GroceryItem    │   │     Owner       │   │  DiscountRate   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (ItemId)    │   │  Pool           │   │  bps (u32)      │       │
//! │  │  name           │   │  Participant(id)│   │  1000 = 10%     │       │
//! │  │  price (Money)  │   └─────────────────┘   └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │ ParticipantId   │   │  DiscountKind   │                             │
//! │  │  u32, assigned  │   │  MemberSaving   │                             │
//! │  │  by the Roster  │   │  EverydayExtra  │                             │
//! │  └─────────────────┘   │  Offer          │                             │
//! │                        └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Discount Rate
// =============================================================================

/// Whole-receipt discount rate in basis points.
///
/// 1 basis point = 0.01%, so 1000 bps = 10%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountRate(u32);

impl DiscountRate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        DiscountRate(bps)
    }

    /// Parses the percentage printed on a discount line (`10%`, `7.5%`).
    ///
    /// Returns `None` when the line carries no percentage token.
    pub fn from_percent_text(line: &str) -> Option<Self> {
        let percent_at = line.find('%')?;
        let digits: String = line[..percent_at]
            .chars()
            .rev()
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();

        // Reuse the cent parser: "7.5" -> 750 hundredths == 750 bps
        let hundredths: Money = digits.parse().ok()?;
        u32::try_from(hundredths.cents()).ok().map(DiscountRate)
    }

    /// Derives the rate a flat discount represents against a subtotal.
    ///
    /// Returns `None` when the subtotal is not positive.
    pub fn from_amount(discount: Money, subtotal: Money) -> Option<Self> {
        if subtotal.cents() <= 0 {
            return None;
        }
        let bps = crate::money::div_round_half_up(
            discount.abs().cents() as i128 * 10_000,
            subtotal.cents() as i128,
        );
        u32::try_from(bps).ok().map(DiscountRate)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        DiscountRate(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for DiscountRate {
    fn default() -> Self {
        DiscountRate::zero()
    }
}

impl fmt::Display for DiscountRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

// =============================================================================
// Discount Kind
// =============================================================================

/// The kinds of discount line a receipt can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// "Member Price Saving": adjusts the item printed just above it.
    MemberSaving,
    /// "Everyday Extra Discount": applies to the whole receipt.
    EverydayExtra,
    /// Promotional "OFFER" line: adjusts the item printed just above it.
    Offer,
}

impl DiscountKind {
    /// Returns true if this discount folds into a single item.
    pub fn is_item_level(&self) -> bool {
        matches!(self, DiscountKind::MemberSaving | DiscountKind::Offer)
    }
}

// =============================================================================
// Grocery Item
// =============================================================================

/// Identity of an item within one parsed receipt.
///
/// Ids are handed out in ascending order by the assembler of a single parse,
/// so sorting by id reproduces the physical order of the receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemId(pub u32);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A purchased item as it appears on the receipt, discounts folded in.
///
/// Immutable once assembled: carts only ever hold its [`ItemId`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GroceryItem {
    id: ItemId,
    name: String,
    price: Money,
}

impl GroceryItem {
    pub(crate) fn new(id: ItemId, name: impl Into<String>, price: Money) -> Self {
        GroceryItem {
            id,
            name: name.into(),
            price,
        }
    }

    #[inline]
    pub fn id(&self) -> ItemId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn price(&self) -> Money {
        self.price
    }
}

impl fmt::Display for GroceryItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Product:\t{}\nPrice: \t\t{}", self.name, self.price)
    }
}

// =============================================================================
// Participants
// =============================================================================

/// Identity of a registered shopper, assigned by the [`crate::session::Roster`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ParticipantId(pub u32);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Who currently holds an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Owner {
    /// The shared pool ("Combined"), split evenly at settlement.
    Pool,
    /// A single participant.
    Participant(ParticipantId),
}

impl Default for Owner {
    fn default() -> Self {
        Owner::Pool
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
