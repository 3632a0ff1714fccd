//! # Allocation Engine
//!
//! Walks a receipt one item at a time and records who takes each item.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌─────────────┐  Next / AssignTo at last item  ┌─────────────┐        │
//! │   │  Assigning  │ ─────────────────────────────► │  Reviewing  │        │
//! │   │             │ ◄───────────────────────────── │             │        │
//! │   └──────┬──────┘        Previous / Next         └──────┬──────┘        │
//! │          │                                              │               │
//! │          │ Submit                              Submit   │               │
//! │          ▼                                              ▼               │
//! │   ┌─────────────┐                               ┌─────────────┐         │
//! │   │  Submitted  │  (terminal, Cancel = no-op)   │  Cancelled  │         │
//! │   └─────────────┘                               └─────────────┘         │
//! │                                  ▲                                      │
//! │             Cancel from Assigning or Reviewing                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Single Owner
//! Every item is held by exactly one [`Owner`]: the pool or one participant.
//! [`AllocationEngine::transfer`] is the only mutation of ownership, and it
//! moves the item in one step.
//!
//! ## Usage
//! ```rust
//! use std::sync::Arc;
//! use divvy_core::allocation::{AllocationCommand, AllocationEngine, Participant};
//! use divvy_core::parser::{ParserProfile, ReceiptParser};
//! use divvy_core::types::{Owner, ParticipantId};
//!
//! let profile = ParserProfile { header_rows: 0, ..ParserProfile::default() };
//! let receipt = ReceiptParser::new(profile)
//!     .parse(&["Milk   3.00", "Bread   2.00", "TOTAL   5.00"])
//!     .unwrap();
//!
//! let ann = Participant::new(ParticipantId(1), "ann");
//! let bob = Participant::new(ParticipantId(2), "bob");
//! let mut engine = AllocationEngine::new(Arc::new(receipt), vec![ann, bob]).unwrap();
//!
//! let view = engine
//!     .apply(AllocationCommand::AssignTo(Owner::Participant(ParticipantId(1))))
//!     .unwrap();
//! assert_eq!(view.position, 2);
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ts_rs::TS;

use crate::error::AllocationError;
use crate::money::Money;
use crate::receipt::Receipt;
use crate::types::{ItemId, Owner, ParticipantId};

// =============================================================================
// Commands, States and Views
// =============================================================================

/// Commands accepted by [`AllocationEngine::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationCommand {
    Previous,
    Next,
    /// Give the current item to `Owner`, then advance.
    AssignTo(Owner),
    Submit,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AllocationState {
    Assigning,
    /// The cursor has run past the last item; reassignment still allowed.
    Reviewing,
    Submitted,
    Cancelled,
}

impl AllocationState {
    pub fn is_final(&self) -> bool {
        matches!(self, AllocationState::Submitted | AllocationState::Cancelled)
    }
}

impl fmt::Display for AllocationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocationState::Assigning => write!(f, "assigning"),
            AllocationState::Reviewing => write!(f, "reviewing"),
            AllocationState::Submitted => write!(f, "submitted"),
            AllocationState::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Snapshot returned after every accepted command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct AllocationView {
    pub state: AllocationState,
    /// 1-based cursor position.
    pub position: usize,
    pub item_count: usize,
    pub item_id: ItemId,
    pub item_name: String,
    pub price: Money,
    pub owner: Owner,
}

// =============================================================================
// Participants and Carts
// =============================================================================

/// A shopper taking part in one allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
}

impl Participant {
    pub fn new(id: ParticipantId, name: impl Into<String>) -> Self {
        Participant {
            id,
            name: name.into(),
        }
    }
}

/// Items held by one owner, with their total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cart {
    pub owner: Owner,
    pub items: Vec<ItemId>,
    pub total: Money,
}

/// The frozen result of a submitted allocation.
#[derive(Debug, Clone)]
pub struct Allocation {
    receipt: Arc<Receipt>,
    participants: Vec<Participant>,
    carts: Vec<Cart>,
    pool: Cart,
}

impl Allocation {
    pub fn receipt(&self) -> &Receipt {
        &self.receipt
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Participant carts, in participant order.
    pub fn carts(&self) -> &[Cart] {
        &self.carts
    }

    pub fn cart_of(&self, participant: ParticipantId) -> Option<&Cart> {
        self.carts
            .iter()
            .find(|cart| cart.owner == Owner::Participant(participant))
    }

    pub fn pool(&self) -> &Cart {
        &self.pool
    }

    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }
}

// =============================================================================
// Allocation Engine
// =============================================================================

/// Pull-based allocation state machine over one receipt.
#[derive(Debug, Clone)]
pub struct AllocationEngine {
    receipt: Arc<Receipt>,
    participants: Vec<Participant>,
    order: Vec<ItemId>,
    cursor: usize,
    owners: BTreeMap<ItemId, Owner>,
    totals: Option<BTreeMap<Owner, Money>>,
    state: AllocationState,
}

impl AllocationEngine {
    /// Starts an allocation with every item in the pool and the cursor on
    /// the first item.
    pub fn new(
        receipt: Arc<Receipt>,
        participants: Vec<Participant>,
    ) -> Result<Self, AllocationError> {
        if receipt.is_empty() {
            return Err(AllocationError::EmptyReceipt);
        }
        if participants.is_empty() {
            return Err(AllocationError::NoParticipants);
        }
        let mut seen = BTreeSet::new();
        if let Some(dup) = participants.iter().find(|p| !seen.insert(p.id)) {
            return Err(AllocationError::DuplicateParticipant(dup.id));
        }

        let order = receipt.item_ids();
        let owners = order.iter().map(|id| (*id, Owner::Pool)).collect();

        info!(
            scan_id = %receipt.scan_id(),
            items = order.len(),
            participants = participants.len(),
            "Allocation started"
        );

        Ok(AllocationEngine {
            receipt,
            participants,
            order,
            cursor: 0,
            owners,
            totals: None,
            state: AllocationState::Assigning,
        })
    }

    /// Applies one command.
    ///
    /// A rejected command leaves the engine exactly as it was.
    pub fn apply(&mut self, command: AllocationCommand) -> Result<AllocationView, AllocationError> {
        debug!(?command, position = self.cursor + 1, state = %self.state, "Allocation command");

        match (self.state, command) {
            (AllocationState::Submitted, AllocationCommand::Cancel) => return Ok(self.view()),
            (state, _) if state.is_final() => {
                return Err(AllocationError::Finalized {
                    state: state.to_string(),
                })
            }
            _ => {}
        }

        match command {
            AllocationCommand::Previous => {
                self.cursor = self.cursor.saturating_sub(1);
                self.state = AllocationState::Assigning;
            }
            AllocationCommand::Next => self.advance(),
            AllocationCommand::AssignTo(owner) => {
                let item = self.order[self.cursor];
                self.transfer(item, owner)?;
                self.advance();
            }
            AllocationCommand::Submit => self.submit(),
            AllocationCommand::Cancel => self.cancel(),
        }

        Ok(self.view())
    }

    /// Moves `item` to `to` in one step.
    ///
    /// ## Errors
    /// - `Finalized` once submitted or cancelled
    /// - `UnknownItem` when the id is not on the receipt
    /// - `InvalidParticipant` when `to` is not part of this allocation
    pub fn transfer(&mut self, item: ItemId, to: Owner) -> Result<(), AllocationError> {
        if self.state.is_final() {
            return Err(AllocationError::Finalized {
                state: self.state.to_string(),
            });
        }
        if let Owner::Participant(id) = to {
            if !self.participants.iter().any(|p| p.id == id) {
                return Err(AllocationError::InvalidParticipant(id));
            }
        }

        let slot = self
            .owners
            .get_mut(&item)
            .ok_or(AllocationError::UnknownItem(item))?;
        let from = std::mem::replace(slot, to);
        debug!(%item, ?from, ?to, "Item transferred");
        Ok(())
    }

    /// Current snapshot.
    pub fn view(&self) -> AllocationView {
        let item_id = self.order[self.cursor];
        let (item_name, price) = self
            .receipt
            .item(item_id)
            .map(|item| (item.name().to_string(), item.price()))
            .unwrap_or_default();

        AllocationView {
            state: self.state,
            position: self.cursor + 1,
            item_count: self.order.len(),
            item_id,
            item_name,
            price,
            owner: self.owner_of(item_id).unwrap_or_default(),
        }
    }

    pub fn state(&self) -> AllocationState {
        self.state
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn receipt(&self) -> &Receipt {
        &self.receipt
    }

    pub fn owner_of(&self, item: ItemId) -> Option<Owner> {
        self.owners.get(&item).copied()
    }

    /// Total for `owner`. Only available after submit.
    pub fn cart_total(&self, owner: Owner) -> Option<Money> {
        self.totals
            .as_ref()
            .map(|totals| totals.get(&owner).copied().unwrap_or_default())
    }

    /// Carts for the pool and every participant, pool first.
    ///
    /// Totals are computed on the fly here.
    pub fn carts(&self) -> Vec<Cart> {
        std::iter::once(Owner::Pool)
            .chain(self.participants.iter().map(|p| Owner::Participant(p.id)))
            .map(|owner| self.cart_for(owner))
            .collect()
    }

    /// Consumes a submitted engine.
    pub fn into_allocation(self) -> Result<Allocation, AllocationError> {
        if self.state != AllocationState::Submitted {
            return Err(AllocationError::NotSubmitted);
        }

        let pool = self.cart_for(Owner::Pool);
        let carts = self
            .participants
            .iter()
            .map(|p| self.cart_for(Owner::Participant(p.id)))
            .collect();

        Ok(Allocation {
            receipt: self.receipt,
            participants: self.participants,
            carts,
            pool,
        })
    }

    fn cart_for(&self, owner: Owner) -> Cart {
        let items: Vec<ItemId> = self
            .owners
            .iter()
            .filter(|(_, holder)| **holder == owner)
            .map(|(id, _)| *id)
            .collect();
        let total = self.receipt.total_of(&items);
        Cart {
            owner,
            items,
            total,
        }
    }

    fn advance(&mut self) {
        if self.cursor + 1 >= self.order.len() {
            self.state = AllocationState::Reviewing;
        } else {
            self.cursor += 1;
            self.state = AllocationState::Assigning;
        }
    }

    fn submit(&mut self) {
        let totals: BTreeMap<Owner, Money> = self
            .carts()
            .into_iter()
            .map(|cart| (cart.owner, cart.total))
            .collect();

        info!(
            scan_id = %self.receipt.scan_id(),
            pool = %totals.get(&Owner::Pool).copied().unwrap_or_default(),
            "Allocation submitted"
        );

        self.totals = Some(totals);
        self.state = AllocationState::Submitted;
    }

    fn cancel(&mut self) {
        for owner in self.owners.values_mut() {
            *owner = Owner::Pool;
        }
        self.cursor = 0;
        self.state = AllocationState::Cancelled;
        info!(scan_id = %self.receipt.scan_id(), "Allocation cancelled");
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{ParserProfile, ReceiptParser};
    use proptest::prelude::*;

    /// Every owner whose cart lists `item`.
    fn holders_of(engine: &AllocationEngine, item: ItemId) -> Vec<Owner> {
        engine
            .carts()
            .into_iter()
            .filter(|cart| cart.items.contains(&item))
            .map(|cart| cart.owner)
            .collect()
    }

    const ANN: ParticipantId = ParticipantId(1);
    const BOB: ParticipantId = ParticipantId(2);

    fn receipt(lines: &[&str]) -> Arc<Receipt> {
        let profile = ParserProfile {
            header_rows: 0,
            ..ParserProfile::default()
        };
        Arc::new(ReceiptParser::new(profile).parse(lines).unwrap())
    }

    fn engine() -> AllocationEngine {
        let receipt = receipt(&["Milk   3.00", "Bread   2.00", "Eggs   5.00", "TOTAL   10.00"]);
        AllocationEngine::new(
            receipt,
            vec![Participant::new(ANN, "ann"), Participant::new(BOB, "bob")],
        )
        .unwrap()
    }

    #[test]
    fn test_starts_on_first_item_in_pool() {
        let engine = engine();
        let view = engine.view();
        assert_eq!(view.position, 1);
        assert_eq!(view.item_count, 3);
        assert_eq!(view.item_name, "Milk");
        assert_eq!(view.owner, Owner::Pool);
        assert_eq!(view.state, AllocationState::Assigning);
    }

    #[test]
    fn test_empty_receipt_rejected() {
        let result = AllocationEngine::new(
            receipt(&["Thank you", "TOTAL   0.00"]),
            vec![Participant::new(ANN, "ann")],
        );
        assert!(matches!(result, Err(AllocationError::EmptyReceipt)));
    }

    #[test]
    fn test_no_participants_rejected() {
        let result = AllocationEngine::new(receipt(&["Milk   3.00", "TOTAL   3.00"]), vec![]);
        assert!(matches!(result, Err(AllocationError::NoParticipants)));
    }

    #[test]
    fn test_duplicate_participant_rejected() {
        let result = AllocationEngine::new(
            receipt(&["Pizza   9.00", "TOTAL   9.00"]),
            vec![
                Participant::new(ANN, "ann"),
                Participant::new(ANN, "ann"),
                Participant::new(BOB, "bob"),
            ],
        );
        assert_eq!(result.unwrap_err(), AllocationError::DuplicateParticipant(ANN));
    }

    #[test]
    fn test_navigation_is_clamped() {
        let mut engine = engine();

        let view = engine.apply(AllocationCommand::Previous).unwrap();
        assert_eq!(view.position, 1);

        engine.apply(AllocationCommand::Next).unwrap();
        engine.apply(AllocationCommand::Next).unwrap();
        let view = engine.apply(AllocationCommand::Next).unwrap();
        assert_eq!(view.position, 3);
        assert_eq!(view.state, AllocationState::Reviewing);

        let view = engine.apply(AllocationCommand::Previous).unwrap();
        assert_eq!(view.position, 2);
        assert_eq!(view.state, AllocationState::Assigning);
    }

    #[test]
    fn test_assign_moves_item_and_advances() {
        let mut engine = engine();
        let view = engine
            .apply(AllocationCommand::AssignTo(Owner::Participant(ANN)))
            .unwrap();

        assert_eq!(view.position, 2);
        assert_eq!(engine.owner_of(ItemId(1)), Some(Owner::Participant(ANN)));
        assert_eq!(holders_of(&engine, ItemId(1)), vec![Owner::Participant(ANN)]);
    }

    #[test]
    fn test_reassignment_replaces_owner() {
        let mut engine = engine();
        engine
            .apply(AllocationCommand::AssignTo(Owner::Participant(ANN)))
            .unwrap();
        engine.apply(AllocationCommand::Previous).unwrap();
        engine
            .apply(AllocationCommand::AssignTo(Owner::Participant(BOB)))
            .unwrap();

        assert_eq!(holders_of(&engine, ItemId(1)), vec![Owner::Participant(BOB)]);
    }

    #[test]
    fn test_unknown_participant_leaves_state_unchanged() {
        let mut engine = engine();
        engine.apply(AllocationCommand::Next).unwrap();
        let before = engine.view();

        let err = engine
            .apply(AllocationCommand::AssignTo(Owner::Participant(ParticipantId(99))))
            .unwrap_err();

        assert_eq!(err, AllocationError::InvalidParticipant(ParticipantId(99)));
        assert_eq!(engine.view(), before);
        assert!(engine.carts().iter().skip(1).all(|cart| cart.items.is_empty()));
    }

    #[test]
    fn test_assign_at_last_item_enters_review() {
        let mut engine = engine();
        for _ in 0..3 {
            engine
                .apply(AllocationCommand::AssignTo(Owner::Participant(ANN)))
                .unwrap();
        }
        assert_eq!(engine.state(), AllocationState::Reviewing);
        assert_eq!(engine.view().position, 3);
    }

    #[test]
    fn test_totals_only_after_submit() {
        let mut engine = engine();
        engine
            .apply(AllocationCommand::AssignTo(Owner::Participant(ANN)))
            .unwrap();
        assert_eq!(engine.cart_total(Owner::Pool), None);

        engine.apply(AllocationCommand::Submit).unwrap();
        assert_eq!(
            engine.cart_total(Owner::Participant(ANN)),
            Some(Money::from_cents(300))
        );
        assert_eq!(engine.cart_total(Owner::Participant(BOB)), Some(Money::zero()));
        assert_eq!(engine.cart_total(Owner::Pool), Some(Money::from_cents(700)));
    }

    #[test]
    fn test_submitted_is_terminal() {
        let mut engine = engine();
        engine.apply(AllocationCommand::Submit).unwrap();

        assert!(matches!(
            engine.apply(AllocationCommand::Next),
            Err(AllocationError::Finalized { .. })
        ));
        // Cancel after submit is a no-op
        let view = engine.apply(AllocationCommand::Cancel).unwrap();
        assert_eq!(view.state, AllocationState::Submitted);
    }

    #[test]
    fn test_cancel_returns_everything_to_pool() {
        let mut engine = engine();
        engine
            .apply(AllocationCommand::AssignTo(Owner::Participant(ANN)))
            .unwrap();
        let view = engine.apply(AllocationCommand::Cancel).unwrap();

        assert_eq!(view.state, AllocationState::Cancelled);
        assert_eq!(engine.owner_of(ItemId(1)), Some(Owner::Pool));
        assert!(matches!(
            engine.into_allocation(),
            Err(AllocationError::NotSubmitted)
        ));
    }

    #[test]
    fn test_into_allocation() {
        let mut engine = engine();
        engine
            .apply(AllocationCommand::AssignTo(Owner::Participant(ANN)))
            .unwrap();
        engine
            .apply(AllocationCommand::AssignTo(Owner::Participant(BOB)))
            .unwrap();
        engine.apply(AllocationCommand::Submit).unwrap();

        let allocation = engine.into_allocation().unwrap();
        assert_eq!(allocation.cart_of(ANN).unwrap().items, vec![ItemId(1)]);
        assert_eq!(allocation.cart_of(BOB).unwrap().total, Money::from_cents(200));
        assert_eq!(allocation.pool().items, vec![ItemId(3)]);
    }

    #[test]
    fn test_transfer_unknown_item() {
        let mut engine = engine();
        assert_eq!(
            engine.transfer(ItemId(42), Owner::Pool),
            Err(AllocationError::UnknownItem(ItemId(42)))
        );
    }

    fn command_strategy() -> impl Strategy<Value = AllocationCommand> {
        prop_oneof![
            Just(AllocationCommand::Previous),
            Just(AllocationCommand::Next),
            Just(AllocationCommand::AssignTo(Owner::Pool)),
            (0u32..4).prop_map(|id| AllocationCommand::AssignTo(Owner::Participant(ParticipantId(id)))),
        ]
    }

    proptest! {
        #[test]
        fn prop_single_owner_after_every_transition(
            commands in proptest::collection::vec(command_strategy(), 0..60)
        ) {
            let mut engine = engine();
            for command in commands {
                let _ = engine.apply(command);
                for id in engine.receipt().item_ids() {
                    prop_assert_eq!(holders_of(&engine, id).len(), 1);
                }
                let view = engine.view();
                prop_assert!(view.position >= 1 && view.position <= view.item_count);
            }
        }
    }
}
