//! # Session
//!
//! Process-wide state: the registered shoppers and the current receipt.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  SpendingStore::load ──► Roster::from_spending ──► Session              │
//! │                                                      │                  │
//! │                      register / scan / begin_allocation / settle        │
//! │                                                      │                  │
//! │  SpendingStore::save ◄── Session::spending_snapshot ◄┘                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Settling a receipt credits every participant's adjusted total to their
//! spending tracker, so the tracker accumulates across receipts and runs.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::allocation::{AllocationEngine, Participant};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::parser::{ParserProfile, ReceiptParser};
use crate::receipt::Receipt;
use crate::settlement::{SettlementEngine, SettlementPolicy, SettlementReport};
use crate::types::ParticipantId;
use crate::validation::{validate_participant_name, validate_selection};

// =============================================================================
// Persistence Port
// =============================================================================

/// Where spending trackers live between runs.
pub trait SpendingStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Reads `name -> spending_tracker`. A store that does not exist yet
    /// yields an empty map.
    fn load(&self) -> Result<BTreeMap<String, Money>, Self::Error>;

    /// Replaces the stored mapping.
    fn save(&self, spending: &BTreeMap<String, Money>) -> Result<(), Self::Error>;
}

// =============================================================================
// Roster
// =============================================================================

/// A registered shopper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Shopper {
    pub id: ParticipantId,
    /// Normalized (lowercase) name.
    pub name: String,
    /// Cumulative spending across receipts and sessions.
    pub spending_tracker: Money,
}

/// Registered shoppers keyed by normalized name.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    shoppers: BTreeMap<String, Shopper>,
    next_id: u32,
}

impl Roster {
    pub fn new() -> Self {
        Roster::default()
    }

    /// Rebuilds a roster from persisted spending trackers.
    pub fn from_spending<I, S>(spending: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (S, Money)>,
        S: AsRef<str>,
    {
        let mut roster = Roster::new();
        for (name, tracker) in spending {
            let id = roster.register(name.as_ref())?;
            roster.credit(id, tracker);
        }
        Ok(roster)
    }

    /// Registers a new shopper.
    ///
    /// ## Errors
    /// - The name fails [`validate_participant_name`]
    /// - `Duplicate` when the name (any case) is already registered
    pub fn register(&mut self, name: &str) -> Result<ParticipantId, ValidationError> {
        let name = validate_participant_name(name)?;
        if self.shoppers.contains_key(&name) {
            return Err(ValidationError::Duplicate {
                field: "shopper".to_string(),
                value: name,
            });
        }

        self.next_id += 1;
        let id = ParticipantId(self.next_id);
        debug!(%id, name = %name, "Shopper registered");
        self.shoppers.insert(
            name.clone(),
            Shopper {
                id,
                name,
                spending_tracker: Money::zero(),
            },
        );
        Ok(id)
    }

    /// Looks a shopper up by name, ignoring case and surrounding spaces.
    pub fn get(&self, name: &str) -> Option<&Shopper> {
        self.shoppers.get(&name.trim().to_lowercase())
    }

    /// Shoppers sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &Shopper> + '_ {
        self.shoppers.values()
    }

    pub fn len(&self) -> usize {
        self.shoppers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shoppers.is_empty()
    }

    fn credit(&mut self, id: ParticipantId, amount: Money) {
        if let Some(shopper) = self.shoppers.values_mut().find(|s| s.id == id) {
            shopper.spending_tracker += amount;
        }
    }

    pub fn spending_snapshot(&self) -> BTreeMap<String, Money> {
        self.shoppers
            .values()
            .map(|s| (s.name.clone(), s.spending_tracker))
            .collect()
    }
}

// =============================================================================
// Session
// =============================================================================

/// One run of the program.
#[derive(Debug, Clone)]
pub struct Session {
    roster: Roster,
    parser: ReceiptParser,
    settlement: SettlementEngine,
    receipt: Option<Arc<Receipt>>,
}

impl Session {
    pub fn new(profile: ParserProfile, policy: SettlementPolicy) -> Self {
        Session::with_roster(Roster::new(), profile, policy)
    }

    pub fn with_roster(roster: Roster, profile: ParserProfile, policy: SettlementPolicy) -> Self {
        Session {
            roster,
            parser: ReceiptParser::new(profile),
            settlement: SettlementEngine::new(policy),
            receipt: None,
        }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn register(&mut self, name: &str) -> CoreResult<ParticipantId> {
        Ok(self.roster.register(name)?)
    }

    /// Parses a document and makes it the current receipt.
    ///
    /// On failure the previous receipt is kept.
    pub fn scan<S: AsRef<str>>(&mut self, lines: &[S]) -> CoreResult<Arc<Receipt>> {
        let receipt = Arc::new(self.parser.parse(lines)?);
        if let Some(previous) = self.receipt.replace(Arc::clone(&receipt)) {
            debug!(scan_id = %previous.scan_id(), "Replacing previous receipt");
        }
        Ok(receipt)
    }

    pub fn receipt(&self) -> Option<&Arc<Receipt>> {
        self.receipt.as_ref()
    }

    /// Starts allocating the current receipt among the named shoppers.
    ///
    /// ## Errors
    /// - `NoReceipt` before any successful scan
    /// - Validation errors for fewer than two names, duplicates or
    ///   unregistered names
    /// - `EmptyReceipt` when the receipt has no items
    pub fn begin_allocation<S: AsRef<str>>(&self, names: &[S]) -> CoreResult<AllocationEngine> {
        let receipt = self.receipt.clone().ok_or(CoreError::NoReceipt)?;
        let names = validate_selection(names)?;

        let participants = names
            .into_iter()
            .map(|name| {
                self.roster
                    .get(&name)
                    .map(|shopper| Participant::new(shopper.id, shopper.name.clone()))
                    .ok_or(ValidationError::NotRegistered {
                        field: "shopper".to_string(),
                        value: name,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AllocationEngine::new(receipt, participants)?)
    }

    /// Settles a submitted allocation and credits the spending trackers.
    pub fn settle(&mut self, engine: AllocationEngine, payer: &str) -> CoreResult<SettlementReport> {
        let payer_id = self
            .roster
            .get(payer)
            .map(|shopper| shopper.id)
            .ok_or_else(|| ValidationError::NotRegistered {
                field: "payer".to_string(),
                value: payer.trim().to_lowercase(),
            })?;

        let allocation = engine.into_allocation()?;
        let report = self.settlement.settle(&allocation, payer_id)?;

        for line in &report.lines {
            self.roster.credit(line.participant, line.adjusted_total);
        }
        if let Some(line) = report.line_for(payer_id) {
            debug!(payer = %line.name, own_share = %line.adjusted_total, "Payer's own share");
        }
        info!(
            scan_id = %report.scan_id,
            participants = report.lines.len(),
            "Spending trackers updated"
        );

        Ok(report)
    }

    pub fn spending_snapshot(&self) -> BTreeMap<String, Money> {
        self.roster.spending_snapshot()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::AllocationCommand;
    use crate::error::AllocationError;
    use crate::types::Owner;

    fn session() -> Session {
        let profile = ParserProfile {
            header_rows: 0,
            ..ParserProfile::default()
        };
        let mut session = Session::new(profile, SettlementPolicy::default());
        session.register("Ann").unwrap();
        session.register("Bob").unwrap();
        session
    }

    #[test]
    fn test_register_normalizes_and_rejects_duplicates() {
        let mut roster = Roster::new();
        let id = roster.register("  Ann ").unwrap();
        assert_eq!(roster.get("ANN").unwrap().id, id);
        assert!(matches!(
            roster.register("ann"),
            Err(ValidationError::Duplicate { .. })
        ));
    }

    #[test]
    fn test_from_spending_round_trip() {
        let mut spending = BTreeMap::new();
        spending.insert("ann".to_string(), Money::from_cents(1250));
        spending.insert("bob".to_string(), Money::zero());

        let roster = Roster::from_spending(spending.clone()).unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.spending_snapshot(), spending);
    }

    #[test]
    fn test_allocation_requires_receipt() {
        let session = session();
        assert!(matches!(
            session.begin_allocation(&["ann", "bob"]),
            Err(CoreError::NoReceipt)
        ));
    }

    #[test]
    fn test_failed_scan_keeps_previous_receipt() {
        let mut session = session();
        let first = session.scan(&["Milk   3.00", "TOTAL   3.00"]).unwrap();
        assert!(session.scan(&["no total here"]).is_err());
        assert_eq!(session.receipt().unwrap().scan_id(), first.scan_id());
    }

    #[test]
    fn test_unregistered_participant() {
        let mut session = session();
        session.scan(&["Milk   3.00", "TOTAL   3.00"]).unwrap();
        assert!(matches!(
            session.begin_allocation(&["ann", "zed"]),
            Err(CoreError::Validation(ValidationError::NotRegistered { .. }))
        ));
    }

    #[test]
    fn test_empty_receipt_cannot_be_allocated() {
        let mut session = session();
        session.scan(&["TOTAL   0.00"]).unwrap();
        assert!(matches!(
            session.begin_allocation(&["ann", "bob"]),
            Err(CoreError::Allocation(AllocationError::EmptyReceipt))
        ));
    }

    #[test]
    fn test_settle_credits_spending() {
        let mut session = session();
        session
            .scan(&["Milk   4.00", "Bread   2.00", "TOTAL   6.00"])
            .unwrap();

        let ann = session.roster().get("ann").unwrap().id;
        let mut engine = session.begin_allocation(&["Ann", "Bob"]).unwrap();
        engine
            .apply(AllocationCommand::AssignTo(Owner::Participant(ann)))
            .unwrap();
        engine.apply(AllocationCommand::Submit).unwrap();

        let report = session.settle(engine, "BOB").unwrap();
        assert_eq!(report.payer_name, "bob");

        let spending = session.spending_snapshot();
        assert_eq!(spending["ann"], Money::from_cents(500));
        assert_eq!(spending["bob"], Money::from_cents(100));
    }

    #[test]
    fn test_settle_unsubmitted_allocation() {
        let mut session = session();
        session.scan(&["Milk   4.00", "TOTAL   4.00"]).unwrap();
        let engine = session.begin_allocation(&["ann", "bob"]).unwrap();

        assert!(matches!(
            session.settle(engine, "ann"),
            Err(CoreError::Allocation(AllocationError::NotSubmitted))
        ));
    }
}
