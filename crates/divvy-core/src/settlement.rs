//! # Settlement
//!
//! Dissolves the shared pool and computes what each participant owes the
//! payer.
//!
//! ## Arithmetic
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  pool_total      = sum(pool items)                                      │
//! │  per_head        = round_half_up(pool_total / n)                        │
//! │  residue         = pool_total - per_head × n      (may be negative)     │
//! │                                                                         │
//! │  for each participant:                                                  │
//! │      adjusted_total = cart_total + per_head (+/- 1 cent if residue      │
//! │                                               is redistributed)         │
//! │      owes           = 0 for the payer, adjusted_total otherwise         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! $10.00 pooled among three gives $3.33 each and a residue of 1 cent. With
//! [`ResiduePolicy::Ignore`] the cent is reported and nobody pays it; with
//! [`ResiduePolicy::Redistribute`] the first participant pays $3.34.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::allocation::Allocation;
use crate::error::{SettlementError, ValidationError};
use crate::money::Money;
use crate::types::ParticipantId;

// =============================================================================
// Policy
// =============================================================================

/// What to do with the cents left over by an uneven pool split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResiduePolicy {
    /// Report the residue; nobody pays it.
    #[default]
    Ignore,
    /// Hand out the residue one cent at a time, in participant order.
    Redistribute,
}

impl fmt::Display for ResiduePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResiduePolicy::Ignore => write!(f, "ignore"),
            ResiduePolicy::Redistribute => write!(f, "redistribute"),
        }
    }
}

impl FromStr for ResiduePolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ignore" | "none" => Ok(ResiduePolicy::Ignore),
            "redistribute" | "spread" => Ok(ResiduePolicy::Redistribute),
            other => Err(ValidationError::InvalidFormat {
                field: "residue".to_string(),
                reason: format!(
                    "unknown policy '{}'. Valid options: ignore, redistribute",
                    other
                ),
            }),
        }
    }
}

/// Settlement settings, the `[settlement]` section of the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlementPolicy {
    pub residue: ResiduePolicy,
}

// =============================================================================
// Report
// =============================================================================

/// One participant's share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettlementLine {
    pub participant: ParticipantId,
    pub name: String,
    pub cart_total: Money,
    pub pool_share: Money,
    pub adjusted_total: Money,
    /// Amount owed to the payer; zero for the payer.
    pub owes: Money,
    pub paid: bool,
}

/// Result of settling one allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettlementReport {
    pub scan_id: Uuid,
    pub settled_at: DateTime<Utc>,
    pub payer: ParticipantId,
    pub payer_name: String,
    pub pool_total: Money,
    pub per_head: Money,
    /// Cents not covered by the pool shares. Negative when rounding up
    /// over-collects.
    pub residue: Money,
    pub lines: Vec<SettlementLine>,
}

impl SettlementReport {
    pub fn line_for(&self, participant: ParticipantId) -> Option<&SettlementLine> {
        self.lines.iter().find(|line| line.participant == participant)
    }

    /// Sum of every participant's adjusted total.
    pub fn adjusted_sum(&self) -> Money {
        self.lines.iter().map(|line| line.adjusted_total).sum()
    }
}

impl fmt::Display for SettlementReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines.iter().filter(|line| !line.paid) {
            writeln!(f, "{} owes {}: {}", line.name, self.payer_name, line.owes)?;
        }
        if !self.residue.is_zero() {
            writeln!(f, "Unallocated residue: {}", self.residue)?;
        }
        Ok(())
    }
}

// =============================================================================
// Settlement Engine
// =============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct SettlementEngine {
    policy: SettlementPolicy,
}

impl SettlementEngine {
    pub fn new(policy: SettlementPolicy) -> Self {
        SettlementEngine { policy }
    }

    /// Splits the pool and computes each participant's debt to `payer`.
    pub fn settle(
        &self,
        allocation: &Allocation,
        payer: ParticipantId,
    ) -> Result<SettlementReport, SettlementError> {
        let participants = allocation.participants();
        if participants.is_empty() {
            return Err(SettlementError::NoParticipants);
        }
        let payer_name = allocation
            .participant(payer)
            .map(|p| p.name.clone())
            .ok_or(SettlementError::UnknownPayer(payer))?;

        let heads = participants.len();
        let pool_total = allocation.pool().total;
        let per_head = pool_total
            .split_evenly(heads)
            .ok_or(SettlementError::NoParticipants)?;
        let mut residue = pool_total - per_head * heads as i64;

        let mut lines = Vec::with_capacity(heads);
        for participant in participants {
            let cart_total = allocation
                .cart_of(participant.id)
                .map(|cart| cart.total)
                .unwrap_or_default();

            let mut pool_share = per_head;
            if self.policy.residue == ResiduePolicy::Redistribute && !residue.is_zero() {
                let cent = if residue.is_negative() {
                    Money::from_cents(-1)
                } else {
                    Money::from_cents(1)
                };
                pool_share += cent;
                residue -= cent;
            }

            let adjusted_total = cart_total + pool_share;
            let paid = participant.id == payer;
            lines.push(SettlementLine {
                participant: participant.id,
                name: participant.name.clone(),
                cart_total,
                pool_share,
                adjusted_total,
                owes: if paid { Money::zero() } else { adjusted_total },
                paid,
            });
        }

        let report = SettlementReport {
            scan_id: allocation.receipt().scan_id(),
            settled_at: Utc::now(),
            payer,
            payer_name,
            pool_total,
            per_head,
            residue,
            lines,
        };

        info!(
            scan_id = %report.scan_id,
            payer = %report.payer,
            pool = %pool_total,
            per_head = %per_head,
            residue = %report.residue,
            policy = %self.policy.residue,
            "Receipt settled"
        );

        Ok(report)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::{AllocationCommand, AllocationEngine, Participant};
    use crate::parser::{ParserProfile, ReceiptParser};
    use crate::types::Owner;
    use proptest::prelude::*;
    use std::sync::Arc;

    const A: ParticipantId = ParticipantId(1);
    const B: ParticipantId = ParticipantId(2);
    const C: ParticipantId = ParticipantId(3);

    /// Parses `lines`, applies `assign` to the items in order and submits.
    fn allocate(lines: &[&str], heads: &[ParticipantId], assign: &[Owner]) -> Allocation {
        let profile = ParserProfile {
            header_rows: 0,
            ..ParserProfile::default()
        };
        let receipt = Arc::new(ReceiptParser::new(profile).parse(lines).unwrap());
        let participants = heads
            .iter()
            .map(|id| Participant::new(*id, format!("p{}", id.0)))
            .collect();

        let mut engine = AllocationEngine::new(receipt, participants).unwrap();
        for owner in assign {
            engine.apply(AllocationCommand::AssignTo(*owner)).unwrap();
        }
        engine.apply(AllocationCommand::Submit).unwrap();
        engine.into_allocation().unwrap()
    }

    #[test]
    fn test_no_pool_payer_owes_nothing() {
        let allocation = allocate(
            &["Milk   5.00", "Bread   5.00", "TOTAL   10.00"],
            &[A, B],
            &[Owner::Participant(A), Owner::Participant(B)],
        );
        let report = SettlementEngine::default().settle(&allocation, A).unwrap();

        assert_eq!(report.line_for(A).unwrap().owes, Money::zero());
        assert!(report.line_for(A).unwrap().paid);
        assert_eq!(report.line_for(B).unwrap().owes, Money::from_cents(500));
        assert_eq!(report.to_string(), "p2 owes p1: $5.00\n");
    }

    #[test]
    fn test_even_pool_split() {
        let allocation = allocate(&["Milk   9.00", "TOTAL   9.00"], &[A, B, C], &[]);
        let report = SettlementEngine::default().settle(&allocation, C).unwrap();

        assert_eq!(report.per_head, Money::from_cents(300));
        assert_eq!(report.residue, Money::zero());
        for line in &report.lines {
            assert_eq!(line.adjusted_total, Money::from_cents(300));
        }
    }

    #[test]
    fn test_residue_ignored_by_default() {
        let allocation = allocate(&["Milk   10.00", "TOTAL   10.00"], &[A, B, C], &[]);
        let report = SettlementEngine::default().settle(&allocation, A).unwrap();

        assert_eq!(report.per_head, Money::from_cents(333));
        assert_eq!(report.residue, Money::from_cents(1));
        assert_eq!(report.adjusted_sum(), Money::from_cents(999));
        assert!(report.to_string().contains("Unallocated residue: $0.01"));
    }

    #[test]
    fn test_residue_redistributed() {
        let allocation = allocate(&["Milk   10.00", "TOTAL   10.00"], &[A, B, C], &[]);
        let engine = SettlementEngine::new(SettlementPolicy {
            residue: ResiduePolicy::Redistribute,
        });
        let report = engine.settle(&allocation, A).unwrap();

        assert_eq!(report.line_for(A).unwrap().adjusted_total, Money::from_cents(334));
        assert_eq!(report.line_for(B).unwrap().adjusted_total, Money::from_cents(333));
        assert_eq!(report.residue, Money::zero());
        assert_eq!(report.adjusted_sum(), Money::from_cents(1000));
    }

    #[test]
    fn test_negative_residue_redistributed() {
        // 5.00 / 3 rounds up to 1.67, over-collecting one cent
        let allocation = allocate(&["Milk   5.00", "TOTAL   5.00"], &[A, B, C], &[]);
        let engine = SettlementEngine::new(SettlementPolicy {
            residue: ResiduePolicy::Redistribute,
        });
        let report = engine.settle(&allocation, A).unwrap();

        assert_eq!(report.per_head, Money::from_cents(167));
        assert_eq!(report.line_for(A).unwrap().pool_share, Money::from_cents(166));
        assert_eq!(report.adjusted_sum(), Money::from_cents(500));
    }

    #[test]
    fn test_unknown_payer() {
        let allocation = allocate(&["Milk   5.00", "TOTAL   5.00"], &[A, B], &[]);
        assert_eq!(
            SettlementEngine::default().settle(&allocation, ParticipantId(9)),
            Err(SettlementError::UnknownPayer(ParticipantId(9)))
        );
    }

    fn receipt_lines(prices: &[i64]) -> Vec<String> {
        let mut lines: Vec<String> = prices
            .iter()
            .enumerate()
            .map(|(i, cents)| format!("Item{}   {}", i, Money::from_cents(*cents).to_decimal_string()))
            .collect();
        let total: i64 = prices.iter().sum();
        lines.push(format!("TOTAL   {}", Money::from_cents(total).to_decimal_string()));
        lines
    }

    proptest! {
        #[test]
        fn test_adjusted_sum_within_bound(
            items in prop::collection::vec((1i64..5_000, 0usize..7), 1..10),
            heads in 1usize..7,
            redistribute in any::<bool>(),
        ) {
            let ids: Vec<ParticipantId> = (1..=heads as u32).map(ParticipantId).collect();
            let prices: Vec<i64> = items.iter().map(|(cents, _)| *cents).collect();
            let owners: Vec<Owner> = items
                .iter()
                .map(|(_, pick)| match pick % (heads + 1) {
                    0 => Owner::Pool,
                    n => Owner::Participant(ids[n - 1]),
                })
                .collect();

            let lines = receipt_lines(&prices);
            let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
            let allocation = allocate(&lines, &ids, &owners);

            let policy = SettlementPolicy {
                residue: if redistribute { ResiduePolicy::Redistribute } else { ResiduePolicy::Ignore },
            };
            let report = SettlementEngine::new(policy).settle(&allocation, ids[0]).unwrap();

            let carts: Money = report.lines.iter().map(|l| l.cart_total).sum();
            let expected = carts + report.pool_total;
            let drift = (report.adjusted_sum() - expected).abs();
            prop_assert!(drift.cents() <= report.lines.len() as i64);
            prop_assert_eq!(carts + report.pool_total, Money::from_cents(prices.iter().sum()));
            if redistribute {
                prop_assert_eq!(report.adjusted_sum(), expected);
            }
        }
    }

    #[test]
    fn test_residue_policy_parse() {
        assert_eq!("Redistribute".parse::<ResiduePolicy>().unwrap(), ResiduePolicy::Redistribute);
        assert_eq!("ignore".parse::<ResiduePolicy>().unwrap(), ResiduePolicy::Ignore);
        assert!("half".parse::<ResiduePolicy>().is_err());
    }
}
