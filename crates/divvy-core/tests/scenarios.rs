//! End-to-end scenarios: receipt text in, owed amounts out.

use std::sync::Arc;

use divvy_core::allocation::{AllocationCommand, AllocationEngine, AllocationState, Participant};
use divvy_core::parser::{FieldExtractor, LineNormalizer, ParsedRecord, ParserProfile, ReceiptParser};
use divvy_core::settlement::SettlementEngine;
use divvy_core::{AllocationError, ItemId, Money, Owner, ParticipantId};

fn profile(header_rows: usize) -> ParserProfile {
    ParserProfile {
        header_rows,
        ..ParserProfile::default()
    }
}

const A: ParticipantId = ParticipantId(1);
const B: ParticipantId = ParticipantId(2);
const C: ParticipantId = ParticipantId(3);

fn participants(ids: &[ParticipantId]) -> Vec<Participant> {
    ids.iter()
        .map(|id| Participant::new(*id, format!("shopper{}", id.0)))
        .collect()
}

#[test]
fn test_wrapped_item_is_rejoined() {
    let profile = profile(0);
    let logical = LineNormalizer::new(&profile).normalize(["Bread  ", "2.50"]);
    let records: Vec<_> = logical
        .iter()
        .map(|line| FieldExtractor::new(&profile).extract(line, false))
        .collect();

    assert_eq!(
        records,
        vec![ParsedRecord::Item {
            name: "Bread".to_string(),
            price: Money::from_cents(250),
        }]
    );
}

#[test]
fn test_member_saving_applied_to_item_above() {
    let receipt = ReceiptParser::new(profile(0))
        .parse(&["Milk   3.00", "Member Price Saving -1.00", "TOTAL   2.00"])
        .unwrap();

    let items: Vec<_> = receipt.items().collect();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name(), "Milk");
    assert_eq!(items[0].price(), Money::from_cents(200));
    assert!(receipt.warnings().is_empty());
}

#[test]
fn test_no_pool_two_participants() {
    let receipt = ReceiptParser::new(profile(0))
        .parse(&["Groceries   5.00", "Wine   5.00", "TOTAL   10.00"])
        .unwrap();
    let mut engine = AllocationEngine::new(Arc::new(receipt), participants(&[A, B])).unwrap();

    engine
        .apply(AllocationCommand::AssignTo(Owner::Participant(A)))
        .unwrap();
    engine
        .apply(AllocationCommand::AssignTo(Owner::Participant(B)))
        .unwrap();
    engine.apply(AllocationCommand::Submit).unwrap();

    let report = SettlementEngine::default()
        .settle(&engine.into_allocation().unwrap(), A)
        .unwrap();

    assert_eq!(report.pool_total, Money::zero());
    assert_eq!(report.line_for(A).unwrap().owes, Money::zero());
    assert_eq!(report.line_for(B).unwrap().owes, Money::from_cents(500));
}

#[test]
fn test_whole_receipt_pooled_among_three() {
    let receipt = ReceiptParser::new(profile(0))
        .parse(&["Pizza   6.00", "Garlic Bread   3.00", "TOTAL   9.00"])
        .unwrap();
    let mut engine =
        AllocationEngine::new(Arc::new(receipt), participants(&[A, B, C])).unwrap();
    engine.apply(AllocationCommand::Submit).unwrap();

    let report = SettlementEngine::default()
        .settle(&engine.into_allocation().unwrap(), B)
        .unwrap();

    assert_eq!(report.per_head, Money::from_cents(300));
    for line in &report.lines {
        assert_eq!(line.adjusted_total, Money::from_cents(300));
    }
}

#[test]
fn test_unknown_participant_rejected_without_side_effects() {
    let receipt = ReceiptParser::new(profile(0))
        .parse(&["Milk   3.00", "Bread   2.00", "TOTAL   5.00"])
        .unwrap();
    let mut engine = AllocationEngine::new(Arc::new(receipt), participants(&[A, B])).unwrap();
    let before = engine.view();

    let result = engine.apply(AllocationCommand::AssignTo(Owner::Participant(ParticipantId(42))));

    assert_eq!(
        result,
        Err(AllocationError::InvalidParticipant(ParticipantId(42)))
    );
    assert_eq!(engine.view(), before);
    assert_eq!(engine.owner_of(ItemId(1)), Some(Owner::Pool));
    assert_eq!(engine.state(), AllocationState::Assigning);
}

#[test]
fn test_full_digital_receipt() {
    let lines = [
        "WOOLWORTHS",
        "Shop 1, 100 George St",
        "ABN 88 000 014 675",
        "TAX INVOICE",
        "Woolworths Free Range  ",
        "Eggs 12pk      6.00",
        "Full Cream Milk 2L      3.10",
        "Member Price Saving -0.60",
        "Sourdough Loaf  ",
        "  PRICE REDUCED  ",
        "4.50",
        "Full Cream Milk 2L      3.10",
        "Weekly OFFER   -0.10",
        "Gift Card Voucher      20.00",
        "Everyday Extra 10% Discount      -1.60",
        "SUBTOTAL      34.40",
        "TOTAL      $34.40",
    ];

    let receipt = ReceiptParser::new(profile(4)).parse(&lines).unwrap();

    let items: Vec<_> = receipt
        .items()
        .map(|item| (item.name().to_string(), item.price().cents()))
        .collect();
    assert_eq!(
        items,
        vec![
            ("Woolworths Free Range Eggs 12pk".to_string(), 540),
            ("Full Cream Milk 2L".to_string(), 225),
            ("Sourdough Loaf".to_string(), 405),
            ("Full Cream Milk 2L #2".to_string(), 270),
            ("Gift Card Voucher".to_string(), 2000),
        ]
    );
    assert_eq!(receipt.declared_total(), Money::from_cents(3440));
    assert_eq!(receipt.whole_receipt_discount(), Money::from_cents(-160));
    assert_eq!(receipt.computed_total(), Money::from_cents(3440));
    assert!(receipt.warnings().is_empty(), "{:?}", receipt.warnings());
}
