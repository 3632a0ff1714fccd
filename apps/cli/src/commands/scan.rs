//! `divvy scan FILE`: parse a receipt and print it.

use std::io::Write;

use anyhow::{Context, Result};
use divvy_core::parser::ReceiptParser;
use divvy_store::DivvyConfig;

use super::read_receipt_lines;
use crate::cli::ScanArgs;

pub fn run(args: &ScanArgs, config: &DivvyConfig, out: &mut impl Write) -> Result<()> {
    let lines = read_receipt_lines(&args.file)?;
    let receipt = ReceiptParser::new(config.parser.clone())
        .parse(&lines)
        .with_context(|| format!("Could not read {} as a receipt", args.file.display()))?;

    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&receipt)?)?;
        return Ok(());
    }

    writeln!(out, "{}", receipt)?;
    if !receipt.applied_discount_rate().is_zero() {
        writeln!(
            out,
            "Whole-receipt discount: {} ({})",
            receipt.whole_receipt_discount(),
            receipt.applied_discount_rate()
        )?;
    }
    for warning in receipt.warnings() {
        writeln!(out, "Warning: {}", warning)?;
    }
    Ok(())
}
