//! # Line Lexer
//!
//! Splits one logical receipt line into a descriptive name and a trailing
//! monetary amount.
//!
//! ## Lexer States
//! ```text
//! "  Milk 2L   Qty 1   3.00"
//!  ^^                          InLeadingWhitespace  (skip non-alphanumerics)
//!    ^^^^^^^                   InName               (single spaces allowed)
//!           ^^^                InGap                (run >= name_gap closes the name)
//!                      ^^^^    InPrice              (trailing digits and '.')
//! ```
//!
//! The price span is found first by scanning back from the end of the line
//! over digits and `.`. The forward pass then walks the line up to that span;
//! a sign or currency symbol glued to the price (`-1.00`, `$45.60`) is never
//! part of the name.

use crate::error::ParseError;
use crate::money::Money;

/// The states of the forward scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    InLeadingWhitespace,
    InName,
    InGap { run: usize },
    InPrice,
}

/// Name and amount recovered from a line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LexedLine<'a> {
    /// Descriptive text, `None` when the line has no alphanumeric prefix.
    pub name: Option<&'a str>,
    /// Trailing amount; negative when a `-` precedes the digits.
    pub amount: Option<Money>,
}

/// Lexer configured with the gap width that separates name from price.
#[derive(Debug, Clone, Copy)]
pub struct LineLexer {
    name_gap: usize,
}

impl LineLexer {
    pub fn new(name_gap: usize) -> Self {
        LineLexer {
            name_gap: name_gap.max(1),
        }
    }

    /// Lexes a full line (name and amount).
    pub fn lex<'a>(&self, line: &'a str) -> LexedLine<'a> {
        let price_start = trailing_numeric_start(line);
        LexedLine {
            name: self.scan_name(line, price_start),
            amount: parse_trailing_amount(line, price_start).ok(),
        }
    }

    /// Lexes only the trailing amount, as done for total rows.
    pub fn lex_amount(&self, line: &str) -> Result<Money, ParseError> {
        parse_trailing_amount(line, trailing_numeric_start(line))
    }

    fn scan_name<'a>(&self, line: &'a str, price_start: usize) -> Option<&'a str> {
        let mut state = LexState::InLeadingWhitespace;
        let mut name_start = 0;
        let mut name_end = 0;

        for (idx, ch) in line.char_indices() {
            if idx >= price_start {
                state = LexState::InPrice;
            }

            state = match state {
                LexState::InLeadingWhitespace if ch.is_alphanumeric() => {
                    name_start = idx;
                    name_end = idx + ch.len_utf8();
                    LexState::InName
                }
                LexState::InLeadingWhitespace => LexState::InLeadingWhitespace,
                LexState::InName | LexState::InGap { .. } if ch == ' ' => {
                    let run = match state {
                        LexState::InGap { run } => run + 1,
                        _ => 1,
                    };
                    if run >= self.name_gap {
                        break;
                    }
                    LexState::InGap { run }
                }
                LexState::InName | LexState::InGap { .. } => {
                    name_end = idx + ch.len_utf8();
                    LexState::InName
                }
                LexState::InPrice => break,
            };
        }

        if name_end == 0 {
            return None;
        }

        let name = line[name_start..name_end]
            .trim_end_matches(|c: char| c == '-' || c == '$' || c.is_whitespace());
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }
}

/// Byte offset where the trailing run of digits and `.` begins.
///
/// Equal to `line.len()` when the line does not end in such a run.
fn trailing_numeric_start(line: &str) -> usize {
    let trimmed = line.trim_end();
    trimmed
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit() || *c == '.')
        .last()
        .map(|(idx, _)| idx)
        .unwrap_or(line.len())
}

fn parse_trailing_amount(line: &str, price_start: usize) -> Result<Money, ParseError> {
    let trimmed = line.trim_end();
    if price_start >= trimmed.len() {
        return Err(ParseError::PriceUnparseable {
            text: trimmed.to_string(),
        });
    }

    let digits = &trimmed[price_start..];
    let amount: Money = digits.parse()?;

    let prefix = trimmed[..price_start].strip_suffix('$').unwrap_or(&trimmed[..price_start]);
    if prefix.ends_with('-') {
        Ok(-amount)
    } else {
        Ok(amount)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
