//! # Line Normalizer
//!
//! Rebuilds logical receipt lines from the physical lines produced by text
//! extraction.
//!
//! ## Wrapped Items
//! ```text
//! Physical lines                         Logical lines
//! ──────────────                         ─────────────
//! "Woolworths Free Range Eggs  "  ─┐
//! "12pk              5.40"        ─┴──►  "Woolworths Free Range Eggs 12pk              5.40"
//! "  PRICE REDUCED"               ──────  (suppressed)
//! "Milk   3.00"                   ──────►  "Milk   3.00"
//! "SUBTOTAL          8.40"        ──────  (stop: nothing below is item data)
//! ```

use tracing::debug;

use super::ParserProfile;

/// Merges wrapped lines and drops banner lines.
#[derive(Debug, Clone, Copy)]
pub struct LineNormalizer<'p> {
    profile: &'p ParserProfile,
}

impl<'p> LineNormalizer<'p> {
    pub fn new(profile: &'p ParserProfile) -> Self {
        LineNormalizer { profile }
    }

    /// Produces the logical lines of the item section.
    ///
    /// `lines` is expected to start after the receipt header.
    pub fn normalize<I, S>(&self, lines: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut logical = Vec::new();
        let mut fragment: Option<String> = None;

        for raw in lines {
            let line = raw.as_ref();

            if self.is_section_end(line) {
                debug!(line, "Item section ends");
                break;
            }

            if line.trim().is_empty() {
                continue;
            }

            if self.is_reduced_price_banner(line) {
                debug!(line, "Suppressing reduced-price banner");
                continue;
            }

            let padded = self.is_continued(line);
            fragment = match (fragment.take(), padded) {
                (None, true) => Some(line.trim().to_string()),
                (None, false) => {
                    logical.push(line.trim().to_string());
                    None
                }
                (Some(mut pending), true) => {
                    pending.push(' ');
                    pending.push_str(line.trim());
                    Some(pending)
                }
                (Some(mut pending), false) => {
                    pending.push(' ');
                    pending.push_str(line.trim());
                    debug!(line = %pending, "Joined wrapped item line");
                    logical.push(pending);
                    None
                }
            };
        }

        if let Some(pending) = fragment {
            debug!(line = %pending, "Emitting unclosed fragment");
            logical.push(pending);
        }

        logical
    }

    /// A right-padded line with no trailing digit run continues on the next line.
    fn is_continued(&self, line: &str) -> bool {
        let padding = line.len() - line.trim_end_matches(' ').len();
        let ends_in_digit = line
            .trim_end()
            .chars()
            .last()
            .is_some_and(|c| c.is_ascii_digit());

        padding >= self.profile.continuation_padding && !ends_in_digit
    }

    fn is_reduced_price_banner(&self, line: &str) -> bool {
        line.trim_start()
            .starts_with(self.profile.reduced_price_marker.as_str())
    }

    fn is_section_end(&self, line: &str) -> bool {
        line.contains(self.profile.subtotal_marker.as_str())
            || line.contains(self.profile.promotional_marker.as_str())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(lines: &[&str]) -> Vec<String> {
        let profile = ParserProfile::default();
        LineNormalizer::new(&profile).normalize(lines)
    }

    #[test]
    fn test_joins_wrapped_line() {
        let logical = normalize(&["Bread  ", "2.50"]);
        assert_eq!(logical, vec!["Bread 2.50"]);
    }

    #[test]
    fn test_passes_single_lines_through() {
        let logical = normalize(&["Milk   3.00", "  Eggs   5.40"]);
        assert_eq!(logical, vec!["Milk   3.00", "Eggs   5.40"]);
    }

    #[test]
    fn test_multi_line_wrap() {
        let logical = normalize(&["Woolworths Free  ", "Range Eggs  ", "12pk      5.40"]);
        assert_eq!(logical, vec!["Woolworths Free Range Eggs 12pk      5.40"]);
    }

    #[test]
    fn test_padded_price_line_is_not_a_fragment() {
        let logical = normalize(&["Milk   3.00   ", "Eggs   5.40"]);
        assert_eq!(logical, vec!["Milk   3.00", "Eggs   5.40"]);
    }

    #[test]
    fn test_reduced_price_banner_suppressed() {
        let logical = normalize(&["Bread  ", "  PRICE REDUCED  ", "2.50"]);
        assert_eq!(logical, vec!["Bread 2.50"]);
    }

    #[test]
    fn test_stops_at_subtotal() {
        let logical = normalize(&["Milk   3.00", "SUBTOTAL   3.00", "Eggs   5.40"]);
        assert_eq!(logical, vec!["Milk   3.00"]);
    }

    #[test]
    fn test_stops_at_promotional_marker() {
        let logical = normalize(&["Milk   3.00", "^Promotional Price applies", "Eggs   5.40"]);
        assert_eq!(logical, vec!["Milk   3.00"]);
    }

    #[test]
    fn test_unclosed_fragment_emitted() {
        let logical = normalize(&["Milk   3.00", "Bread  "]);
        assert_eq!(logical, vec!["Milk   3.00", "Bread"]);
    }

    #[test]
    fn test_blank_lines_skipped() {
        let logical = normalize(&["Bread  ", "", "2.50"]);
        assert_eq!(logical, vec!["Bread 2.50"]);
    }
}
