//! Selection set of protocols chosen for comparison.
//!
//! Holds at most [`MAX_SELECTION`] quotes, unique by name. Selecting an
//! already-selected protocol removes it; selecting a fourth evicts the
//! oldest. The set also builds the comparison query handed to the router.

use super::quote::ProtocolQuote;

/// Maximum number of simultaneously selected protocols.
pub const MAX_SELECTION: usize = 3;

/// Separator between encoded names in a comparison query.
pub const QUERY_DELIMITER: char = ',';

/// Ordered, bounded set of selected protocols.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionSet {
    members: Vec<ProtocolQuote>,
}

impl SelectionSet {
    /// Create an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle a quote in or out of the selection.
    ///
    /// Returns `true` if the quote is selected after the call.
    pub fn toggle(&mut self, quote: ProtocolQuote) -> bool {
        if self.contains(&quote.name) {
            self.members.retain(|m| m.name != quote.name);
            return false;
        }

        self.members.push(quote);
        if self.members.len() > MAX_SELECTION {
            let overflow = self.members.len() - MAX_SELECTION;
            self.members.drain(..overflow);
        }
        true
    }

    /// Whether a protocol with this name is selected.
    pub fn contains(&self, name: &str) -> bool {
        self.members.iter().any(|m| m.name == name)
    }

    /// Selected quotes, oldest first.
    pub fn members(&self) -> &[ProtocolQuote] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Comparison needs at least two protocols.
    pub fn can_compare(&self) -> bool {
        self.members.len() >= 2
    }

    /// Percent-encoded names joined by [`QUERY_DELIMITER`].
    pub fn comparison_query(&self) -> String {
        self.members
            .iter()
            .map(|m| urlencoding::encode(&m.name).into_owned())
            .collect::<Vec<_>>()
            .join(&QUERY_DELIMITER.to_string())
    }
}

/// Decode a comparison query back into protocol names.
///
/// Empty segments are skipped. A segment that is not valid percent-encoding
/// is kept verbatim.
pub fn parse_comparison_query(raw: &str) -> Vec<String> {
    raw.split(QUERY_DELIMITER)
        .filter(|s| !s.is_empty())
        .map(|s| {
            urlencoding::decode(s)
                .map(|d| d.into_owned())
                .unwrap_or_else(|_| s.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(name: &str) -> ProtocolQuote {
        ProtocolQuote::new(name, 1.0)
    }

    fn names(set: &SelectionSet) -> Vec<&str> {
        set.members().iter().map(|m| m.name.as_str()).collect()
    }

    #[test]
    fn test_toggle_adds_then_removes() {
        let mut set = SelectionSet::new();
        assert!(set.toggle(q("A")));
        assert!(set.contains("A"));
        assert!(!set.toggle(q("A")));
        assert!(set.is_empty());
    }

    #[test]
    fn test_fourth_selection_evicts_oldest() {
        let mut set = SelectionSet::new();
        for n in ["A", "B", "C", "D"] {
            set.toggle(q(n));
        }
        assert_eq!(names(&set), vec!["B", "C", "D"]);
    }

    #[test]
    fn test_remove_preserves_order_of_rest() {
        let mut set = SelectionSet::new();
        for n in ["A", "B", "C"] {
            set.toggle(q(n));
        }
        set.toggle(q("B"));
        assert_eq!(names(&set), vec!["A", "C"]);
    }

    #[test]
    fn test_can_compare_needs_two() {
        let mut set = SelectionSet::new();
        set.toggle(q("A"));
        assert!(!set.can_compare());
        set.toggle(q("B"));
        assert!(set.can_compare());
    }

    #[test]
    fn test_comparison_query_encodes_names() {
        let mut set = SelectionSet::new();
        set.toggle(q("Aave-V3"));
        set.toggle(q("Binance Staked ETH"));
        let query = set.comparison_query();
        assert_eq!(query, "Aave-V3,Binance%20Staked%20ETH");
        assert_eq!(
            parse_comparison_query(&query),
            vec!["Aave-V3".to_string(), "Binance Staked ETH".to_string()]
        );
    }

    #[test]
    fn test_comma_in_name_survives_query() {
        let mut set = SelectionSet::new();
        set.toggle(q("a,b"));
        set.toggle(q("c"));
        assert_eq!(
            parse_comparison_query(&set.comparison_query()),
            vec!["a,b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn test_parse_skips_empty_segments() {
        assert!(parse_comparison_query("").is_empty());
        assert_eq!(parse_comparison_query("x,,y"), vec!["x", "y"]);
    }
}
