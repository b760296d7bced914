//! Facet extraction rules and the insertion-ordered counter.
//!
//! Each facet is derived from a record by walking an ordered list of
//! sources; the first source that yields a non-empty value wins.

use crate::models::MonitoringRecord;
use std::collections::HashMap;
use std::fmt;

/// A category of information extracted from a record's tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facet {
    Version,
    Host,
    ErrorCode,
    Dependency,
    Operation,
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Facet::Version => write!(f, "version"),
            Facet::Host => write!(f, "host"),
            Facet::ErrorCode => write!(f, "error_code"),
            Facet::Dependency => write!(f, "dependency"),
            Facet::Operation => write!(f, "operation"),
        }
    }
}

/// Where a facet value may come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// First tag starting with this exact prefix, prefix stripped.
    Tag(&'static str),
    /// The record's `name` field.
    Name,
}

impl Source {
    /// Value this source yields for `record`, if any.
    ///
    /// Only the first tag with the prefix is considered; an empty value
    /// there means this source yields nothing.
    pub fn extract<'a>(&self, record: &'a MonitoringRecord) -> Option<&'a str> {
        let value = match self {
            Source::Tag(prefix) => record
                .tags()
                .iter()
                .find_map(|tag| tag.strip_prefix(*prefix))?,
            Source::Name => record.name()?,
        };

        (!value.is_empty()).then_some(value)
    }
}

/// Extraction rules per facet, sources in priority order.
pub const FACET_RULES: &[(Facet, &[Source])] = &[
    (Facet::Version, &[Source::Tag("version:")]),
    (Facet::Host, &[Source::Tag("host:")]),
    (Facet::ErrorCode, &[Source::Tag("error.code:")]),
    (
        Facet::Dependency,
        &[
            Source::Tag("peer.service:"),
            Source::Tag("db.instance:"),
            Source::Tag("http.host:"),
            Source::Tag("net.peer.name:"),
        ],
    ),
    (
        Facet::Operation,
        &[Source::Tag("operation:"), Source::Name],
    ),
];

/// Sources for a single facet.
pub fn rules_for(facet: Facet) -> &'static [Source] {
    FACET_RULES
        .iter()
        .find(|(f, _)| *f == facet)
        .map(|(_, sources)| *sources)
        .unwrap_or(&[])
}

/// Extract at most one value of `facet` from `record`.
pub fn extract<'a>(facet: Facet, record: &'a MonitoringRecord) -> Option<&'a str> {
    rules_for(facet)
        .iter()
        .find_map(|source| source.extract(record))
}

/// Occurrence counts that remember first-observed order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacetCounter {
    entries: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl FacetCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of `value`.
    pub fn add(&mut self, value: &str) {
        match self.index.get(value) {
            Some(&slot) => self.entries[slot].1 += 1,
            None => {
                self.index.insert(value.to_string(), self.entries.len());
                self.entries.push((value.to_string(), 1));
            }
        }
    }

    #[allow(dead_code)] // Lookup helper
    pub fn get(&self, value: &str) -> usize {
        self.index
            .get(value)
            .map(|&slot| self.entries[slot].1)
            .unwrap_or(0)
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    /// Number of distinct values.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)] // Pairs with len()
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in first-observed order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(value, count)| (value.as_str(), *count))
    }

    /// The `k` most frequent values, count descending.
    ///
    /// Equal counts keep first-observed order.
    pub fn most_common(&self, k: usize) -> Vec<(&str, usize)> {
        let mut ranked: Vec<(&str, usize)> = self.iter().collect();
        ranked.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
        ranked.truncate(k);
        ranked
    }

    /// The single most frequent value.
    pub fn top(&self) -> Option<(&str, usize)> {
        self.most_common(1).into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_precedence_table() {
        assert_eq!(
            rules_for(Facet::Dependency),
            &[
                Source::Tag("peer.service:"),
                Source::Tag("db.instance:"),
                Source::Tag("http.host:"),
                Source::Tag("net.peer.name:"),
            ]
        );
        assert_eq!(
            rules_for(Facet::Operation),
            &[Source::Tag("operation:"), Source::Name]
        );
        assert_eq!(rules_for(Facet::ErrorCode), &[Source::Tag("error.code:")]);
    }

    #[test]
    fn test_every_facet_has_rules() {
        for facet in [
            Facet::Version,
            Facet::Host,
            Facet::ErrorCode,
            Facet::Dependency,
            Facet::Operation,
        ] {
            assert!(!rules_for(facet).is_empty(), "no rules for {}", facet);
        }
    }

    #[test]
    fn test_dependency_first_matching_prefix_wins() {
        let record = MonitoringRecord::new(["db.instance:Y", "peer.service:X"], None);
        assert_eq!(extract(Facet::Dependency, &record), Some("X"));

        let record = MonitoringRecord::new(["net.peer.name:n", "http.host:h"], None);
        assert_eq!(extract(Facet::Dependency, &record), Some("h"));
    }

    #[test]
    fn test_first_tag_of_a_prefix_wins() {
        let record = MonitoringRecord::new(["host:a", "host:b"], None);
        assert_eq!(extract(Facet::Host, &record), Some("a"));
    }

    #[test]
    fn test_empty_value_does_not_scan_later_tags() {
        let record = MonitoringRecord::new(["version:", "version:2"], None);
        assert_eq!(extract(Facet::Version, &record), None);
    }

    #[test]
    fn test_empty_value_falls_through_to_next_rule() {
        let record = MonitoringRecord::new(["peer.service:", "db.instance:orders"], None);
        assert_eq!(extract(Facet::Dependency, &record), Some("orders"));

        let record = MonitoringRecord::new(["operation:"], Some("checkout.monitor"));
        assert_eq!(extract(Facet::Operation, &record), Some("checkout.monitor"));
    }

    #[test]
    fn test_operation_prefers_tag_over_name() {
        let record = MonitoringRecord::new(["operation:http.request"], Some("monitor"));
        assert_eq!(extract(Facet::Operation, &record), Some("http.request"));

        let record = MonitoringRecord::new(Vec::<String>::new(), Some(""));
        assert_eq!(extract(Facet::Operation, &record), None);
    }

    #[test]
    fn test_prefix_must_match_exactly() {
        let record = MonitoringRecord::new(["hostname:a", "Host:b", "xhost:c"], None);
        assert_eq!(extract(Facet::Host, &record), None);
    }

    #[test]
    fn test_value_keeps_later_colons() {
        let record = MonitoringRecord::new(["http.host:api.internal:8443"], None);
        assert_eq!(extract(Facet::Dependency, &record), Some("api.internal:8443"));
    }

    #[test]
    fn test_counter_ordering_and_ties() {
        let mut counter = FacetCounter::new();
        for value in ["b", "a", "c", "a", "c"] {
            counter.add(value);
        }

        assert_eq!(counter.total(), 5);
        assert_eq!(counter.len(), 3);
        assert_eq!(counter.get("a"), 2);
        assert_eq!(counter.get("missing"), 0);
        assert_eq!(counter.most_common(5), vec![("a", 2), ("c", 2), ("b", 1)]);
        assert_eq!(counter.top(), Some(("a", 2)));
        assert_eq!(
            counter.iter().collect::<Vec<_>>(),
            vec![("b", 1), ("a", 2), ("c", 2)]
        );
    }

    #[test]
    fn test_empty_counter() {
        let counter = FacetCounter::new();
        assert!(counter.is_empty());
        assert_eq!(counter.total(), 0);
        assert_eq!(counter.top(), None);
        assert!(counter.most_common(5).is_empty());
    }
}
