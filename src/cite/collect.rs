use indexmap::{IndexMap, IndexSet};
use std::collections::BTreeSet;

use super::identifier::Identifier;
use super::record::CitationRecord;
use crate::engine::RawCitation;

/// Textual forms of the citations in one document, each mapped to identifiers.
///
/// Keys keep their first-insertion order so replacements run in document
/// order. Context strings can be attributed to several citations, so they
/// map to a set; the set is ordered to keep joined output reproducible.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CitationIndex {
    pub markers: IndexMap<String, Identifier>,
    pub contexts: IndexMap<String, BTreeSet<Identifier>>,
    pub raw_strings: IndexMap<String, Identifier>,
}

impl CitationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one record's forms. Markers and raw strings are last-writer-wins;
    /// contexts accumulate.
    pub fn insert(&mut self, record: &CitationRecord) {
        self.markers
            .insert(record.marker.clone(), record.identifier.clone());

        for context in &record.contexts {
            self.contexts
                .entry(context.clone())
                .or_default()
                .insert(record.identifier.clone());
        }

        self.raw_strings
            .insert(record.raw_string.clone(), record.identifier.clone());
    }

    /// Every identifier mentioned by any of the three maps, sorted
    pub fn identifiers(&self) -> BTreeSet<&Identifier> {
        self.markers
            .values()
            .chain(self.contexts.values().flatten())
            .chain(self.raw_strings.values())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty() && self.contexts.is_empty() && self.raw_strings.is_empty()
    }
}

/// Result of collecting one document's citations
#[derive(Debug, Clone, Default)]
pub struct Collection {
    pub index: CitationIndex,
    /// Distinct identifiers in order of first appearance
    pub identifiers: IndexSet<Identifier>,
    pub records_seen: usize,
    pub records_skipped: usize,
}

/// Build the citation index for one document from the engine's records.
/// Invalid or incomplete records are counted and skipped.
pub fn collect(citations: &[RawCitation]) -> Collection {
    let mut collection = Collection {
        records_seen: citations.len(),
        ..Collection::default()
    };

    for raw in citations {
        let Some(record) = CitationRecord::from_raw(raw) else {
            collection.records_skipped += 1;
            continue;
        };

        collection.identifiers.insert(record.identifier.clone());
        collection.index.insert(&record);
    }

    collection
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(author: &str, title: &str, date: &str, marker: &str, contexts: &[&str]) -> RawCitation {
        RawCitation {
            valid: true,
            authors: vec![author.to_string()],
            title: Some(title.to_string()),
            date: Some(date.to_string()),
            marker: Some(marker.to_string()),
            raw_string: Some(format!("{}. {}. {}.", author, title, date)),
            contexts: contexts.iter().map(|c| c.to_string()).collect(),
            ..RawCitation::default()
        }
    }

    #[test]
    fn test_collect_builds_all_indexes() {
        let citations = vec![
            raw("Smith, J.", "Deep Learning Systems", "2020", "[1]", &["[1]"]),
            raw("Jones, A.", "Graph Mining at Scale", "2019", "[2]", &["[2]", "Jones et al. [2]"]),
        ];
        let collection = collect(&citations);

        assert_eq!(collection.records_seen, 2);
        assert_eq!(collection.records_skipped, 0);
        assert_eq!(collection.index.markers["[1]"].as_str(), "@smith2020deep");
        assert_eq!(collection.index.markers["[2]"].as_str(), "@jones2019graph");
        assert_eq!(collection.index.contexts.len(), 3);
        assert_eq!(collection.index.raw_strings.len(), 2);
        let ids: Vec<&str> = collection.identifiers.iter().map(|i| i.as_str()).collect();
        assert_eq!(ids, vec!["@smith2020deep", "@jones2019graph"]);
    }

    #[test]
    fn test_invalid_records_contribute_nothing() {
        let mut invalid = raw("Ghost, G.", "Phantom Paper", "1999", "[9]", &["[9]"]);
        invalid.valid = false;
        let citations = vec![invalid, raw("Smith, J.", "Deep Learning", "2020", "[1]", &[])];

        let collection = collect(&citations);
        assert_eq!(collection.records_skipped, 1);
        assert!(!collection.index.markers.contains_key("[9]"));
        assert!(!collection.index.contexts.contains_key("[9]"));
        assert!(collection
            .index
            .raw_strings
            .values()
            .all(|id| id.as_str() != "@ghost1999phantom"));
        assert_eq!(collection.identifiers.len(), 1);
    }

    #[test]
    fn test_shared_context_keeps_all_identifiers() {
        let citations = vec![
            raw("Zimmer, B.", "Zoology Basics", "2001", "[3]", &["[3, 4]"]),
            raw("Adams, C.", "Anatomy Atlas", "2002", "[4]", &["[3, 4]"]),
        ];
        let collection = collect(&citations);
        let ids: Vec<&str> = collection.index.contexts["[3, 4]"]
            .iter()
            .map(|i| i.as_str())
            .collect();
        assert_eq!(ids, vec!["@adams2002anatomy", "@zimmer2001zoology"]);
    }

    #[test]
    fn test_duplicate_marker_last_writer_wins() {
        let citations = vec![
            raw("Smith, J.", "Deep Learning", "2020", "[1]", &[]),
            raw("Jones, A.", "Graph Mining", "2019", "[1]", &[]),
        ];
        let collection = collect(&citations);
        assert_eq!(collection.index.markers.len(), 1);
        assert_eq!(collection.index.markers["[1]"].as_str(), "@jones2019graph");
    }

    #[test]
    fn test_repeated_work_listed_once() {
        let citations = vec![
            raw("Smith, J.", "Deep Learning", "2020", "[1]", &[]),
            raw("Smith, J.", "Deep Learning", "2020", "[5]", &[]),
        ];
        let collection = collect(&citations);
        assert_eq!(collection.identifiers.len(), 1);
        assert_eq!(collection.index.markers.len(), 2);
        assert_eq!(collection.index.identifiers().len(), 1);
    }

    #[test]
    fn test_collect_empty_input() {
        let collection = collect(&[]);
        assert!(collection.index.is_empty());
        assert!(collection.identifiers.is_empty());
        assert_eq!(collection.records_seen, 0);
    }
}
