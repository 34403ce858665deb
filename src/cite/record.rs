use super::identifier::{identify, Identifier};
use crate::engine::RawCitation;

/// A validated citation with its derived identifier
#[derive(Debug, Clone, PartialEq)]
pub struct CitationRecord {
    pub author: String,
    pub title: String,
    pub date: String,
    pub marker: String,
    pub raw_string: String,
    /// Distinct in-body occurrence strings, in the order the engine reported them
    pub contexts: Vec<String>,
    pub identifier: Identifier,
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

/// First present title-like field: title, then booktitle, then journal.
/// An empty element counts as absent.
pub fn resolve_title(raw: &RawCitation) -> Option<&str> {
    non_empty(&raw.title)
        .or_else(|| non_empty(&raw.booktitle))
        .or_else(|| non_empty(&raw.journal))
}

impl CitationRecord {
    /// Build a record from engine output, or `None` when the engine flagged
    /// the citation invalid or a required field is missing.
    pub fn from_raw(raw: &RawCitation) -> Option<Self> {
        if !raw.valid {
            return None;
        }

        let author = raw.authors.first().filter(|a| !a.is_empty())?;
        let title = resolve_title(raw)?;
        let date = non_empty(&raw.date)?;
        let marker = non_empty(&raw.marker)?;
        let raw_string = non_empty(&raw.raw_string)?;

        let mut contexts: Vec<String> = Vec::with_capacity(raw.contexts.len());
        for context in raw.contexts.iter().filter(|c| !c.is_empty()) {
            if !contexts.contains(context) {
                contexts.push(context.clone());
            }
        }

        Some(Self {
            identifier: identify(author, date, title),
            author: author.clone(),
            title: title.to_string(),
            date: date.to_string(),
            marker: marker.to_string(),
            raw_string: raw_string.to_string(),
            contexts,
        })
    }
}
