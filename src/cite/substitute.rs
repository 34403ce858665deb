//! Rewrites document text so every citation form carries its identifier.
//!
//! Each pass is a literal, whole-document `replace` applied key by key in
//! index order. Passes are not position-disjoint: text inserted by an
//! earlier replacement can be matched again by a later key.

use super::collect::CitationIndex;
use super::identifier::Identifier;

/// Number of leading characters of a raw reference used as its search key
pub const RAW_PREFIX_CHARS: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubstitutionOptions {
    /// Replace residual markers after the context pass
    pub marker_pass: bool,
}

impl Default for SubstitutionOptions {
    fn default() -> Self {
        Self { marker_pass: true }
    }
}

/// Replace each context string with its identifiers joined by a space
pub fn replace_contexts(text: String, index: &CitationIndex) -> String {
    index
        .contexts
        .iter()
        .filter(|(context, _)| !context.is_empty())
        .fold(text, |text, (context, identifiers)| {
            let joined = identifiers
                .iter()
                .map(Identifier::as_str)
                .collect::<Vec<_>>()
                .join(" ");
            text.replace(context.as_str(), &joined)
        })
}

/// Replace each marker still present with its identifier
pub fn replace_markers(text: String, index: &CitationIndex) -> String {
    index
        .markers
        .iter()
        .filter(|(marker, _)| !marker.is_empty())
        .fold(text, |text, (marker, identifier)| {
            text.replace(marker.as_str(), identifier.as_str())
        })
}

/// Leading slice of a raw reference, at most `RAW_PREFIX_CHARS` characters
pub fn raw_prefix(raw: &str) -> &str {
    match raw.char_indices().nth(RAW_PREFIX_CHARS) {
        Some((end, _)) => &raw[..end],
        None => raw,
    }
}

/// Prefix each reference-list entry with `"<identifier>. "`, keeping the entry text
pub fn tag_raw_strings(text: String, index: &CitationIndex) -> String {
    index
        .raw_strings
        .iter()
        .filter(|(raw, _)| !raw.is_empty())
        .fold(text, |text, (raw, identifier)| {
            let prefix = raw_prefix(raw);
            text.replace(prefix, &format!("{}. {}", identifier, prefix))
        })
}

/// Collapse `"<id> <id>"` to `"<id>"` for every identifier in the index.
///
/// Sweeps repeat until one makes no change, so the result is a fixed point.
pub fn collapse_duplicates(mut text: String, index: &CitationIndex) -> String {
    let patterns: Vec<(String, &str)> = index
        .identifiers()
        .into_iter()
        .filter(|id| !id.as_str().is_empty())
        .map(|id| (format!("{0} {0}", id), id.as_str()))
        .collect();

    loop {
        let mut changed = false;
        for (duplicate, identifier) in &patterns {
            while text.contains(duplicate.as_str()) {
                text = text.replace(duplicate.as_str(), identifier);
                changed = true;
            }
        }
        if !changed {
            return text;
        }
    }
}

/// Run all passes in order: contexts, markers (optional), raw strings,
/// then duplicate collapsing.
pub fn substitute(text: &str, index: &CitationIndex, options: &SubstitutionOptions) -> String {
    let mut text = replace_contexts(text.to_string(), index);
    if options.marker_pass {
        text = replace_markers(text, index);
    }
    let text = tag_raw_strings(text, index);
    collapse_duplicates(text, index)
}
