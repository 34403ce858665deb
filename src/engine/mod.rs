pub mod parscit;
pub mod xml;

pub use parscit::{EngineFormat, ParsCitEngine};
pub use xml::parse_citation_xml;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// One citation as reported by the extraction engine, before validation.
///
/// Fields the engine did not emit are `None`; the record model decides
/// whether enough of them are present to build an identifier.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawCitation {
    pub valid: bool,
    pub authors: Vec<String>,
    pub title: Option<String>,
    pub booktitle: Option<String>,
    pub journal: Option<String>,
    pub date: Option<String>,
    pub marker: Option<String>,
    pub raw_string: Option<String>,
    pub contexts: Vec<String>,
}

/// Producer of raw citation records for one document
pub trait CitationSource: Sync {
    fn citations(&self, document: &Path) -> Result<Vec<RawCitation>>;
}

/// Parse the JSON form of engine output: an array of citation objects
pub fn parse_citation_json(input: &str) -> Result<Vec<RawCitation>> {
    serde_json::from_str(input).context("Failed to parse engine JSON output")
}
