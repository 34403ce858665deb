//! Parser for ParsCit citation XML.
//!
//! The relevant part of the engine output looks like:
//! ```xml
//! <citationList>
//!   <citation valid="true">
//!     <authors><author>J Smith</author><author>K Lee</author></authors>
//!     <title>Deep Learning Systems</title>
//!     <date>2020</date>
//!     <marker>[1]</marker>
//!     <rawString>J. Smith and K. Lee. Deep Learning Systems. 2020.</rawString>
//!     <contexts>
//!       <context position="12" citStr="[1]">... as shown in [1] ...</context>
//!     </contexts>
//!   </citation>
//! </citationList>
//! ```

use anyhow::{bail, Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::RawCitation;

/// Leaf elements of a citation whose text is captured
#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Author,
    Title,
    Booktitle,
    Journal,
    Date,
    Marker,
    RawString,
}

impl Field {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"title" => Some(Field::Title),
            b"booktitle" => Some(Field::Booktitle),
            b"journal" => Some(Field::Journal),
            b"date" => Some(Field::Date),
            b"marker" => Some(Field::Marker),
            b"rawString" => Some(Field::RawString),
            _ => None,
        }
    }
}

/// State for the `<citation>` element currently being read
struct CitationState {
    citation: RawCitation,
    /// Depth below `<citation>`: 1 means a direct child
    depth: usize,
    in_authors: bool,
    seen_authors: bool,
    field: Option<(Field, String)>,
}

impl CitationState {
    fn new(start: &BytesStart) -> Result<Self> {
        let mut valid = false;
        for attr in start.attributes() {
            let attr = attr.context("Malformed citation attribute")?;
            if attr.key.as_ref() == b"valid" {
                valid = attr.unescape_value()? == "true";
            }
        }
        Ok(Self {
            citation: RawCitation {
                valid,
                ..RawCitation::default()
            },
            depth: 0,
            in_authors: false,
            seen_authors: false,
            field: None,
        })
    }

    fn open(&mut self, start: &BytesStart) -> Result<()> {
        self.depth += 1;
        let name = start.name();
        let tag = name.as_ref();

        if self.depth == 1 {
            if tag == b"authors" && !self.seen_authors {
                self.in_authors = true;
                self.seen_authors = true;
            } else if let Some(field) = Field::from_tag(tag) {
                self.field = Some((field, String::new()));
            }
        } else if self.depth == 2 && self.in_authors && tag == b"author" {
            self.field = Some((Field::Author, String::new()));
        }
        Ok(())
    }

    /// Self-closing element: either a context carrying only attributes
    /// or an empty field.
    fn empty(&mut self, start: &BytesStart) -> Result<()> {
        let name = start.name();
        let tag = name.as_ref();

        if tag == b"context" {
            self.push_context(start)?;
        } else if self.depth == 1 && self.in_authors && tag == b"author" {
            self.citation.authors.push(String::new());
        } else if self.depth == 0 {
            if let Some(field) = Field::from_tag(tag) {
                self.store(field, String::new());
            }
        }
        Ok(())
    }

    fn context_start(&mut self, start: &BytesStart) -> Result<()> {
        self.push_context(start)
    }

    fn push_context(&mut self, start: &BytesStart) -> Result<()> {
        for attr in start.attributes() {
            let attr = attr.context("Malformed context attribute")?;
            if attr.key.as_ref() == b"citStr" {
                let value = attr.unescape_value()?.into_owned();
                if !value.is_empty() && !self.citation.contexts.contains(&value) {
                    self.citation.contexts.push(value);
                }
            }
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        if let Some((_, buf)) = self.field.as_mut() {
            buf.push_str(text);
        }
    }

    fn close(&mut self) {
        if self.depth == 2 && matches!(self.field, Some((Field::Author, _))) {
            // Empty authors keep their position so the first one stays first
            if let Some((_, text)) = self.field.take() {
                self.citation.authors.push(text);
            }
        } else if self.depth == 1 {
            if let Some((field, text)) = self.field.take() {
                self.store(field, text);
            }
            self.in_authors = false;
        }
        self.depth = self.depth.saturating_sub(1);
    }

    /// First occurrence of a field wins
    fn store(&mut self, field: Field, text: String) {
        let slot = match field {
            Field::Title => &mut self.citation.title,
            Field::Booktitle => &mut self.citation.booktitle,
            Field::Journal => &mut self.citation.journal,
            Field::Date => &mut self.citation.date,
            Field::Marker => &mut self.citation.marker,
            Field::RawString => &mut self.citation.raw_string,
            Field::Author => return,
        };
        if slot.is_none() {
            *slot = Some(text);
        }
    }
}

/// Parse every `<citation>` element in the engine's XML output.
///
/// Fails on empty input and on XML that is not well formed; both are
/// treated as a failure of the whole document.
pub fn parse_citation_xml(input: &str) -> Result<Vec<RawCitation>> {
    if input.trim().is_empty() {
        bail!("Engine produced no output");
    }

    let mut reader = Reader::from_str(input);
    let mut citations = Vec::new();
    let mut current: Option<CitationState> = None;
    let mut saw_element = false;

    loop {
        let event = reader
            .read_event()
            .with_context(|| format!("Malformed engine XML at byte {}", reader.buffer_position()))?;

        match event {
            Event::Start(ref e) => {
                saw_element = true;
                match current.as_mut() {
                    Some(state) => {
                        if e.name().as_ref() == b"context" {
                            state.context_start(e)?;
                        }
                        state.open(e)?;
                    }
                    None if e.name().as_ref() == b"citation" => {
                        current = Some(CitationState::new(e)?);
                    }
                    None => {}
                }
            }
            Event::Empty(ref e) => {
                saw_element = true;
                match current.as_mut() {
                    Some(state) => state.empty(e)?,
                    None if e.name().as_ref() == b"citation" => {
                        citations.push(CitationState::new(e)?.citation);
                    }
                    None => {}
                }
            }
            Event::Text(ref e) => {
                if let Some(state) = current.as_mut().filter(|s| s.field.is_some()) {
                    let text = e.unescape().context("Invalid escape in engine XML")?;
                    state.text(&text);
                }
            }
            Event::CData(ref e) => {
                if let Some(state) = current.as_mut() {
                    state.text(&String::from_utf8_lossy(e));
                }
            }
            Event::End(_) => {
                if let Some(state) = current.as_mut() {
                    if state.depth == 0 {
                        if let Some(done) = current.take() {
                            citations.push(done.citation);
                        }
                    } else {
                        state.close();
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_element {
        bail!("Engine output contains no XML elements");
    }
    if current.is_some() {
        bail!("Engine XML ended inside a citation element");
    }

    Ok(citations)
}
