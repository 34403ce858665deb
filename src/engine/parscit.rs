use anyhow::{anyhow, Context, Result};
use clap::ValueEnum;
use log::debug;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::{parse_citation_json, parse_citation_xml, CitationSource, RawCitation};

/// Structured format printed by the engine on stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum EngineFormat {
    #[default]
    Xml,
    Json,
}

impl EngineFormat {
    pub fn parse(&self, output: &str) -> Result<Vec<RawCitation>> {
        match self {
            EngineFormat::Xml => parse_citation_xml(output),
            EngineFormat::Json => parse_citation_json(output),
        }
    }
}

/// External citation extractor invoked once per document as
/// `<program> [args...] <document>`
#[derive(Debug, Clone)]
pub struct ParsCitEngine {
    program: PathBuf,
    args: Vec<String>,
    format: EngineFormat,
}

impl ParsCitEngine {
    pub fn new<P: Into<PathBuf>>(program: P) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            format: EngineFormat::Xml,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_format(mut self, format: EngineFormat) -> Self {
        self.format = format;
        self
    }

    /// Run the engine and return its stdout
    fn run(&self, document: &Path) -> Result<String> {
        debug!("Running {} on {}", self.program.display(), document.display());

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(document.as_os_str())
            .output()
            .with_context(|| {
                format!(
                    "Failed to run citation engine {}. Is it installed?",
                    self.program.display()
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "Citation engine exited with {}: {}",
                output.status,
                stderr.trim()
            ));
        }

        let stdout = String::from_utf8(output.stdout)
            .context("Citation engine output is not valid UTF-8")?;

        if stdout.trim().is_empty() {
            return Err(anyhow!("Citation engine produced no output"));
        }

        Ok(stdout)
    }
}

impl CitationSource for ParsCitEngine {
    fn citations(&self, document: &Path) -> Result<Vec<RawCitation>> {
        let output = self.run(document)?;
        self.format
            .parse(&output)
            .with_context(|| format!("Unreadable engine output for {}", document.display()))
    }
}
