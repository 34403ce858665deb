use citex::engine::EngineFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "citex")]
#[command(about = "Derive stable citation identifiers and rewrite in-text citations with them")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rewrite documents so every citation form carries its identifier
    Replace(ReplaceArgs),

    /// Append each document's identifiers to a corpus table without rewriting it
    Resolve(ResolveArgs),

    /// Print the identifier derived from author, date and title
    Identify(IdentifyArgs),
}

/// Options shared by the commands that run the citation engine
#[derive(Args, Clone, Debug)]
pub struct EngineArgs {
    /// Citation extraction engine executable
    #[arg(long, default_value = "citeExtract.pl")]
    pub engine: PathBuf,

    /// Extra argument passed to the engine before the document path (repeatable)
    #[arg(long = "engine-arg", allow_hyphen_values = true)]
    pub engine_args: Vec<String>,

    /// Format of the engine's output
    #[arg(long, value_enum, default_value_t = EngineFormat::Xml)]
    pub engine_format: EngineFormat,

    /// Worker threads (0 = one per CPU core)
    #[arg(short, long, default_value = "0")]
    pub threads: usize,

    /// Stop starting new documents after the first failure
    #[arg(long, default_value = "false")]
    pub fail_fast: bool,

    /// Show a progress bar
    #[arg(long, default_value = "false")]
    pub progress: bool,

    /// Logging level (DEBUG, INFO, WARN, ERROR, OFF)
    #[arg(short, long, default_value = "INFO")]
    pub log_level: String,
}

#[derive(Parser, Clone, Debug)]
pub struct ReplaceArgs {
    /// Documents to process
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Directory for rewritten documents (created if absent; default: working directory)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Suffix for rewritten documents: <stem>.<suffix>
    #[arg(long, default_value = "withIdents")]
    pub suffix: String,

    /// Also append each document's identifiers to this table
    #[arg(long)]
    pub corpus: Option<PathBuf>,

    /// Do not replace residual markers after the context pass
    #[arg(long, default_value = "false")]
    pub skip_markers: bool,

    #[command(flatten)]
    pub engine: EngineArgs,
}

#[derive(Parser, Clone, Debug)]
pub struct ResolveArgs {
    /// Documents to process
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Identifier table to append to
    #[arg(long, default_value = "corpus")]
    pub corpus: PathBuf,

    #[command(flatten)]
    pub engine: EngineArgs,
}

#[derive(Parser, Clone, Debug)]
pub struct IdentifyArgs {
    /// Author text (the first author token is used)
    #[arg(short, long, default_value = "")]
    pub author: String,

    /// Date text (a year or any text containing one)
    #[arg(short, long, default_value = "")]
    pub date: String,

    /// Title, booktitle or journal text
    #[arg(short = 'T', long, default_value = "")]
    pub title: String,
}
