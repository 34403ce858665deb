use anyhow::Result;
use citex::common::{setup_logging, RunStats};
use citex::corpus::CorpusWriter;
use citex::pipeline::{run_batch, PipelineOptions};
use log::info;
use std::time::Instant;

use super::{check_failures, log_summary, prepare_engine};
use crate::cli::ResolveArgs;

/// Run the resolve command: identifiers only, appended to the corpus table
pub fn run_resolve(args: ResolveArgs) -> Result<RunStats> {
    let start_time = Instant::now();

    setup_logging(&args.engine.log_level)?;

    info!("Starting citation resolution");
    info!("Documents: {}", args.paths.len());
    info!("Corpus table: {}", args.corpus.display());

    let engine = prepare_engine(&args.engine);
    let corpus = CorpusWriter::open(&args.corpus, args.paths.len().min(1024))?;

    let options = PipelineOptions {
        rewrite: false,
        fail_fast: args.engine.fail_fast,
        show_progress: args.engine.progress,
        ..PipelineOptions::default()
    };

    let stats = run_batch(&args.paths, &engine, &options, Some(corpus))?;

    log_summary(&stats, start_time.elapsed());
    check_failures(&stats)?;

    Ok(stats)
}
