use anyhow::Result;
use citex::cite::SubstitutionOptions;
use citex::common::{setup_logging, RunStats};
use citex::corpus::CorpusWriter;
use citex::pipeline::{run_batch, PipelineOptions};
use log::info;
use std::time::Instant;

use super::{check_failures, log_summary, prepare_engine};
use crate::cli::ReplaceArgs;

/// Run the replace command with the given arguments
pub fn run_replace(args: ReplaceArgs) -> Result<RunStats> {
    let start_time = Instant::now();

    setup_logging(&args.engine.log_level)?;

    info!("Starting citation replacement");
    info!("Documents: {}", args.paths.len());
    match args.output_dir.as_ref() {
        Some(dir) => info!("Output directory: {}", dir.display()),
        None => info!("Output directory: working directory"),
    }
    if args.skip_markers {
        info!("Marker pass disabled; only context strings and raw strings are replaced");
    }

    let engine = prepare_engine(&args.engine);

    let corpus = match args.corpus.as_ref() {
        Some(path) => {
            info!("Corpus table: {}", path.display());
            Some(CorpusWriter::open(path, args.paths.len().min(1024))?)
        }
        None => None,
    };

    let options = PipelineOptions {
        rewrite: true,
        output_dir: args.output_dir.clone(),
        suffix: args.suffix.clone(),
        substitution: SubstitutionOptions {
            marker_pass: !args.skip_markers,
        },
        fail_fast: args.engine.fail_fast,
        show_progress: args.engine.progress,
    };

    let stats = run_batch(&args.paths, &engine, &options, corpus)?;

    log_summary(&stats, start_time.elapsed());
    check_failures(&stats)?;

    Ok(stats)
}
