pub mod identify;
pub mod replace;
pub mod resolve;

pub use identify::run_identify;
pub use replace::run_replace;
pub use resolve::run_resolve;

use anyhow::{bail, Result};
use citex::common::{format_elapsed, RunStats};
use citex::engine::ParsCitEngine;
use log::{error, info};
use std::time::Duration;

use crate::cli::EngineArgs;

/// Build the engine and size the global rayon pool
fn prepare_engine(args: &EngineArgs) -> ParsCitEngine {
    let num_threads = if args.threads == 0 {
        let cores = num_cpus::get();
        info!("Auto-detected {} CPU cores. Using {} threads.", cores, cores);
        cores
    } else {
        info!("Using specified {} threads.", args.threads);
        args.threads
    };

    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
    {
        error!("Failed to build thread pool: {}. Using default.", e);
    }

    info!("Citation engine: {}", args.engine.display());

    ParsCitEngine::new(&args.engine)
        .with_args(args.engine_args.clone())
        .with_format(args.engine_format)
}

fn log_summary(stats: &RunStats, elapsed: Duration) {
    info!("==================== FINAL SUMMARY ====================");
    info!("Total execution time: {}", format_elapsed(elapsed));
    info!("Documents: {}", stats.documents_total);
    info!("  Succeeded: {}", stats.documents_succeeded);
    info!("  Failed: {}", stats.documents_failed);
    if stats.documents_skipped > 0 {
        info!("  Not attempted: {}", stats.documents_skipped);
    }
    info!("Citations reported by engine: {}", stats.records_seen);
    info!("Citations skipped (not enough data): {}", stats.records_skipped);
    info!("Distinct identifiers per document, summed: {}", stats.identifiers);
    if stats.corpus_lines > 0 {
        info!("Corpus lines appended: {}", stats.corpus_lines);
    }
    for failed in &stats.failed_documents {
        info!("  Failed: {}", failed.display());
    }
    info!("========================================================");
}

/// Turn per-document failures into a non-zero exit once the batch is done
fn check_failures(stats: &RunStats) -> Result<()> {
    if stats.documents_failed > 0 {
        bail!(
            "{} of {} documents failed",
            stats.documents_failed,
            stats.documents_total
        );
    }
    Ok(())
}
