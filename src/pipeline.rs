use anyhow::{anyhow, Context, Result};
use log::{debug, error, info, warn};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::cite::{collect, substitute, SubstitutionOptions};
use crate::common::{
    create_document_progress_bar, derive_output_path, document_stem, write_atomically,
    DocumentReport, ProcessingStats, RunStats,
};
use crate::corpus::CorpusWriter;
use crate::engine::CitationSource;

/// Per-run settings for the document pipeline
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Write the rewritten document; when false only identifiers are collected
    pub rewrite: bool,
    pub output_dir: Option<PathBuf>,
    pub suffix: String,
    pub substitution: SubstitutionOptions,
    /// Skip documents not yet started once one has failed
    pub fail_fast: bool,
    pub show_progress: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            rewrite: true,
            output_dir: None,
            suffix: "withIdents".to_string(),
            substitution: SubstitutionOptions::default(),
            fail_fast: false,
            show_progress: false,
        }
    }
}

/// Extract, collect and (optionally) rewrite a single document
pub fn process_document<S: CitationSource + ?Sized>(
    document: &Path,
    source: &S,
    options: &PipelineOptions,
) -> Result<DocumentReport> {
    debug!("Processing {}", document.display());

    let citations = source
        .citations(document)
        .with_context(|| format!("Citation extraction failed for {}", document.display()))?;
    let collection = collect(&citations);

    if collection.records_skipped > 0 {
        debug!(
            "{}: skipped {} of {} citations without enough data",
            document.display(),
            collection.records_skipped,
            collection.records_seen
        );
    }

    let output = if options.rewrite {
        let text = fs::read_to_string(document)
            .with_context(|| format!("Failed to read document: {}", document.display()))?;
        let rewritten = substitute(&text, &collection.index, &options.substitution);
        let output_path = derive_output_path(document, options.output_dir.as_deref(), &options.suffix)?;
        write_atomically(&output_path, &rewritten)?;
        Some(output_path)
    } else {
        None
    };

    Ok(DocumentReport {
        document: document.to_path_buf(),
        output,
        records_seen: collection.records_seen,
        records_skipped: collection.records_skipped,
        identifiers: collection
            .identifiers
            .into_iter()
            .map(|id| id.into_string())
            .collect(),
    })
}

fn append_corpus_line(corpus: &CorpusWriter, report: &DocumentReport) -> Result<()> {
    let stem = document_stem(&report.document)?;
    corpus.append(&stem, &report.identifiers)
}

/// Assign each output path to the first document that derives it.
///
/// Entry `i` holds the document that already claimed document `i`'s output
/// path. Paths that cannot be derived are left to `process_document` to report.
fn claim_output_paths(documents: &[PathBuf], options: &PipelineOptions) -> Vec<Option<PathBuf>> {
    let mut claimed: HashMap<PathBuf, &PathBuf> = HashMap::new();
    documents
        .iter()
        .map(|document| {
            let output = derive_output_path(document, options.output_dir.as_deref(), &options.suffix).ok()?;
            match claimed.get(&output) {
                Some(owner) => Some((*owner).clone()),
                None => {
                    claimed.insert(output, document);
                    None
                }
            }
        })
        .collect()
}

/// Process every document in parallel on the current rayon pool.
///
/// A failure is confined to its document: it is logged and counted, and the
/// remaining documents are still attempted unless `fail_fast` is set.
pub fn run_batch<S: CitationSource + ?Sized>(
    documents: &[PathBuf],
    source: &S,
    options: &PipelineOptions,
    corpus: Option<CorpusWriter>,
) -> Result<RunStats> {
    let stats = ProcessingStats::new();
    let stop = AtomicBool::new(false);
    let failed = Mutex::new(Vec::new());
    let progress = create_document_progress_bar(documents.len(), options.show_progress);
    let owners = if options.rewrite {
        claim_output_paths(documents, options)
    } else {
        vec![None; documents.len()]
    };

    documents.par_iter().zip(owners.par_iter()).for_each(|(document, owner)| {
        if stop.load(Ordering::Relaxed) {
            stats.record_skip();
            progress.inc(1);
            return;
        }

        let result = match owner {
            Some(owner) => Err(anyhow!(
                "Output path is already claimed by {}",
                owner.display()
            )),
            None => process_document(document, source, options),
        }
        .and_then(|report| {
            if let Some(corpus) = corpus.as_ref() {
                append_corpus_line(corpus, &report)?;
            }
            Ok(report)
        });

        match result {
            Ok(report) => {
                match report.output.as_ref() {
                    Some(output) => info!(
                        "OK {} -> {} ({} identifiers)",
                        document.display(),
                        output.display(),
                        report.identifiers.len()
                    ),
                    None => info!("OK {} ({} identifiers)", document.display(), report.identifiers.len()),
                }
                stats.record_success(&report);
            }
            Err(e) => {
                error!("FAILED {}: {:#}", document.display(), e);
                stats.record_failure();
                if let Ok(mut failed) = failed.lock() {
                    failed.push(document.clone());
                }
                if options.fail_fast {
                    stop.store(true, Ordering::Relaxed);
                }
            }
        }
        progress.inc(1);
    });

    progress.finish_and_clear();

    let corpus_lines = match corpus {
        Some(corpus) => {
            let path = corpus.path().to_path_buf();
            let lines = corpus.finish()?;
            info!("Appended {} lines to {}", lines, path.display());
            lines
        }
        None => 0,
    };

    let mut failed_documents = failed.into_inner().unwrap_or_default();
    failed_documents.sort();

    let run_stats = stats.to_run_stats(documents.len(), corpus_lines, failed_documents);
    if run_stats.documents_skipped > 0 {
        warn!(
            "Skipped {} documents after a failure (fail-fast)",
            run_stats.documents_skipped
        );
    }

    Ok(run_stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RawCitation;
    use tempfile::tempdir;

    /// Engine stub answering from a fixed table keyed by file name
    struct StubSource;

    impl CitationSource for StubSource {
        fn citations(&self, document: &Path) -> Result<Vec<RawCitation>> {
            let name = document.file_name().unwrap().to_string_lossy().to_string();
            match name.as_str() {
                "broken.txt" => Err(anyhow!("engine exited with status 2")),
                _ => Ok(vec![
                    RawCitation {
                        valid: true,
                        authors: vec!["Smith, J.".to_string()],
                        title: Some("Deep Learning Systems".to_string()),
                        date: Some("2020".to_string()),
                        marker: Some("[1]".to_string()),
                        raw_string: Some("J. Smith. Deep Learning Systems.".to_string()),
                        contexts: vec!["[1]".to_string()],
                        ..RawCitation::default()
                    },
                    RawCitation {
                        valid: false,
                        raw_string: Some("noise".to_string()),
                        ..RawCitation::default()
                    },
                ]),
            }
        }
    }

    #[test]
    fn test_process_document_rewrites_text() {
        let dir = tempdir().unwrap();
        let doc = dir.path().join("paper.txt");
        fs::write(&doc, "As shown in [1].\n\nReferences\nJ. Smith. Deep Learning Systems.\n").unwrap();

        let options = PipelineOptions {
            output_dir: Some(dir.path().join("out")),
            ..PipelineOptions::default()
        };
        let report = process_document(&doc, &StubSource, &options).unwrap();

        let output = report.output.unwrap();
        assert_eq!(output, dir.path().join("out").join("paper.withIdents"));
        assert_eq!(
            fs::read_to_string(output).unwrap(),
            "As shown in @smith2020deep.\n\nReferences\n@smith2020deep. J. Smith. Deep Learning Systems.\n"
        );
        assert_eq!(report.records_seen, 2);
        assert_eq!(report.records_skipped, 1);
        assert_eq!(report.identifiers, vec!["@smith2020deep"]);
    }

    #[test]
    fn test_batch_isolates_failures_and_writes_corpus() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.txt");
        let broken = dir.path().join("broken.txt");
        let missing = dir.path().join("missing.txt");
        fs::write(&good, "cite [1]").unwrap();
        fs::write(&broken, "cite [1]").unwrap();

        let corpus_path = dir.path().join("corpus");
        let corpus = CorpusWriter::open(&corpus_path, 8).unwrap();
        let options = PipelineOptions {
            output_dir: Some(dir.path().join("out")),
            ..PipelineOptions::default()
        };

        let documents = vec![good.clone(), broken.clone(), missing.clone()];
        let stats = run_batch(&documents, &StubSource, &options, Some(corpus)).unwrap();

        assert_eq!(stats.documents_total, 3);
        assert_eq!(stats.documents_succeeded, 1);
        assert_eq!(stats.documents_failed, 2);
        assert_eq!(stats.corpus_lines, 1);
        let mut expected_failed = vec![broken, missing];
        expected_failed.sort();
        assert_eq!(stats.failed_documents, expected_failed);

        assert!(dir.path().join("out").join("good.withIdents").exists());
        assert!(!dir.path().join("out").join("broken.withIdents").exists());
        assert_eq!(fs::read_to_string(corpus_path).unwrap(), "good @smith2020deep\n");
    }

    #[test]
    fn test_same_stem_documents_do_not_share_an_artifact() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a")).unwrap();
        fs::create_dir_all(dir.path().join("b")).unwrap();
        let first = dir.path().join("a").join("paper.txt");
        let second = dir.path().join("b").join("paper.txt");
        fs::write(&first, "AAA [1]").unwrap();
        fs::write(&second, "BBB [1]").unwrap();

        let options = PipelineOptions {
            output_dir: Some(dir.path().join("out")),
            ..PipelineOptions::default()
        };
        let documents = vec![first, second.clone()];
        let stats = run_batch(&documents, &StubSource, &options, None).unwrap();

        assert_eq!(stats.documents_succeeded, 1);
        assert_eq!(stats.documents_failed, 1);
        assert_eq!(stats.failed_documents, vec![second]);
        assert_eq!(
            fs::read_to_string(dir.path().join("out").join("paper.withIdents")).unwrap(),
            "AAA @smith2020deep"
        );
    }

    #[test]
    fn test_same_stem_is_fine_without_rewrite() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a")).unwrap();
        fs::create_dir_all(dir.path().join("b")).unwrap();
        let documents = vec![
            dir.path().join("a").join("paper.txt"),
            dir.path().join("b").join("paper.txt"),
        ];

        let options = PipelineOptions {
            rewrite: false,
            ..PipelineOptions::default()
        };
        let stats = run_batch(&documents, &StubSource, &options, None).unwrap();
        assert_eq!(stats.documents_succeeded, 2);
        assert_eq!(stats.documents_failed, 0);
    }

    #[test]
    fn test_fail_fast_skips_remaining_documents() {
        let dir = tempdir().unwrap();
        let broken = dir.path().join("broken.txt");
        let good1 = dir.path().join("good1.txt");
        let good2 = dir.path().join("good2.txt");
        for doc in [&broken, &good1, &good2] {
            fs::write(doc, "cite [1]").unwrap();
        }

        let options = PipelineOptions {
            output_dir: Some(dir.path().join("out")),
            fail_fast: true,
            ..PipelineOptions::default()
        };
        let documents = vec![broken.clone(), good1, good2];

        // One worker so documents are taken strictly in order
        let pool = rayon::ThreadPoolBuilder::new().num_threads(1).build().unwrap();
        let stats = pool
            .install(|| run_batch(&documents, &StubSource, &options, None))
            .unwrap();

        assert_eq!(stats.documents_total, 3);
        assert_eq!(stats.documents_failed, 1);
        assert_eq!(stats.documents_skipped, 2);
        assert_eq!(stats.documents_succeeded, 0);
        assert_eq!(stats.failed_documents, vec![broken]);
        assert!(!dir.path().join("out").join("good1.withIdents").exists());
        assert!(!dir.path().join("out").join("good2.withIdents").exists());
    }

    #[test]
    fn test_collect_only_writes_no_artifact() {
        let dir = tempdir().unwrap();
        let doc = dir.path().join("paper.txt");
        fs::write(&doc, "cite [1]").unwrap();

        let options = PipelineOptions {
            rewrite: false,
            output_dir: Some(dir.path().join("out")),
            ..PipelineOptions::default()
        };
        let report = process_document(&doc, &StubSource, &options).unwrap();
        assert!(report.output.is_none());
        assert!(!dir.path().join("out").exists());
    }
}
