use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Outcome of one document
#[derive(Debug, Clone)]
pub struct DocumentReport {
    pub document: PathBuf,
    pub output: Option<PathBuf>,
    pub records_seen: usize,
    pub records_skipped: usize,
    pub identifiers: Vec<String>,
}

/// Counters shared by the document workers
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub documents_succeeded: AtomicUsize,
    pub documents_failed: AtomicUsize,
    pub documents_skipped: AtomicUsize,
    pub records_seen: AtomicUsize,
    pub records_skipped: AtomicUsize,
    pub identifiers: AtomicUsize,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, report: &DocumentReport) {
        self.documents_succeeded.fetch_add(1, Ordering::Relaxed);
        self.records_seen.fetch_add(report.records_seen, Ordering::Relaxed);
        self.records_skipped.fetch_add(report.records_skipped, Ordering::Relaxed);
        self.identifiers.fetch_add(report.identifiers.len(), Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.documents_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skip(&self) {
        self.documents_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn to_run_stats(
        &self,
        documents_total: usize,
        corpus_lines: usize,
        failed_documents: Vec<PathBuf>,
    ) -> RunStats {
        RunStats {
            documents_total,
            documents_succeeded: self.documents_succeeded.load(Ordering::Relaxed),
            documents_failed: self.documents_failed.load(Ordering::Relaxed),
            documents_skipped: self.documents_skipped.load(Ordering::Relaxed),
            records_seen: self.records_seen.load(Ordering::Relaxed),
            records_skipped: self.records_skipped.load(Ordering::Relaxed),
            identifiers: self.identifiers.load(Ordering::Relaxed),
            corpus_lines,
            failed_documents,
        }
    }
}

/// Statistics from a batch run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    pub documents_total: usize,
    pub documents_succeeded: usize,
    pub documents_failed: usize,
    pub documents_skipped: usize,
    pub records_seen: usize,
    pub records_skipped: usize,
    pub identifiers: usize,
    pub corpus_lines: usize,
    pub failed_documents: Vec<PathBuf>,
}
