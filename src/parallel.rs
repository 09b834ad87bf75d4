//! Parallel Batch Scanning
//!
//! Uses Rayon to scan independent files at once. Each file gets its own
//! token source, scope tracker and store; nothing is shared between scans.

use crate::config::ScanOptions;
use crate::error::ScanError;
use crate::graph::{DocumentId, GraphStore};
use crate::scan_file;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// What happened to one file of a batch
#[derive(Debug)]
pub enum FileOutcome<G> {
    /// Converted; the store holds the document graph
    Scanned { document: DocumentId, store: G },
    /// Rejected by [`ScanOptions::accepts`]
    Skipped,
}

/// Per-file result of [`scan_files`]
#[derive(Debug)]
pub struct FileReport<G> {
    pub path: PathBuf,
    pub outcome: Result<FileOutcome<G>, ScanError>,
}

impl<G> FileReport<G> {
    pub fn is_scanned(&self) -> bool {
        matches!(self.outcome, Ok(FileOutcome::Scanned { .. }))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, Ok(FileOutcome::Skipped))
    }
}

/// Scan files in parallel, one fresh store per file from `make_store`.
///
/// Reports come back in the order of `paths`. A failed file does not stop
/// the batch; its store is dropped with whatever it held.
pub fn scan_files<P, G, F>(paths: &[P], options: &ScanOptions, make_store: F) -> Vec<FileReport<G>>
where
    P: AsRef<Path> + Sync,
    G: GraphStore + Send,
    F: Fn(&Path) -> G + Sync,
{
    let reports: Vec<FileReport<G>> = paths
        .par_iter()
        .map(|path| scan_one(path.as_ref(), options, &make_store))
        .collect();

    let failed = reports.iter().filter(|r| r.outcome.is_err()).count();
    let skipped = reports.iter().filter(|r| r.is_skipped()).count();
    debug!(files = reports.len(), failed, skipped, "batch scan finished");
    reports
}

fn scan_one<G, F>(path: &Path, options: &ScanOptions, make_store: &F) -> FileReport<G>
where
    G: GraphStore,
    F: Fn(&Path) -> G,
{
    if !options.accepts(path) {
        debug!(path = %path.display(), "skipping file");
        return FileReport {
            path: path.to_path_buf(),
            outcome: Ok(FileOutcome::Skipped),
        };
    }

    let mut store = make_store(path);
    let outcome = match scan_file(path, &mut store, options) {
        Ok(document) => Ok(FileOutcome::Scanned { document, store }),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "scan failed");
            Err(err)
        }
    };
    FileReport {
        path: path.to_path_buf(),
        outcome,
    }
}
