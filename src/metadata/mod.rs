pub mod commands;
pub mod extract;
pub mod model;
pub mod reconcile;
pub mod report;

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use walkdir::WalkDir;

use crate::utils::{has_valid_extension, verbose_println};
use self::reconcile::Reconciliation;

#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    pub extensions: Vec<String>,
    pub verbose: bool,
    pub parallel_jobs: usize,
}

/// Result of checking one sidecar file.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    /// The sidecar that was parsed.
    pub sidecar: PathBuf,
    /// The image file the corrective commands target.
    pub image: PathBuf,
    pub reconciliation: Reconciliation,
}

/// Batch driver for the reconciler: discovers sidecars, checks them in
/// parallel, and hands deterministic per-file outcomes to the report writer.
pub struct ReconcileEngine {
    config: ReconcileConfig,
}

impl ReconcileEngine {
    pub fn new(config: ReconcileConfig) -> Result<Self> {
        // Initialize thread pool with specified number of jobs
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_jobs)
            .build_global()
            .context("Failed to initialize thread pool")?;

        Ok(Self { config })
    }

    /// Discover all sidecar files in the input paths. Single files are
    /// accepted directly; directories are walked recursively. The result is
    /// sorted so batch output order is stable across runs.
    pub fn discover_sidecars(&self, input_paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut sidecar_files = Vec::new();

        for input_path in input_paths {
            verbose_println(
                self.config.verbose,
                &format!("Scanning: {}", input_path.display()),
            );

            let walker = WalkDir::new(input_path).follow_links(false).max_depth(10);

            for entry in walker {
                let entry = entry.context("Failed to read directory entry")?;
                let path = entry.path();

                if path.is_file() && has_valid_extension(path, &self.config.extensions) {
                    sidecar_files.push(path.to_path_buf());
                }
            }
        }

        sidecar_files.sort();

        verbose_println(
            self.config.verbose,
            &format!("Found {} sidecar files", sidecar_files.len()),
        );
        Ok(sidecar_files)
    }

    /// Check a batch of sidecars with a progress callback. Per-file failures
    /// (unreadable or unparsable sidecars) are collected, never fatal for
    /// the batch. Output order matches input order.
    pub fn process_batch<F>(
        &self,
        sidecar_files: &[PathBuf],
        progress_callback: F,
    ) -> Vec<Result<FileOutcome>>
    where
        F: Fn(usize) + Send + Sync,
    {
        let processed_count = AtomicUsize::new(0);

        sidecar_files
            .par_iter()
            .map(|sidecar| {
                let result = self.check_single_file(sidecar);

                let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;
                progress_callback(count);

                result
            })
            .collect()
    }

    fn check_single_file(&self, sidecar: &Path) -> Result<FileOutcome> {
        let metadata = extract::load_sidecar(sidecar)?;
        let reconciliation = reconcile::reconcile(&metadata);

        Ok(FileOutcome {
            sidecar: sidecar.to_path_buf(),
            image: metadata.path,
            reconciliation,
        })
    }
}
