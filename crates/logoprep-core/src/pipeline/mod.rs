//! Row pipeline: fetch → validate → store → normalize → record.
//!
//! Rows are processed strictly one at a time, in table order. Every failure
//! is recorded on the row and the pass moves on; nothing is retried. The
//! output table is built incrementally so an aborted pass still yields the
//! rows completed so far.

use anyhow::Result;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::fetch::Fetcher;
use crate::naming::image_base_name;
use crate::normalize::{Geometry, Normalizer};
use crate::storage::ImageStore;
use crate::table::{Row, RowError, Table};

/// Canonical-format step applied after a row's image is stored.
struct Normalization<'a> {
    normalizer: &'a dyn Normalizer,
    target_ext: String,
    geometry: Geometry,
}

/// Counts for one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Rows in the input table.
    pub total: usize,
    pub saved: usize,
    pub failed: usize,
    /// True if the pass stopped before the last row.
    pub aborted: bool,
}

impl RunSummary {
    pub fn processed(&self) -> usize {
        self.saved + self.failed
    }
}

/// Output of [`Pipeline::run`]: processed rows (all of them unless aborted) and counts.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub table: Table,
    pub summary: RunSummary,
}

/// Sequential row processor with injectable fetch and normalize strategies.
pub struct Pipeline<'a> {
    fetcher: &'a dyn Fetcher,
    store: ImageStore,
    normalization: Option<Normalization<'a>>,
    abort: Option<Arc<AtomicBool>>,
}

impl<'a> Pipeline<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, store: ImageStore) -> Self {
        Self {
            fetcher,
            store,
            normalization: None,
            abort: None,
        }
    }

    /// Converts every stored image whose extension differs from `target_ext`.
    pub fn with_normalizer(
        mut self,
        normalizer: &'a dyn Normalizer,
        target_ext: impl Into<String>,
        geometry: Geometry,
    ) -> Self {
        self.normalization = Some(Normalization {
            normalizer,
            target_ext: target_ext.into(),
            geometry,
        });
        self
    }

    /// Token checked between rows; once set, the pass stops and returns what it has.
    pub fn with_abort(mut self, token: Arc<AtomicBool>) -> Self {
        self.abort = Some(token);
        self
    }

    fn aborted(&self) -> bool {
        self.abort
            .as_ref()
            .is_some_and(|t| t.load(Ordering::Relaxed))
    }

    /// Processes every row of `input` in order.
    ///
    /// Only a missing or uncreatable image directory fails the whole pass.
    pub fn run(&self, input: Table) -> Result<RunReport> {
        self.store.ensure_dir()?;

        let mut output = input.empty_like();
        let mut summary = RunSummary {
            total: input.len(),
            ..Default::default()
        };

        for mut row in input.into_rows() {
            if self.aborted() {
                summary.aborted = true;
                tracing::warn!(
                    done = summary.processed(),
                    total = summary.total,
                    "pass interrupted; keeping completed rows"
                );
                break;
            }
            self.process_row(&mut row);
            if row.is_success() {
                summary.saved += 1;
            } else {
                summary.failed += 1;
            }
            output.push(row);
        }

        tracing::info!(
            saved = summary.saved,
            failed = summary.failed,
            total = summary.total,
            "pipeline pass finished"
        );
        Ok(RunReport {
            table: output,
            summary,
        })
    }

    /// Processes a single row, recording either its local path or its error.
    pub fn process_row(&self, row: &mut Row) {
        let _span = tracing::info_span!("row", name = %row.name).entered();
        match self.fetch_and_store(row) {
            Ok(path) => {
                tracing::info!(path = %path.display(), "image stored");
                row.mark_saved(path);
            }
            Err(e) => {
                tracing::info!(error = %e, url = %row.image_url, "row failed");
                row.mark_failed(e);
            }
        }
    }

    fn fetch_and_store(&self, row: &Row) -> Result<PathBuf, RowError> {
        let url = row.image_url.trim();
        if url.is_empty() {
            return Err(RowError::ImageUrlError);
        }

        let fetched = self.fetcher.fetch(url).map_err(|e| {
            tracing::warn!(url = %url, "fetch failed: {}", e);
            e.row_error()
        })?;

        let Some(ext) = fetched.extension() else {
            tracing::warn!(
                url = %url,
                content_type = fetched.content_type.as_deref().unwrap_or("<none>"),
                "response is not an image"
            );
            return Err(RowError::FileExtensionError);
        };
        if fetched.bytes.is_empty() {
            tracing::warn!(url = %url, "empty image body");
            return Err(RowError::ImageDownloadError);
        }

        let stem = image_base_name(&row.filename);
        let path = self.store.save(&stem, &ext, &fetched.bytes).map_err(|e| {
            tracing::warn!("saving image failed: {:#}", e);
            RowError::ImageDownloadError
        })?;

        Ok(self.normalize(path))
    }

    /// Failed conversion keeps the fetched file in its original format.
    fn normalize(&self, path: PathBuf) -> PathBuf {
        let Some(n) = &self.normalization else {
            return path;
        };
        match n.normalizer.normalize(&path, &n.target_ext, n.geometry) {
            Ok(new_path) => new_path,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    target = %n.target_ext,
                    "conversion failed, keeping original format: {}",
                    e
                );
                path
            }
        }
    }
}
