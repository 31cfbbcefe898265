//! Publishing stored images to an S3-compatible object store.
//!
//! The pipeline core never talks to the store; the CLI hands the success
//! subset to [`upload_rows`] with an [`Uploader`] built from config.

mod s3;
mod sigv4;

pub use s3::S3Uploader;

use std::path::{Path, PathBuf};

use crate::table::{Table, UploadOutcome};

/// Upload failure; always recorded on the row as text.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no object name for {}", .0.display())]
    InvalidKey(PathBuf),
    #[error("{0}")]
    Curl(#[from] curl::Error),
    #[error("HTTP {status}: {body}")]
    Http { status: u32, body: String },
    #[error("request signing failed: {0}")]
    Signing(String),
}

/// Upload strategy: stores a local file and returns its public URL.
pub trait Uploader {
    /// One-time setup before the first upload of a batch (e.g. bucket creation).
    fn prepare(&self) -> Result<(), UploadError> {
        Ok(())
    }

    fn upload(&self, path: &Path) -> Result<String, UploadError>;
}

/// Counts from [`upload_rows`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub uploaded: usize,
    pub failed: usize,
    /// Rows without a local image.
    pub skipped: usize,
}

/// Uploads the image of every row that has one, recording URL or error per row.
///
/// A failed [`Uploader::prepare`] fails every row with an image, with the
/// same cause; it never aborts the batch.
pub fn upload_rows(table: &mut Table, uploader: &dyn Uploader) -> UploadSummary {
    let mut summary = UploadSummary::default();
    if let Err(e) = uploader.prepare() {
        tracing::warn!("upload setup failed, no image will be uploaded: {}", e);
        let cause = e.to_string();
        for row in table.rows_mut() {
            if row.local_path().is_some() {
                row.set_upload(UploadOutcome::Failed(cause.clone()));
                summary.failed += 1;
            } else {
                summary.skipped += 1;
            }
        }
        return summary;
    }

    for row in table.rows_mut() {
        let Some(path) = row.local_path().map(Path::to_path_buf) else {
            summary.skipped += 1;
            continue;
        };
        match uploader.upload(&path) {
            Ok(url) => {
                tracing::info!(row = %row.name, url = %url, "image uploaded");
                row.set_upload(UploadOutcome::Uploaded(url));
                summary.uploaded += 1;
            }
            Err(e) => {
                tracing::warn!(row = %row.name, path = %path.display(), "upload failed: {}", e);
                row.set_upload(UploadOutcome::Failed(e.to_string()));
                summary.failed += 1;
            }
        }
    }
    summary
}
