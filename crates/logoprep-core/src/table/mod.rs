//! Row and table model.
//!
//! A [`Table`] is the ordered set of input records for one pipeline run.
//! Each [`Row`] keeps its original columns verbatim and carries an outcome:
//! either a saved local image or a row-scoped error, never both.

mod columns;
mod csv_io;
mod partition;

pub use columns::{Schema, ERROR_COLUMN, LOCAL_PATH_COLUMN, S3_URL_COLUMN};
pub use csv_io::{read_table, write_table};
pub use partition::Partitioned;

use std::path::{Path, PathBuf};

/// Why a row has no local image. The `Display` form is what lands in the `error` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RowError {
    /// Missing or malformed image URL.
    #[error("ImageUrlError")]
    ImageUrlError,
    /// The response was not an image.
    #[error("FileExtensionError")]
    FileExtensionError,
    /// Network, timeout, HTTP status or local write failure.
    #[error("ImageDownloadError")]
    ImageDownloadError,
}

impl RowError {
    /// Parses the `error` column tag back into a `RowError`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim() {
            "ImageUrlError" => Some(RowError::ImageUrlError),
            "FileExtensionError" => Some(RowError::FileExtensionError),
            "ImageDownloadError" => Some(RowError::ImageDownloadError),
            _ => None,
        }
    }
}

/// Processing state of a row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RowOutcome {
    /// Not processed yet.
    #[default]
    Pending,
    /// Image stored at this path.
    Saved(PathBuf),
    Failed(RowError),
}

/// Result of publishing a row's image to the object store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Public URL of the uploaded object.
    Uploaded(String),
    /// Upload failed; the cause as text.
    Failed(String),
}

/// One input record describing an organization and its logo source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub name: String,
    /// Empty when the source had no URL.
    pub image_url: String,
    /// Free-text base for the local file name.
    pub filename: String,
    /// Original columns, in input order, excluding output columns.
    pub(crate) record: Vec<String>,
    outcome: RowOutcome,
    upload: Option<UploadOutcome>,
}

impl Row {
    /// Builds a row whose original record is `[name, image_url, filename]`.
    pub fn new(
        name: impl Into<String>,
        image_url: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let image_url = image_url.into();
        let filename = filename.into();
        let record = vec![name.clone(), image_url.clone(), filename.clone()];
        Self::from_record(name, image_url, filename, record)
    }

    pub(crate) fn from_record(
        name: String,
        image_url: String,
        filename: String,
        record: Vec<String>,
    ) -> Self {
        Self {
            name,
            image_url,
            filename,
            record,
            outcome: RowOutcome::Pending,
            upload: None,
        }
    }

    /// Original column values.
    pub fn record(&self) -> &[String] {
        &self.record
    }

    pub fn outcome(&self) -> &RowOutcome {
        &self.outcome
    }

    /// Path of the stored image, if the row succeeded.
    pub fn local_path(&self) -> Option<&Path> {
        match &self.outcome {
            RowOutcome::Saved(p) => Some(p.as_path()),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<RowError> {
        match self.outcome {
            RowOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, RowOutcome::Saved(_))
    }

    /// Records a stored image. Clears any previous error.
    pub fn mark_saved(&mut self, path: PathBuf) {
        self.outcome = RowOutcome::Saved(path);
    }

    /// Records a failure. Clears any previous local path.
    pub fn mark_failed(&mut self, error: RowError) {
        self.outcome = RowOutcome::Failed(error);
    }

    pub(crate) fn restore_outcome(&mut self, outcome: RowOutcome) {
        self.outcome = outcome;
    }

    pub fn upload(&self) -> Option<&UploadOutcome> {
        self.upload.as_ref()
    }

    pub fn set_upload(&mut self, upload: UploadOutcome) {
        self.upload = Some(upload);
    }
}

/// Ordered rows sharing one schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// Original header row (without output columns); None for header-less input.
    headers: Option<Vec<String>>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(headers: Option<Vec<String>>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Table with the canonical `name,image_url,filename` header.
    pub fn with_default_headers() -> Self {
        Self::new(Some(vec![
            "name".to_string(),
            "image_url".to_string(),
            "filename".to_string(),
        ]))
    }

    /// Empty table with the same headers as `self`.
    pub fn empty_like(&self) -> Self {
        Self::new(self.headers.clone())
    }

    pub fn headers(&self) -> Option<&[String]> {
        self.headers.as_deref()
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [Row] {
        &mut self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether any row carries an upload outcome (decides the `s3_url` column).
    pub fn has_uploads(&self) -> bool {
        self.rows.iter().any(|r| r.upload.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_error_tags_roundtrip() {
        for e in [
            RowError::ImageUrlError,
            RowError::FileExtensionError,
            RowError::ImageDownloadError,
        ] {
            assert_eq!(RowError::from_tag(&e.to_string()), Some(e));
        }
        assert_eq!(RowError::from_tag(""), None);
        assert_eq!(RowError::from_tag("404 - Image not available"), None);
    }

    #[test]
    fn outcome_never_has_both_path_and_error() {
        let mut row = Row::new("Acme", "https://x/logo.png", "acme");
        assert!(row.local_path().is_none());
        assert!(row.error().is_none());

        row.mark_failed(RowError::ImageDownloadError);
        assert!(row.local_path().is_none());
        assert_eq!(row.error(), Some(RowError::ImageDownloadError));

        row.mark_saved(PathBuf::from("images/acme.png"));
        assert_eq!(row.local_path(), Some(Path::new("images/acme.png")));
        assert!(row.error().is_none());
        assert!(row.is_success());
    }

    #[test]
    fn new_row_record_is_canonical_columns() {
        let row = Row::new("Acme", "", "acme");
        assert_eq!(row.record(), ["Acme", "", "acme"]);
    }

    #[test]
    fn has_uploads_tracks_rows() {
        let mut table = Table::with_default_headers();
        table.push(Row::new("a", "", "a"));
        assert!(!table.has_uploads());
        table.rows_mut()[0].set_upload(UploadOutcome::Failed("boom".into()));
        assert!(table.has_uploads());
    }
}
