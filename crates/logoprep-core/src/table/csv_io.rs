//! CSV reader/writer for tables.

use anyhow::{Context, Result};
use std::io;
use std::path::{Path, PathBuf};

use super::columns::{Schema, ERROR_COLUMN, LOCAL_PATH_COLUMN, S3_URL_COLUMN};
use super::{Row, RowError, RowOutcome, Table, UploadOutcome};

/// Prefix for failed uploads in the `s3_url` column.
const UPLOAD_ERROR_PREFIX: &str = "ERROR - ";

/// Reads a table from a CSV file.
///
/// With `has_header`, columns are located by name; output columns from a
/// previous run are folded back into each row's outcome. Without it, the
/// positional layout `Organization | Logo URL | Filename` is assumed.
pub fn read_table(path: &Path, has_header: bool) -> Result<Table> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open table {}", path.display()))?;
    read_from(file, has_header).with_context(|| format!("failed to read table {}", path.display()))
}

pub(crate) fn read_from<R: io::Read>(reader: R, has_header: bool) -> Result<Table> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(has_header)
        .flexible(true)
        .trim(csv::Trim::None)
        .from_reader(reader);

    let (schema, headers) = if has_header {
        let raw: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let schema = Schema::from_headers(&raw)?;
        let kept = raw
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !schema.is_output_column(*i))
            .map(|(_, h)| h)
            .collect();
        (schema, Some(kept))
    } else {
        (Schema::positional(), None)
    };

    let mut table = Table::new(headers);
    for (line, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("bad CSV record #{}", line + 1))?;
        table.push(row_from_record(&schema, &record));
    }
    tracing::debug!(rows = table.len(), "table read");
    Ok(table)
}

fn row_from_record(schema: &Schema, record: &csv::StringRecord) -> Row {
    let field = |idx: usize| record.get(idx).unwrap_or("").to_string();

    let name = field(schema.name);
    let image_url = field(schema.image_url).trim().to_string();
    let filename = schema
        .filename
        .map(field)
        .filter(|f| !f.trim().is_empty())
        .unwrap_or_else(|| name.clone());

    let original: Vec<String> = record
        .iter()
        .enumerate()
        .filter(|(i, _)| !schema.is_output_column(*i))
        .map(|(_, v)| v.to_string())
        .collect();

    let mut row = Row::from_record(name, image_url, filename, original);

    let local_path = schema.local_path.map(field).unwrap_or_default();
    let error = schema.error.map(field).unwrap_or_default();
    if !local_path.trim().is_empty() {
        row.restore_outcome(RowOutcome::Saved(PathBuf::from(local_path.trim())));
    } else if let Some(e) = RowError::from_tag(&error) {
        row.restore_outcome(RowOutcome::Failed(e));
    }

    if let Some(s3) = schema.s3_url.map(field) {
        let s3 = s3.trim();
        if let Some(cause) = s3.strip_prefix(UPLOAD_ERROR_PREFIX) {
            row.set_upload(UploadOutcome::Failed(cause.to_string()));
        } else if !s3.is_empty() {
            row.set_upload(UploadOutcome::Uploaded(s3.to_string()));
        }
    }

    row
}

/// Writes a table: original columns followed by `local_path`, `error`
/// and, when any row was uploaded, `s3_url`.
pub fn write_table(path: &Path, table: &Table) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create table {}", path.display()))?;
    write_to(file, table).with_context(|| format!("failed to write table {}", path.display()))?;
    tracing::info!(rows = table.len(), path = %path.display(), "table written");
    Ok(())
}

pub(crate) fn write_to<W: io::Write>(writer: W, table: &Table) -> Result<()> {
    let with_uploads = table.has_uploads();
    let width = match table.headers() {
        Some(h) => h.len(),
        None => table.rows().iter().map(|r| r.record.len()).max().unwrap_or(0),
    };

    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    if let Some(headers) = table.headers() {
        let mut out: Vec<&str> = headers.iter().map(String::as_str).collect();
        out.push(LOCAL_PATH_COLUMN);
        out.push(ERROR_COLUMN);
        if with_uploads {
            out.push(S3_URL_COLUMN);
        }
        wtr.write_record(&out)?;
    }

    for row in table.rows() {
        let mut out: Vec<String> = Vec::with_capacity(width + 3);
        out.extend(row.record.iter().take(width).cloned());
        out.resize(width, String::new());
        out.push(
            row.local_path()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        );
        out.push(row.error().map(|e| e.to_string()).unwrap_or_default());
        if with_uploads {
            out.push(match row.upload() {
                Some(UploadOutcome::Uploaded(url)) => url.clone(),
                Some(UploadOutcome::Failed(cause)) => format!("{UPLOAD_ERROR_PREFIX}{cause}"),
                None => String::new(),
            });
        }
        wtr.write_record(&out)?;
    }

    wtr.flush()?;
    Ok(())
}
