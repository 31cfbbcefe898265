//! `logoprep upload <csv>` – publish the images of a processed table.

use anyhow::{Context, Result};
use logoprep_core::config::LogoprepConfig;
use logoprep_core::table::{read_table, write_table};
use logoprep_core::upload::{upload_rows, S3Uploader};
use std::path::{Path, PathBuf};

pub async fn run_upload(
    cfg: &LogoprepConfig,
    input: &Path,
    bucket: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let s3 = cfg
        .s3
        .as_ref()
        .context("upload needs an [s3] section in the config")?;
    let mut uploader = S3Uploader::new(s3)?;
    if let Some(bucket) = bucket {
        uploader = uploader.with_bucket(bucket);
    }
    let mut table = read_table(input, true)?;
    let output = output.unwrap_or_else(|| input.to_path_buf());

    let (table, summary) = tokio::task::spawn_blocking(move || {
        let summary = upload_rows(&mut table, &uploader);
        (table, summary)
    })
    .await?;

    write_table(&output, &table)?;
    println!(
        "Uploaded {} image(s), {} failed, {} skipped. Table: {}",
        summary.uploaded,
        summary.failed,
        summary.skipped,
        output.display()
    );
    Ok(())
}
