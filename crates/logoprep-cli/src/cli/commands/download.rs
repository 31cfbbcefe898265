//! `logoprep download <csv>` – fetch every row's logo and write the split tables.

use anyhow::{Context, Result};
use logoprep_core::config::LogoprepConfig;
use logoprep_core::fetch::CurlFetcher;
use logoprep_core::normalize::{ExternalConverter, Geometry};
use logoprep_core::pipeline::{Pipeline, RunReport};
use logoprep_core::storage::ImageStore;
use logoprep_core::table::{read_table, write_table, Table};
use logoprep_core::upload::{upload_rows, S3Uploader};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::sibling_csv;

/// Arguments of the download command after CLI parsing.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub input: PathBuf,
    pub image_dir: Option<PathBuf>,
    pub has_header: bool,
    pub format: Option<String>,
    pub keep_format: bool,
    pub output: Option<PathBuf>,
    pub failures: Option<PathBuf>,
    pub upload: bool,
}

impl DownloadOptions {
    /// Target format: `--keep-format` wins, then `--format`, then config.
    fn target_format(&self, cfg: &LogoprepConfig) -> Option<String> {
        if self.keep_format {
            return None;
        }
        self.format
            .clone()
            .or_else(|| cfg.target_format.clone())
            .filter(|f| !f.trim().is_empty())
    }
}

pub async fn run_download(cfg: &LogoprepConfig, opts: DownloadOptions) -> Result<()> {
    let table = read_table(&opts.input, opts.has_header)?;
    let output = opts
        .output
        .clone()
        .unwrap_or_else(|| sibling_csv(&opts.input, "processed"));
    let failures = opts
        .failures
        .clone()
        .unwrap_or_else(|| sibling_csv(&opts.input, "failures"));

    // Fail before downloading anything if uploads cannot work.
    let uploader = if opts.upload {
        let s3 = cfg
            .s3
            .as_ref()
            .context("--upload needs an [s3] section in the config")?;
        Some(S3Uploader::new(s3)?)
    } else {
        None
    };

    let image_dir = opts
        .image_dir
        .clone()
        .unwrap_or_else(|| cfg.image_dir.clone());
    let target = opts.target_format(cfg);
    let geometry = Geometry::new(cfg.default_width, cfg.default_height);
    let fetch_cfg = cfg.fetch.clone();
    let convert_timeout = Duration::from_secs(cfg.convert.timeout_secs);

    tracing::info!(
        input = %opts.input.display(),
        rows = table.len(),
        image_dir = %image_dir.display(),
        format = target.as_deref().unwrap_or("<keep>"),
        "starting download"
    );

    let abort = Arc::new(AtomicBool::new(false));
    let worker_abort = Arc::clone(&abort);
    let mut task = tokio::task::spawn_blocking(move || -> Result<RunReport> {
        let fetcher = CurlFetcher::new(&fetch_cfg);
        let converter = ExternalConverter::new(convert_timeout);
        let mut pipeline =
            Pipeline::new(&fetcher, ImageStore::new(image_dir)).with_abort(worker_abort);
        if let Some(ext) = target {
            pipeline = pipeline.with_normalizer(&converter, ext, geometry);
        }
        pipeline.run(table)
    });

    let report = tokio::select! {
        res = &mut task => res??,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("Interrupted; finishing the current row...");
            tracing::warn!("interrupt received");
            abort.store(true, Ordering::Relaxed);
            task.await??
        }
    };

    let summary = report.summary;
    let parts = report.table.partition();
    write_table(&failures, &parts.failure)?;

    let mut success = parts.success;
    if let Some(uploader) = uploader {
        success = upload_success(uploader, success).await?;
    }
    write_table(&output, &success)?;

    if summary.aborted {
        println!(
            "Interrupted after {} of {} rows.",
            summary.processed(),
            summary.total
        );
    }
    println!(
        "Saved {} image(s), {} failed. Processed table: {}  Failures: {}",
        summary.saved,
        summary.failed,
        output.display(),
        failures.display()
    );
    Ok(())
}

/// Upload failures, bucket setup included, are recorded per row and never fail the command.
async fn upload_success(uploader: S3Uploader, mut table: Table) -> Result<Table> {
    let table = tokio::task::spawn_blocking(move || {
        let summary = upload_rows(&mut table, &uploader);
        println!(
            "Uploaded {} image(s) to {}, {} failed.",
            summary.uploaded,
            uploader.bucket(),
            summary.failed
        );
        table
    })
    .await?;
    Ok(table)
}
