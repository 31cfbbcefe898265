//! `logoprep process <path>` – apply image operations in place.

use anyhow::{bail, Result};
use logoprep_core::config::LogoprepConfig;
use logoprep_core::normalize::{
    backup, ExternalConverter, Geometry, ImageOps, PaddingOptions, ProcessOptions,
};
use std::path::PathBuf;
use std::time::Duration;

/// Arguments of the process command after CLI parsing.
#[derive(Debug, Clone)]
pub struct ProcessArgs {
    pub path: PathBuf,
    pub change_type: Option<String>,
    pub resize: Option<Geometry>,
    pub padding: Option<Geometry>,
    pub pad_color: Option<String>,
    pub grayscale: bool,
    pub background: Option<String>,
    pub backup: bool,
}

impl ProcessArgs {
    fn options(&self) -> ProcessOptions {
        ProcessOptions {
            change_type: self.change_type.clone(),
            resize: self.resize,
            padding: self.padding.map(|geometry| PaddingOptions {
                geometry,
                color: self.pad_color.clone(),
            }),
            grayscale: self.grayscale,
            background: self.background.clone(),
        }
    }
}

pub async fn run_process(cfg: &LogoprepConfig, args: ProcessArgs) -> Result<()> {
    let opts = args.options();
    if opts.is_empty() {
        bail!(
            "nothing to do: pass at least one of --change-type, --resize, --padding, --grayscale, --background"
        );
    }
    if !args.path.exists() {
        bail!("no such file or directory: {}", args.path.display());
    }
    if args.backup {
        let dest = backup(&args.path)?;
        println!("Backup written to {}", dest.display());
    }

    let timeout = Duration::from_secs(cfg.convert.timeout_secs);
    let raster = Geometry::new(cfg.default_width, cfg.default_height);
    let path = args.path.clone();
    let summary = tokio::task::spawn_blocking(move || {
        let ops = ImageOps::new(timeout);
        let converter = ExternalConverter::new(timeout);
        ops.process_path(&path, &opts, &converter, raster)
    })
    .await??;

    println!(
        "Processed {} image(s), {} failed.",
        summary.processed, summary.failed
    );
    Ok(())
}
