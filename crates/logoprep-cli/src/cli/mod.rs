//! CLI for logoprep.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use logoprep_core::config::{self, LogoprepConfig};
use logoprep_core::normalize::Geometry;
use std::path::{Path, PathBuf};

use commands::{run_download, run_process, run_upload, DownloadOptions, ProcessArgs};

/// Top-level CLI for logoprep.
#[derive(Debug, Parser)]
#[command(name = "logoprep")]
#[command(about = "logoprep: fetch, normalize and publish organization logos from a CSV table", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/logoprep/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download the logo of every row and split the table into processed and failed rows.
    Download {
        /// Input CSV with name, image_url and (optionally) filename columns.
        input: PathBuf,
        /// Directory images are written to (default from config).
        #[arg(long, value_name = "DIR")]
        image_dir: Option<PathBuf>,
        /// Input has no header row; columns are Organization, Logo URL, Filename.
        #[arg(long)]
        no_header: bool,
        /// Convert every image to this format (default from config).
        #[arg(long, value_name = "EXT", conflicts_with = "keep_format")]
        format: Option<String>,
        /// Keep images in the format they were served in.
        #[arg(long)]
        keep_format: bool,
        /// Processed table (default <input>_processed.csv).
        #[arg(long, short, value_name = "PATH")]
        output: Option<PathBuf>,
        /// Failed rows (default <input>_failures.csv).
        #[arg(long, value_name = "PATH")]
        failures: Option<PathBuf>,
        /// Upload stored images to the configured S3 bucket.
        #[arg(long)]
        upload: bool,
    },

    /// Apply image operations to a file or every image in a directory, in place.
    Process {
        /// Image file or directory.
        path: PathBuf,
        /// Convert to this format first.
        #[arg(long, value_name = "EXT")]
        change_type: Option<String>,
        /// Resize to fit WxH.
        #[arg(long, value_name = "WxH")]
        resize: Option<Geometry>,
        /// Center on a WxH canvas.
        #[arg(long, value_name = "WxH")]
        padding: Option<Geometry>,
        /// Padding color (default: the image's dominant color).
        #[arg(long, value_name = "COLOR", requires = "padding")]
        pad_color: Option<String>,
        /// Convert to grayscale.
        #[arg(long)]
        grayscale: bool,
        /// Flatten transparency onto this color.
        #[arg(long, value_name = "COLOR")]
        background: Option<String>,
        /// Skip the <path>.bak copy.
        #[arg(long)]
        no_backup: bool,
    },

    /// Upload the stored images of a processed table and record their URLs.
    Upload {
        /// Processed CSV (with a local_path column).
        input: PathBuf,
        /// Bucket to use instead of the configured one.
        #[arg(long, value_name = "BUCKET")]
        bucket: Option<String>,
        /// Where to write the updated table (default: overwrite the input).
        #[arg(long, short, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> Result<LogoprepConfig> {
    let cfg = match path {
        Some(p) => config::load_from_path(p)?,
        None => config::load_or_init()?,
    };
    tracing::debug!("loaded config: {:?}", cfg);
    Ok(cfg)
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = load_config(cli.config.as_deref())?;

        match cli.command {
            CliCommand::Download {
                input,
                image_dir,
                no_header,
                format,
                keep_format,
                output,
                failures,
                upload,
            } => {
                let opts = DownloadOptions {
                    input,
                    image_dir,
                    has_header: !no_header,
                    format,
                    keep_format,
                    output,
                    failures,
                    upload,
                };
                run_download(&cfg, opts).await?;
            }
            CliCommand::Process {
                path,
                change_type,
                resize,
                padding,
                pad_color,
                grayscale,
                background,
                no_backup,
            } => {
                let args = ProcessArgs {
                    path,
                    change_type,
                    resize,
                    padding,
                    pad_color,
                    grayscale,
                    background,
                    backup: !no_backup,
                };
                run_process(&cfg, args).await?;
            }
            CliCommand::Upload {
                input,
                bucket,
                output,
            } => run_upload(&cfg, &input, bucket, output).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
