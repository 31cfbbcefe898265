//! In-place image operations (resize, padding, grayscale, background) and
//! batch processing of an image directory.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::tool::ToolCommand;
use super::{Geometry, NormalizeError, Normalizer};

/// Padding canvas size and fill color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaddingOptions {
    pub geometry: Geometry,
    /// None = the image's dominant color.
    pub color: Option<String>,
}

/// Which operations to apply to each image, in the order they run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOptions {
    /// Convert to this extension first.
    pub change_type: Option<String>,
    pub resize: Option<Geometry>,
    pub padding: Option<PaddingOptions>,
    pub grayscale: bool,
    pub background: Option<String>,
}

impl ProcessOptions {
    pub fn is_empty(&self) -> bool {
        self.change_type.is_none()
            && self.resize.is_none()
            && self.padding.is_none()
            && !self.grayscale
            && self.background.is_none()
    }
}

/// Counts from a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessSummary {
    pub processed: usize,
    pub failed: usize,
}

/// ImageMagick operations that rewrite a file in place.
#[derive(Debug, Clone)]
pub struct ImageOps {
    timeout: Duration,
}

impl ImageOps {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn resize_command(path: &Path, geometry: Geometry) -> ToolCommand {
        ToolCommand::new("convert")
            .path_arg(path)
            .arg("-resize")
            .arg(geometry.to_string())
            .path_arg(path)
    }

    pub fn grayscale_command(path: &Path) -> ToolCommand {
        ToolCommand::new("convert")
            .path_arg(path)
            .arg("-colorspace")
            .arg("Gray")
            .path_arg(path)
    }

    pub fn background_command(path: &Path, color: &str) -> ToolCommand {
        ToolCommand::new("convert")
            .path_arg(path)
            .arg("-background")
            .arg(color)
            .arg("-alpha")
            .arg("remove")
            .arg("-alpha")
            .arg("off")
            .path_arg(path)
    }

    pub fn pad_command(path: &Path, geometry: Geometry, color: &str) -> ToolCommand {
        ToolCommand::new("convert")
            .arg("-size")
            .arg(geometry.to_string())
            .arg(format!("xc:{color}"))
            .path_arg(path)
            .arg("-gravity")
            .arg("center")
            .arg("-composite")
            .path_arg(path)
    }

    pub fn histogram_command(path: &Path) -> ToolCommand {
        ToolCommand::new("convert")
            .path_arg(path)
            .arg("-scale")
            .arg("50x50!")
            .arg("-depth")
            .arg("8")
            .arg("+dither")
            .arg("-colors")
            .arg("8")
            .arg("-format")
            .arg("%c")
            .arg("histogram:info:-")
    }

    pub fn resize(&self, path: &Path, geometry: Geometry) -> Result<(), NormalizeError> {
        Self::resize_command(path, geometry).run(self.timeout).map(drop)
    }

    pub fn grayscale(&self, path: &Path) -> Result<(), NormalizeError> {
        Self::grayscale_command(path).run(self.timeout).map(drop)
    }

    pub fn background(&self, path: &Path, color: &str) -> Result<(), NormalizeError> {
        Self::background_command(path, color)
            .run(self.timeout)
            .map(drop)
    }

    /// Centers the image on a `geometry` canvas; without a color, uses the dominant one.
    pub fn pad(
        &self,
        path: &Path,
        geometry: Geometry,
        color: Option<&str>,
    ) -> Result<(), NormalizeError> {
        let color = match color {
            Some(c) => c.to_string(),
            None => self.dominant_color(path)?,
        };
        Self::pad_command(path, geometry, &color)
            .run(self.timeout)
            .map(drop)
    }

    /// Most frequent color (as `#RRGGBB`) after quantizing to 8 colors.
    pub fn dominant_color(&self, path: &Path) -> Result<String, NormalizeError> {
        let out = Self::histogram_command(path).run(self.timeout)?;
        parse_histogram(&String::from_utf8_lossy(&out.stdout))
            .ok_or(NormalizeError::NoDominantColor)
    }

    /// Applies `opts` to one image, returning its (possibly new) path.
    pub fn process_file(
        &self,
        path: &Path,
        opts: &ProcessOptions,
        converter: &dyn Normalizer,
        raster: Geometry,
    ) -> Result<PathBuf, NormalizeError> {
        let mut path = path.to_path_buf();
        if let Some(ext) = &opts.change_type {
            path = converter.normalize(&path, ext, raster)?;
        }
        if let Some(g) = opts.resize {
            self.resize(&path, g)?;
        }
        if let Some(p) = &opts.padding {
            self.pad(&path, p.geometry, p.color.as_deref())?;
        }
        if opts.grayscale {
            self.grayscale(&path)?;
        }
        if let Some(color) = &opts.background {
            self.background(&path, color)?;
        }
        Ok(path)
    }

    /// Processes a single file, or every file with an extension in a directory.
    /// Per-file failures are logged and counted.
    pub fn process_path(
        &self,
        target: &Path,
        opts: &ProcessOptions,
        converter: &dyn Normalizer,
        raster: Geometry,
    ) -> Result<ProcessSummary> {
        let files = image_files(target)?;
        tracing::info!(count = files.len(), path = %target.display(), "processing images");

        let mut summary = ProcessSummary::default();
        for file in files {
            match self.process_file(&file, opts, converter, raster) {
                Ok(_) => summary.processed += 1,
                Err(e) => {
                    tracing::warn!(path = %file.display(), "image processing failed: {}", e);
                    summary.failed += 1;
                }
            }
        }
        Ok(summary)
    }
}

/// Files to process under `target`, sorted for a stable order.
fn image_files(target: &Path) -> Result<Vec<PathBuf>> {
    if !target.is_dir() {
        return Ok(vec![target.to_path_buf()]);
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(target)
        .with_context(|| format!("failed to list {}", target.display()))?
    {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Copies a file or directory to `<path>.bak` before it is modified.
pub fn backup(target: &Path) -> Result<PathBuf> {
    let mut o = target.as_os_str().to_owned();
    o.push(".bak");
    let dest = PathBuf::from(o);
    copy_recursive(target, &dest)
        .with_context(|| format!("failed to back up {} to {}", target.display(), dest.display()))?;
    tracing::info!(from = %target.display(), to = %dest.display(), "backup written");
    Ok(dest)
}

fn copy_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    if src.is_dir() {
        std::fs::create_dir_all(dst)?;
        for entry in std::fs::read_dir(src)? {
            let entry = entry?;
            copy_recursive(&entry.path(), &dst.join(entry.file_name()))?;
        }
    } else {
        std::fs::copy(src, dst)?;
    }
    Ok(())
}

/// Picks the color with the highest count from ImageMagick `histogram:info:-` output.
///
/// Lines look like `      1234: (255,255,255) #FFFFFF white`.
pub fn parse_histogram(output: &str) -> Option<String> {
    output
        .lines()
        .filter_map(|line| {
            let (count, rest) = line.trim().split_once(':')?;
            let count: u64 = count.trim().parse().ok()?;
            let hex = rest.split_whitespace().find(|t| t.starts_with('#'))?;
            Some((count, hex.to_string()))
        })
        .max_by_key(|(count, _)| *count)
        .map(|(_, hex)| hex)
}
