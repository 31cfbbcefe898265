//! Image normalization through external tools.
//!
//! The rest of the crate only sees the [`Normalizer`] trait. The bundled
//! implementation shells out to ImageMagick (`convert`), Inkscape (SVG) and
//! `dwebp` (WebP); none of them is linked.

mod convert;
mod ops;
mod tool;

pub use convert::ExternalConverter;
pub use ops::{backup, parse_histogram, ImageOps, PaddingOptions, ProcessOptions, ProcessSummary};
pub use tool::{ToolCommand, ToolOutput};

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Target raster size, rendered as `WxH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Geometry {
    type Err = String;

    /// Parses `WxH` (e.g. `200x200`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
        let width: u32 = w.trim().parse().map_err(|_| format!("bad width in {s:?}"))?;
        let height: u32 = h.trim().parse().map_err(|_| format!("bad height in {s:?}"))?;
        if width == 0 || height == 0 {
            return Err(format!("geometry must be non-zero, got {s:?}"));
        }
        Ok(Self { width, height })
    }
}

/// Failure of an external tool step. Never fatal to a row.
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("{program} timed out after {secs}s")]
    TimedOut { program: String, secs: u64 },
    #[error("converter produced no output at {0}")]
    NotProduced(PathBuf),
    #[error("no dominant color found")]
    NoDominantColor,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Format normalization strategy used by the pipeline.
pub trait Normalizer {
    /// Converts `path` to `target_ext` (with or without leading dot).
    ///
    /// Returns the new path, or `path` itself when it already has the target
    /// extension. On success the original file is removed; on failure it is
    /// left in place.
    fn normalize(
        &self,
        path: &Path,
        target_ext: &str,
        geometry: Geometry,
    ) -> Result<PathBuf, NormalizeError>;
}

/// Lowercase extension of `path` without the dot ("" if none).
pub(crate) fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}
