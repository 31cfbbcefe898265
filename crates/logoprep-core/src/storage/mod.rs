//! Image directory and file lifecycle.
//!
//! Images are written to a `.part` temp file, synced, then renamed to the
//! final name so a crash never leaves a truncated image behind under the
//! name the table points to.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `acme.png` → `acme.png.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Directory that downloaded images are stored in.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the directory (and parents) if missing.
    pub fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create image dir {}", self.dir.display()))
    }

    /// Final path for base name `stem` and extension `ext` (with or without leading dot).
    pub fn path_for(&self, stem: &str, ext: &str) -> PathBuf {
        let ext = ext.trim_start_matches('.');
        self.dir.join(format!("{stem}.{ext}"))
    }

    /// Writes `bytes` to `{dir}/{stem}{ext}` and returns the final path.
    /// An existing file with the same name is replaced.
    pub fn save(&self, stem: &str, ext: &str, bytes: &[u8]) -> Result<PathBuf> {
        let final_path = self.path_for(stem, ext);
        let tmp = temp_path(&final_path);

        let write = || -> Result<()> {
            let mut file = File::create(&tmp)
                .with_context(|| format!("failed to create temp file {}", tmp.display()))?;
            file.write_all(bytes).context("image write failed")?;
            file.sync_all().context("image sync failed")?;
            Ok(())
        };
        if let Err(e) = write() {
            let _ = std::fs::remove_file(&tmp);
            return Err(e);
        }

        if final_path.exists() {
            tracing::warn!(path = %final_path.display(), "overwriting existing image");
        }
        std::fs::rename(&tmp, &final_path).with_context(|| {
            format!("failed to rename {} to {}", tmp.display(), final_path.display())
        })?;
        Ok(final_path)
    }
}
