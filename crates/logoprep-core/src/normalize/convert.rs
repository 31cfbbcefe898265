//! Format conversion: picks a converter by source format.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::tool::ToolCommand;
use super::{extension_of, Geometry, NormalizeError, Normalizer};
use crate::storage::TEMP_SUFFIX;

/// Converts with ImageMagick for raster sources, Inkscape for SVG and `dwebp` for WebP.
#[derive(Debug, Clone)]
pub struct ExternalConverter {
    timeout: Duration,
}

impl ExternalConverter {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Command that turns `src` into `dst`, chosen by the source extension.
    pub fn command_for(src: &Path, dst: &Path, geometry: Geometry) -> ToolCommand {
        match extension_of(src).as_str() {
            "svg" => ToolCommand::new("inkscape")
                .arg("-w")
                .arg(geometry.width.to_string())
                .arg("-h")
                .arg(geometry.height.to_string())
                .arg(format!("--export-filename={}", dst.display()))
                .path_arg(src),
            "webp" => ToolCommand::new("dwebp")
                .path_arg(src)
                .arg("-o")
                .path_arg(dst),
            _ => ToolCommand::new("convert").path_arg(src).path_arg(dst),
        }
    }
}

/// Where a conversion is written before it replaces `final_path`:
/// `acme.png` -> `acme.part.png`. The extension stays last so the tools
/// still pick the output format from it.
fn staging_path(final_path: &Path) -> PathBuf {
    let stem = final_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match final_path.extension() {
        Some(ext) => format!("{stem}{TEMP_SUFFIX}.{}", ext.to_string_lossy()),
        None => format!("{stem}{TEMP_SUFFIX}"),
    };
    final_path.with_file_name(name)
}

fn same_format(a: &str, b: &str) -> bool {
    let canon = |e: &str| match e {
        "jpg" => "jpeg".to_string(),
        other => other.to_string(),
    };
    canon(a) == canon(b)
}

impl Normalizer for ExternalConverter {
    fn normalize(
        &self,
        path: &Path,
        target_ext: &str,
        geometry: Geometry,
    ) -> Result<PathBuf, NormalizeError> {
        let target = target_ext.trim_start_matches('.').to_ascii_lowercase();
        let source = extension_of(path);
        if same_format(&source, &target) {
            return Ok(path.to_path_buf());
        }

        let new_path = path.with_extension(&target);
        let staging = staging_path(&new_path);
        let cmd = Self::command_for(path, &staging, geometry);
        tracing::info!(
            from = %path.display(),
            to = %new_path.display(),
            program = %cmd.program,
            "converting image"
        );

        // Only the staging file is ours to clean up; `new_path` may belong to another row.
        if let Err(e) = cmd.run(self.timeout) {
            let _ = std::fs::remove_file(&staging);
            return Err(e);
        }

        let produced = std::fs::metadata(&staging)
            .map(|m| m.len() > 0)
            .unwrap_or(false);
        if !produced {
            let _ = std::fs::remove_file(&staging);
            return Err(NormalizeError::NotProduced(new_path));
        }

        if new_path.exists() {
            tracing::warn!(path = %new_path.display(), "overwriting existing image");
        }
        if let Err(e) = std::fs::rename(&staging, &new_path) {
            let _ = std::fs::remove_file(&staging);
            return Err(e.into());
        }
        std::fs::remove_file(path)?;
        Ok(new_path)
    }
}
