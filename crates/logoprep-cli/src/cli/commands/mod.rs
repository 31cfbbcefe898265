//! CLI command handlers, one per file.

mod download;
mod process;
mod upload;

pub use download::{run_download, DownloadOptions};
pub use process::{run_process, ProcessArgs};
pub use upload::run_upload;

use std::path::{Path, PathBuf};

/// `<dir>/<stem>_<suffix>.csv` next to `input`.
pub(crate) fn sibling_csv(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "table".to_string());
    input.with_file_name(format!("{stem}_{suffix}.csv"))
}
