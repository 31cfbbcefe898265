use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Browser-like User-Agent; several logo hosts reject the libcurl default.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; U; Linux x86_64; en-US) AppleWebKit/540.0 (KHTML,like Gecko) Chrome/9.1.0.0 Safari/540.0";

/// HTTP fetch parameters (optional `[fetch]` section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
    /// User-Agent header sent with every image request.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// External image tool parameters (optional `[convert]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// Upper bound for a single converter invocation; the child is killed after this.
    pub timeout_secs: u64,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self { timeout_secs: 60 }
    }
}

/// Object store credentials and target bucket (optional `[s3]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    /// Base URL of an S3-compatible endpoint (path-style). None = AWS virtual-hosted style.
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// Global configuration loaded from `~/.config/logoprep/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoprepConfig {
    /// Directory downloaded images are written to.
    pub image_dir: PathBuf,
    /// Raster width used when rasterizing vector sources.
    pub default_width: u32,
    /// Raster height used when rasterizing vector sources.
    pub default_height: u32,
    /// Canonical image format (extension without dot). None keeps whatever was fetched.
    #[serde(default)]
    pub target_format: Option<String>,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub convert: ConvertConfig,
    /// Only needed for uploads.
    #[serde(default)]
    pub s3: Option<S3Config>,
}

impl Default for LogoprepConfig {
    fn default() -> Self {
        Self {
            image_dir: PathBuf::from("images"),
            default_width: 200,
            default_height: 200,
            target_format: Some("png".to_string()),
            fetch: FetchConfig::default(),
            convert: ConvertConfig::default(),
            s3: None,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("logoprep")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<LogoprepConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = LogoprepConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from_path(&path)
}

/// Load configuration from an explicit file; missing file is an error.
pub fn load_from_path(path: &Path) -> Result<LogoprepConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let cfg: LogoprepConfig =
        toml::from_str(&data).with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}
