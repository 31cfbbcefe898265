//! Image fetching over HTTP(S).
//!
//! Uses the curl crate (libcurl) for a single GET per row with a fixed
//! timeout and User-Agent. The response's declared `Content-Type` decides
//! whether the body is an image and which extension it gets.

mod parse;

use std::str;
use std::time::Duration;

use crate::config::FetchConfig;
use crate::naming::image_extension;
use crate::table::RowError;

/// Responses larger than this are aborted; logos are small.
const MAX_IMAGE_BYTES: usize = 32 * 1024 * 1024;

/// Body and declared type of a successful GET. Not persisted.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub bytes: Vec<u8>,
    /// `Content-Type` of the final response, if any.
    pub content_type: Option<String>,
}

impl FetchResult {
    /// File extension (with dot) if the declared type is an image.
    pub fn extension(&self) -> Option<String> {
        self.content_type.as_deref().and_then(image_extension)
    }
}

/// Why a fetch produced no body.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid image URL {0:?}")]
    InvalidUrl(String),
    #[error("{0}")]
    Curl(#[from] curl::Error),
    #[error("HTTP {0}")]
    Http(u32),
    #[error("response exceeds the {} byte limit", MAX_IMAGE_BYTES)]
    TooLarge,
}

impl FetchError {
    /// Row-level classification recorded in the `error` column.
    pub fn row_error(&self) -> RowError {
        match self {
            FetchError::InvalidUrl(_) => RowError::ImageUrlError,
            FetchError::Curl(_) | FetchError::Http(_) | FetchError::TooLarge => {
                RowError::ImageDownloadError
            }
        }
    }
}

/// Fetch strategy used by the pipeline.
pub trait Fetcher {
    fn fetch(&self, url: &str) -> Result<FetchResult, FetchError>;
}

/// Accepts only absolute `http`/`https` URLs with a host.
pub fn validate_url(url: &str) -> Result<url::Url, FetchError> {
    let parsed = url::Url::parse(url.trim()).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(parsed),
        _ => Err(FetchError::InvalidUrl(url.to_string())),
    }
}

/// Blocking libcurl fetcher. One Easy handle per request.
#[derive(Debug, Clone)]
pub struct CurlFetcher {
    timeout: Duration,
    user_agent: String,
}

impl CurlFetcher {
    pub fn new(cfg: &FetchConfig) -> Self {
        Self {
            timeout: Duration::from_secs(cfg.timeout_secs),
            user_agent: cfg.user_agent.clone(),
        }
    }
}

impl Fetcher for CurlFetcher {
    /// Performs a GET and returns the body with its content type.
    ///
    /// Follows redirects; the content type comes from the final response.
    fn fetch(&self, url: &str) -> Result<FetchResult, FetchError> {
        let url = validate_url(url)?;
        let mut headers: Vec<String> = Vec::new();
        let mut body: Vec<u8> = Vec::new();
        let mut too_large = false;

        let mut easy = curl::easy::Easy::new();
        easy.url(url.as_str())?;
        easy.get(true)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.useragent(&self.user_agent)?;
        easy.connect_timeout(self.timeout)?;
        easy.timeout(self.timeout)?;

        let performed = {
            let mut transfer = easy.transfer();
            transfer.header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    headers.push(s.trim_end().to_string());
                }
                true
            })?;
            transfer.write_function(|data| {
                if body.len() + data.len() > MAX_IMAGE_BYTES {
                    too_large = true;
                    return Ok(0); // abort transfer
                }
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()
        };
        if too_large {
            return Err(FetchError::TooLarge);
        }
        performed?;

        let code = easy.response_code()?;
        if !(200..300).contains(&code) {
            return Err(FetchError::Http(code));
        }

        Ok(FetchResult {
            bytes: body,
            content_type: parse::final_content_type(&headers),
        })
    }
}
