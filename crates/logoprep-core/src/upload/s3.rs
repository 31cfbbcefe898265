//! S3 client over libcurl: bucket creation and public-read object PUT.

use anyhow::{Context, Result};
use chrono::Utc;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use super::sigv4::{self, Credentials};
use super::{UploadError, Uploader};
use crate::config::S3Config;
use crate::naming::content_type_for_path;

const PUBLIC_READ: &str = "public-read";
const DEFAULT_REGION: &str = "us-east-1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
/// Response bodies are truncated to this many chars in error messages.
const ERROR_BODY_LIMIT: usize = 300;

/// Where a request goes: scheme+authority, the `Host` value, and the encoded path.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Target {
    origin: String,
    host: String,
    path: String,
}

impl Target {
    fn url(&self) -> String {
        format!("{}{}", self.origin, self.path)
    }
}

/// Uploads to one bucket with a public-read ACL.
///
/// Without an endpoint, AWS virtual-hosted URLs are used
/// (`https://{bucket}.s3.{region}.amazonaws.com/{key}`); with one,
/// path-style URLs under it (`{endpoint}/{bucket}/{key}`).
#[derive(Debug, Clone)]
pub struct S3Uploader {
    creds: Credentials,
    region: String,
    bucket: String,
    /// (origin, host) of a custom endpoint.
    endpoint: Option<(String, String)>,
}

impl S3Uploader {
    pub fn new(cfg: &S3Config) -> Result<Self> {
        let endpoint = match cfg.endpoint.as_deref() {
            Some(raw) => {
                let url = url::Url::parse(raw)
                    .with_context(|| format!("invalid S3 endpoint: {raw}"))?;
                let host = url
                    .host_str()
                    .ok_or_else(|| anyhow::anyhow!("S3 endpoint missing host: {raw}"))?;
                let host = match url.port() {
                    Some(port) => format!("{host}:{port}"),
                    None => host.to_string(),
                };
                Some((format!("{}://{}", url.scheme(), host), host))
            }
            None => None,
        };
        if cfg.bucket.trim().is_empty() {
            anyhow::bail!("S3 bucket name is empty");
        }
        Ok(Self {
            creds: Credentials {
                access_key: cfg.access_key.clone(),
                secret_key: cfg.secret_key.clone(),
            },
            region: if cfg.region.trim().is_empty() {
                DEFAULT_REGION.to_string()
            } else {
                cfg.region.clone()
            },
            bucket: cfg.bucket.clone(),
            endpoint,
        })
    }

    /// Same credentials, different bucket.
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn bucket_target(&self) -> Target {
        match &self.endpoint {
            Some((origin, host)) => Target {
                origin: origin.clone(),
                host: host.clone(),
                path: format!("/{}", sigv4::encode_segment(&self.bucket)),
            },
            None => {
                let host = format!("{}.s3.{}.amazonaws.com", self.bucket, self.region);
                Target {
                    origin: format!("https://{host}"),
                    host,
                    path: "/".to_string(),
                }
            }
        }
    }

    fn object_target(&self, key: &str) -> Target {
        let mut target = self.bucket_target();
        let encoded = sigv4::encode_segment(key);
        if target.path.ends_with('/') {
            target.path.push_str(&encoded);
        } else {
            target.path = format!("{}/{}", target.path, encoded);
        }
        target
    }

    /// Public URL an object with this key is served from.
    pub fn object_url(&self, key: &str) -> String {
        self.object_target(key).url()
    }

    /// Creates the bucket with a public-read ACL; an existing bucket we own is fine.
    pub fn ensure_bucket(&self) -> Result<(), UploadError> {
        let body = if self.region == DEFAULT_REGION {
            String::new()
        } else {
            format!(
                "<CreateBucketConfiguration xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">\
                 <LocationConstraint>{}</LocationConstraint></CreateBucketConfiguration>",
                self.region
            )
        };
        let target = self.bucket_target();
        let (status, resp) = self.put(&target, &[("x-amz-acl", PUBLIC_READ)], body.as_bytes())?;
        match status {
            200..=299 => {
                tracing::info!(bucket = %self.bucket, "bucket created");
                Ok(())
            }
            409 if resp.contains("BucketAlreadyOwnedByYou") => {
                tracing::debug!(bucket = %self.bucket, "bucket already exists");
                Ok(())
            }
            _ => Err(http_error(status, &resp)),
        }
    }

    /// Signs and sends a PUT; returns status and response body.
    fn put(
        &self,
        target: &Target,
        extra_headers: &[(&str, &str)],
        body: &[u8],
    ) -> Result<(u32, String), UploadError> {
        let sig = sigv4::sign(
            "PUT",
            &target.host,
            &target.path,
            extra_headers,
            body,
            &self.creds,
            &self.region,
            Utc::now(),
        )?;

        let mut list = curl::easy::List::new();
        list.append(&format!("Authorization: {}", sig.authorization))?;
        list.append(&format!("x-amz-date: {}", sig.amz_date))?;
        list.append(&format!("x-amz-content-sha256: {}", sig.payload_hash))?;
        for (name, value) in extra_headers {
            list.append(&format!("{}: {}", name, value.trim()))?;
        }
        // No 100-continue round trip.
        list.append("Expect:")?;

        let mut easy = curl::easy::Easy::new();
        easy.url(&target.url())?;
        easy.upload(true)?;
        easy.in_filesize(body.len() as u64)?;
        easy.http_headers(list)?;
        easy.connect_timeout(Duration::from_secs(15))?;
        easy.timeout(REQUEST_TIMEOUT)?;

        let mut source = body;
        let mut response: Vec<u8> = Vec::new();
        {
            let mut transfer = easy.transfer();
            transfer.read_function(|buf| Ok(source.read(buf).unwrap_or(0)))?;
            transfer.write_function(|data| {
                response.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let status = easy.response_code()?;
        Ok((status, String::from_utf8_lossy(&response).into_owned()))
    }
}

fn http_error(status: u32, body: &str) -> UploadError {
    let body: String = body.trim().chars().take(ERROR_BODY_LIMIT).collect();
    UploadError::Http { status, body }
}

impl Uploader for S3Uploader {
    fn prepare(&self) -> Result<(), UploadError> {
        self.ensure_bucket()
    }

    /// PUTs the file under its file name with a public-read ACL.
    fn upload(&self, path: &Path) -> Result<String, UploadError> {
        let key = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| UploadError::InvalidKey(path.to_path_buf()))?;
        let body = std::fs::read(path).map_err(|source| UploadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let content_type = content_type_for_path(path);
        let target = self.object_target(key);

        tracing::debug!(key = %key, bucket = %self.bucket, content_type, "uploading object");
        let (status, resp) = self.put(
            &target,
            &[("content-type", content_type), ("x-amz-acl", PUBLIC_READ)],
            &body,
        )?;
        if !(200..300).contains(&status) {
            return Err(http_error(status, &resp));
        }
        Ok(target.url())
    }
}
