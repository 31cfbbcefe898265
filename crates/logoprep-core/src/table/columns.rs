//! Column resolution for input tables.

use anyhow::{bail, Result};

pub const LOCAL_PATH_COLUMN: &str = "local_path";
pub const ERROR_COLUMN: &str = "error";
pub const S3_URL_COLUMN: &str = "s3_url";

const NAME_ALIASES: &[&str] = &["name", "organization"];
const IMAGE_URL_ALIASES: &[&str] = &["image_url", "logo url", "logo_url"];
const FILENAME_ALIASES: &[&str] = &["filename"];

/// Where the interesting columns live in a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub name: usize,
    pub image_url: usize,
    /// None: the file name is derived from `name`.
    pub filename: Option<usize>,
    pub local_path: Option<usize>,
    pub error: Option<usize>,
    pub s3_url: Option<usize>,
}

impl Schema {
    /// Positional layout for header-less input: `Organization | Logo URL | Filename`.
    pub fn positional() -> Self {
        Self {
            name: 0,
            image_url: 1,
            filename: Some(2),
            local_path: None,
            error: None,
            s3_url: None,
        }
    }

    /// Locates columns by header name (case-insensitive).
    pub fn from_headers(headers: &[String]) -> Result<Self> {
        let find = |aliases: &[&str]| {
            headers.iter().position(|h| {
                let h = h.trim();
                aliases.iter().any(|a| h.eq_ignore_ascii_case(a))
            })
        };

        let Some(name) = find(NAME_ALIASES) else {
            bail!("missing required column: name");
        };
        let Some(image_url) = find(IMAGE_URL_ALIASES) else {
            bail!("missing required column: image_url");
        };

        Ok(Self {
            name,
            image_url,
            filename: find(FILENAME_ALIASES),
            local_path: find(&[LOCAL_PATH_COLUMN]),
            error: find(&[ERROR_COLUMN]),
            s3_url: find(&[S3_URL_COLUMN]),
        })
    }

    /// Whether column `idx` is one the writer appends (and so is not part of the original record).
    pub fn is_output_column(&self, idx: usize) -> bool {
        Some(idx) == self.local_path || Some(idx) == self.error || Some(idx) == self.s3_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn finds_canonical_columns() {
        let s = Schema::from_headers(&headers(&["id", "name", "image_url", "filename"])).unwrap();
        assert_eq!(s.name, 1);
        assert_eq!(s.image_url, 2);
        assert_eq!(s.filename, Some(3));
        assert!(s.local_path.is_none());
    }

    #[test]
    fn case_insensitive_and_aliases() {
        let s = Schema::from_headers(&headers(&["Organization", "Logo URL", "Filename"])).unwrap();
        assert_eq!(s, Schema::positional());
    }

    #[test]
    fn filename_optional() {
        let s = Schema::from_headers(&headers(&["name", "image_url"])).unwrap();
        assert!(s.filename.is_none());
    }

    #[test]
    fn missing_url_column_is_error() {
        let err = Schema::from_headers(&headers(&["name", "website"])).unwrap_err();
        assert!(err.to_string().contains("image_url"));
    }

    #[test]
    fn detects_output_columns() {
        let s = Schema::from_headers(&headers(&[
            "name",
            "image_url",
            "filename",
            "local_path",
            "error",
        ]))
        .unwrap();
        assert!(s.is_output_column(3));
        assert!(s.is_output_column(4));
        assert!(!s.is_output_column(0));
    }
}
