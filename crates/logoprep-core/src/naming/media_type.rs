//! MIME type <-> file extension mapping for images.

use std::path::Path;

/// Derives a file extension (with leading dot) from a response `Content-Type`.
///
/// Returns `None` unless the type is `image/*`. Any SVG flavour maps to `.svg`;
/// otherwise the leading `[a-z0-9.+-]` run of the subtype is used
/// (`image/jpeg` -> `.jpeg`, `image/png/x` -> `.png`), with icon aliases
/// folded to `.ico`.
pub fn image_extension(content_type: &str) -> Option<String> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    let (kind, subtype) = essence.split_once('/')?;
    if kind.trim() != "image" {
        return None;
    }
    let subtype = subtype.trim();
    let end = subtype
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '+' | '-')))
        .unwrap_or(subtype.len());
    let subtype = subtype[..end].trim_matches('.');
    if subtype.is_empty() {
        return None;
    }
    if subtype.contains("svg") {
        return Some(".svg".to_string());
    }
    let ext = match subtype {
        "x-icon" | "vnd.microsoft.icon" => "ico",
        other => other,
    };
    Some(format!(".{ext}"))
}

/// Content type to declare when publishing a local image, from its extension.
pub fn content_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "ico" => "image/x-icon",
        "tif" | "tiff" => "image/tiff",
        "avif" => "image/avif",
        _ => "application/octet-stream",
    }
}
