//! Local naming: image base names from free text, and mapping between
//! MIME types and file extensions.
//!
//! Everything here is pure; callers decide where the files go.

mod media_type;
mod sanitize;

pub use media_type::{content_type_for_path, image_extension};
pub use sanitize::{sanitize_image_name, SEPARATOR};

/// Base name used when sanitizing leaves nothing usable.
pub const DEFAULT_IMAGE_NAME: &str = "logo";

/// Returns the sanitized base name for `name`, or [`DEFAULT_IMAGE_NAME`] if empty.
pub fn image_base_name(name: &str) -> String {
    let sanitized = sanitize_image_name(name);
    if sanitized.is_empty() {
        DEFAULT_IMAGE_NAME.to_string()
    } else {
        sanitized
    }
}
