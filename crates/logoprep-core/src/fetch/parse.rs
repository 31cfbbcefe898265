//! Parse HTTP response header lines collected by libcurl.

/// Returns the `Content-Type` of the last response in `lines`.
///
/// libcurl reports headers of every hop when following redirects; each
/// status line starts a new block, so earlier values are discarded.
pub(crate) fn final_content_type(lines: &[String]) -> Option<String> {
    let mut content_type = None;

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            content_type = None;
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-type") {
                let value = value.trim();
                if !value.is_empty() {
                    content_type = Some(value.to_string());
                }
            }
        }
    }

    content_type
}
