//! Filesystem-safe lowercase base names.

/// Character every unsafe run collapses to.
pub const SEPARATOR: char = '-';

/// Characters replaced by [`SEPARATOR`] in addition to whitespace.
const UNSAFE: &[char] = &['&', '.', '_', '(', ')', '|', ',', '\'', '"', '\\', '/', ':'];

/// Keeps room for an extension under Linux NAME_MAX (255 bytes).
const MAX_BASE_LEN: usize = 240;

/// Turns a free-text organization name into a lowercase base name.
///
/// - Whitespace and `&._()|,'"\/:` become `-`
/// - Runs of `-` collapse to one
/// - Leading/trailing `-` are trimmed
///
/// Applying it twice gives the same result as applying it once.
pub fn sanitize_image_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_sep = true; // drops leading separators

    for c in name.chars() {
        if c.is_whitespace() || c.is_control() || c == SEPARATOR || UNSAFE.contains(&c) {
            if !prev_sep {
                out.push(SEPARATOR);
            }
            prev_sep = true;
        } else {
            out.extend(c.to_lowercase());
            prev_sep = false;
        }
    }

    if out.len() > MAX_BASE_LEN {
        let mut take = MAX_BASE_LEN;
        while take > 0 && !out.is_char_boundary(take) {
            take -= 1;
        }
        out.truncate(take);
    }

    out.trim_end_matches(SEPARATOR).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_unsafe_chars_and_lowercases() {
        assert_eq!(sanitize_image_name("Acme"), "acme");
        assert_eq!(sanitize_image_name("Smith & Sons, Inc."), "smith-sons-inc");
        assert_eq!(sanitize_image_name("a/b\\c:d|e"), "a-b-c-d-e");
        assert_eq!(sanitize_image_name("O'Brien \"Foods\""), "o-brien-foods");
    }

    #[test]
    fn collapses_and_trims_separators() {
        assert_eq!(sanitize_image_name("  (Big)   Org__Name  "), "big-org-name");
        assert_eq!(sanitize_image_name("x -- y"), "x-y");
        assert_eq!(sanitize_image_name("...."), "");
    }

    #[test]
    fn tabs_and_newlines_are_whitespace() {
        assert_eq!(sanitize_image_name("One\tTwo\nThree"), "one-two-three");
    }

    #[test]
    fn keeps_non_ascii_letters() {
        assert_eq!(sanitize_image_name("Café Müller"), "café-müller");
    }

    #[test]
    fn idempotent() {
        let inputs = [
            "Acme",
            "  (Big)   Org__Name  ",
            "Smith & Sons, Inc.",
            "-leading-and-trailing-",
            "UPPER lower MiXeD",
            "Café Müller",
            "a..b..c",
            "",
        ];
        for input in inputs {
            let once = sanitize_image_name(input);
            assert_eq!(sanitize_image_name(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn long_names_are_bounded() {
        let long = "a b ".repeat(200);
        let out = sanitize_image_name(&long);
        assert!(out.len() <= MAX_BASE_LEN);
        assert!(!out.ends_with(SEPARATOR));
        assert_eq!(sanitize_image_name(&out), out);
    }
}
