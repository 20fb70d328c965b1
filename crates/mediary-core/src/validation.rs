//! Input sanitization shared by key derivation and upload handling.

/// Replace every character outside `[A-Za-z0-9._-]` with `_`.
///
/// Keeps storage keys safe for URLs and object-store listings while
/// preserving the extension and enough of the original name to be readable.
pub fn sanitize_file_name(file_name: &str) -> String {
    file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_names_pass_through() {
        assert_eq!(sanitize_file_name("photo.jpg"), "photo.jpg");
        assert_eq!(sanitize_file_name("my-file_2.tar.gz"), "my-file_2.tar.gz");
    }

    #[test]
    fn test_unsafe_characters_are_replaced() {
        assert_eq!(sanitize_file_name("my photo (1).jpg"), "my_photo__1_.jpg");
        assert_eq!(sanitize_file_name("a/b\\c.png"), "a_b_c.png");
        assert_eq!(sanitize_file_name("résumé.pdf"), "r_sum_.pdf");
    }

    #[test]
    fn test_empty_name_stays_empty() {
        assert_eq!(sanitize_file_name(""), "");
    }
}
