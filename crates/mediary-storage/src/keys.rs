//! Shared storage key derivation.
//!
//! Key format: `{prefix}/{user_id}/{timestamp_ms}-{sanitized_filename}`.

use mediary_core::sanitize_file_name;

/// Derive the storage key for one upload.
///
/// The per-user path segment is a cheap authorization boundary at the storage
/// layer; the millisecond timestamp plus sanitized name gives practical
/// uniqueness without a coordination round-trip. Keys are immutable once a
/// capability has been issued for them.
pub fn derive_upload_key(prefix: &str, user_id: &str, timestamp_ms: i64, file_name: &str) -> String {
    format!(
        "{}/{}/{}-{}",
        prefix,
        user_id,
        timestamp_ms,
        sanitize_file_name(file_name)
    )
}

/// Prefix under which all of one user's uploads live.
pub fn user_prefix(prefix: &str, user_id: &str) -> String {
    format!("{}/{}/", prefix, user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_format() {
        let key = derive_upload_key("uploads", "abc123", 1740000000000, "photo.jpg");
        assert_eq!(key, "uploads/abc123/1740000000000-photo.jpg");
    }

    #[test]
    fn test_key_sanitizes_filename() {
        let key = derive_upload_key("uploads", "abc123", 1, "my photo (1).jpg");
        assert_eq!(key, "uploads/abc123/1-my_photo__1_.jpg");
    }

    #[test]
    fn test_keys_are_user_namespaced() {
        let key = derive_upload_key("uploads", "abc123", 1, "a.png");
        assert!(key.starts_with(&user_prefix("uploads", "abc123")));
        assert!(!key.starts_with(&user_prefix("uploads", "other")));
    }
}
