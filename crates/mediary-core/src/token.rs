//! Secure token and id generation.
//!
//! Session tokens and user ids are raw random bytes from a CSPRNG rendered as
//! hex. The token is the stored secret; nothing is derived from it.

use rand::Rng;

/// Generate an unguessable session token: 32 random bytes as 64 hex chars.
pub fn generate_session_token() -> String {
    let mut rng = rand::rng();
    let random_bytes: Vec<u8> = (0..32).map(|_| rng.random()).collect();
    hex::encode(random_bytes)
}

/// Generate a new user id: 16 random bytes as 32 hex chars.
pub fn generate_user_id() -> String {
    let mut rng = rand::rng();
    let random_bytes: Vec<u8> = (0..16).map(|_| rng.random()).collect();
    hex::encode(random_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_token_format() {
        let token = generate_session_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_user_id_format() {
        let id = generate_user_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_tokens_are_unique() {
        let a = generate_session_token();
        let b = generate_session_token();
        assert_ne!(a, b);
    }
}
