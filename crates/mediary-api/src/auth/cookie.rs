//! Session cookie contract.
//!
//! Fixed name, HttpOnly, `SameSite=Lax`, `Path=/`, Secure in production, and
//! an `Expires` attribute mirroring the stored session expiry. Deletion sets
//! an empty value with `Max-Age=0`.

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};

/// Build the Set-Cookie value for an issued or renewed session.
pub fn session_cookie(
    name: &str,
    token: &str,
    expires_at: DateTime<Utc>,
    secure: bool,
) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Expires={}",
        name,
        token,
        expires_at.format("%a, %d %b %Y %H:%M:%S GMT")
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Build the Set-Cookie value that deletes the session cookie.
pub fn clear_session_cookie(name: &str, secure: bool) -> String {
    let mut cookie = format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", name);
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Extract the session token from the request's Cookie header, if present.
pub fn extract_session_token(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookies = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|part| {
        let (key, value) = part.trim().split_once('=')?;
        if key == name && !value.is_empty() {
            Some(value.to_string())
        } else {
            None
        }
    })
}
