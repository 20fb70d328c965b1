//! Session middleware for protected routes.
//!
//! Resolves the session cookie through the session service. A missing or
//! invalid session answers 401 without touching the handler; "not logged in"
//! is a normal outcome, not a server fault. When validation slid the expiry
//! forward, the response carries a refreshed cookie so the client's expiry
//! keeps mirroring the stored one.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use mediary_core::AppError;

use crate::auth::cookie::{clear_session_cookie, extract_session_token, session_cookie};
use crate::auth::models::CurrentUser;
use crate::error::HttpAppError;
use crate::state::AppState;

pub async fn session_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let cookie_name = &state.config.session.cookie_name;
    let secure = state.config.session.cookie_secure;

    let Some(token) = extract_session_token(request.headers(), cookie_name) else {
        return HttpAppError(AppError::Unauthorized("Not authenticated".to_string()))
            .into_response();
    };

    let validated = match state.sessions.validate_session(&token).await {
        Ok(Some(validated)) => validated,
        Ok(None) => {
            // Unknown or expired token: answer 401 and drop the dead cookie.
            let mut response =
                HttpAppError(AppError::Unauthorized("Not authenticated".to_string()))
                    .into_response();
            if let Ok(value) = HeaderValue::from_str(&clear_session_cookie(cookie_name, secure)) {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            return response;
        }
        Err(e) => return HttpAppError(e).into_response(),
    };

    let renewed_cookie = validated.renewed.then(|| {
        session_cookie(
            cookie_name,
            &validated.session.token,
            validated.session.expires_at,
            secure,
        )
    });

    request.extensions_mut().insert(CurrentUser {
        user: validated.user,
        session: validated.session,
    });

    let mut response = next.run(request).await;

    if let Some(cookie) = renewed_cookie {
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }

    response
}
