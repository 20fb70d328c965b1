//! Test helpers: build the router over in-memory stores.
//!
//! The whole HTTP surface runs against the same service layer as production,
//! with the Postgres repositories and the S3 signer swapped for their
//! in-memory counterparts. Run with `cargo test -p mediary-api`.

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum_test::TestServer;
use mediary_api::constants;
use mediary_api::setup::routes;
use mediary_api::state::AppState;
use mediary_core::models::User;
use mediary_core::{
    Config, DatabaseConfig, ServerConfig, SessionConfig, StorageConfig, UploadConfig,
};
use mediary_db::{InMemorySessionStore, InMemoryUploadIntentStore, InMemoryUserStore};
use mediary_services::{IdentityService, SessionService, UploadService};
use mediary_storage::InMemoryCapabilityIssuer;

pub const MAX_FILE_SIZE_BYTES: u64 = 100_000_000;

/// API path prefix for tests (e.g. `/api/v0`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

/// Test application: server plus handles to the in-memory stores.
pub struct TestApp {
    pub server: TestServer,
    pub users: Arc<InMemoryUserStore>,
    pub sessions: Arc<InMemorySessionStore>,
    pub intents: Arc<InMemoryUploadIntentStore>,
    pub issuer: Arc<InMemoryCapabilityIssuer>,
}

pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            port: 0,
            environment: "test".to_string(),
            cors_origins: vec!["*".to_string()],
        },
        database: DatabaseConfig {
            url: "postgresql://localhost/mediary-test".to_string(),
            max_connections: 1,
            connect_timeout_secs: 1,
        },
        session: SessionConfig {
            cookie_name: "session".to_string(),
            duration_days: 30,
            renewal_threshold_days: 15,
            cookie_secure: false,
        },
        upload: UploadConfig {
            max_file_size_bytes: MAX_FILE_SIZE_BYTES,
            signed_url_expiry_secs: 600,
            key_prefix: "uploads".to_string(),
        },
        storage: StorageConfig {
            bucket: "mediary-test".to_string(),
            region: Some("us-east-1".to_string()),
            endpoint: None,
        },
    }
}

/// Setup the app with fresh in-memory stores.
pub fn setup_test_app() -> TestApp {
    let config = Arc::new(test_config());

    let users = Arc::new(InMemoryUserStore::new());
    let sessions = Arc::new(InMemorySessionStore::new(users.clone()));
    let intents = Arc::new(InMemoryUploadIntentStore::new());
    let issuer = Arc::new(InMemoryCapabilityIssuer::new());

    let state = Arc::new(AppState::new(
        config.clone(),
        SessionService::new(sessions.clone(), config.session.clone()),
        IdentityService::new(users.clone()),
        UploadService::new(intents.clone(), issuer.clone(), config.upload.clone()),
    ));

    let router = routes::build_router(&config, state).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to start test server");

    TestApp {
        server,
        users,
        sessions,
        intents,
        issuer,
    }
}

/// Pull the session token out of a response's Set-Cookie header.
pub fn session_token_from_response(response: &axum_test::TestResponse) -> Option<String> {
    let set_cookie = response
        .headers()
        .get(axum::http::header::SET_COOKIE)?
        .to_str()
        .ok()?;
    let (pair, _attributes) = set_cookie.split_once(';')?;
    let (name, value) = pair.split_once('=')?;
    (name == "session" && !value.is_empty()).then(|| value.to_string())
}

/// Log in through the API with a verified profile, returning the created
/// user and the session token from the cookie.
pub async fn login(app: &TestApp, external_id: &str, email: &str) -> (User, String) {
    let response = app
        .server
        .post(&api_path("/auth/login"))
        .json(&serde_json::json!({
            "external_id": external_id,
            "email": email,
            "name": "Test User",
            "picture_url": null,
            "email_verified": true,
        }))
        .await;
    response.assert_status_ok();

    let user: User = response.json();
    let token = session_token_from_response(&response).expect("login must set a session cookie");
    (user, token)
}

/// Cookie header pair for an authenticated request.
pub fn cookie_header(token: &str) -> (HeaderName, HeaderValue) {
    (
        axum::http::header::COOKIE,
        HeaderValue::from_str(&format!("session={}", token)).unwrap(),
    )
}
