//! Application setup and initialization
//!
//! All initialization logic lives here rather than in main.rs, so tests and
//! embedders can assemble the same application from their own stores.

pub mod database;
pub mod routes;
pub mod server;
pub mod storage;

use std::sync::Arc;

use anyhow::{Context, Result};
use mediary_core::Config;
use mediary_db::{SessionRepository, UploadIntentRepository, UserRepository};
use mediary_services::{IdentityService, SessionService, SweepService, UploadService};

use crate::state::AppState;

/// Hygiene sweep cadence and the age past which a PENDING intent is reported.
const SWEEP_INTERVAL_SECS: u64 = 3600;
const STALE_PENDING_HOURS: i64 = 24;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    config
        .validate()
        .context("Configuration validation failed")?;

    init_tracing();
    tracing::info!("Configuration loaded and validated successfully");

    let pool = database::setup_database(&config).await?;
    let issuer = storage::setup_storage(&config)?;

    let users = Arc::new(UserRepository::new(pool.clone()));
    let sessions = Arc::new(SessionRepository::new(pool.clone()));
    let intents = Arc::new(UploadIntentRepository::new(pool.clone()));

    let config = Arc::new(config);
    let state = Arc::new(AppState::new(
        config.clone(),
        SessionService::new(sessions.clone(), config.session.clone()),
        IdentityService::new(users),
        UploadService::new(intents.clone(), issuer, config.upload.clone()),
    ));

    // Detached hygiene task; lazy expiry keeps correctness without it.
    Arc::new(SweepService::new(
        sessions,
        intents,
        SWEEP_INTERVAL_SECS,
        chrono::Duration::hours(STALE_PENDING_HOURS),
    ))
    .start();

    let router = routes::build_router(&state.config, state.clone())?;

    Ok((state, router))
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
