//! Database repositories for the data access layer
//!
//! Repositories are organized into control/ (users, sessions) and media/
//! (upload intents). Each repository is responsible for a specific domain
//! entity, implements the corresponding store trait, and performs single-row,
//! single-statement mutations only.

pub mod db;
#[cfg(feature = "memory")]
pub mod memory;

pub use db::control::{SessionRepository, SessionStore, UserRepository, UserStore};
pub use db::media::{UploadIntentRepository, UploadIntentStore};
#[cfg(feature = "memory")]
pub use memory::{InMemorySessionStore, InMemoryUploadIntentStore, InMemoryUserStore};
