//! Mediary Core Library
//!
//! This crate provides the domain models, error types, configuration, and
//! validation shared across all Mediary components.

pub mod config;
pub mod error;
pub mod models;
pub mod token;
pub mod validation;

// Re-export commonly used types
pub use config::{
    Config, DatabaseConfig, ServerConfig, SessionConfig, StorageConfig, UploadConfig,
};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use token::{generate_session_token, generate_user_id};
pub use validation::sanitize_file_name;
