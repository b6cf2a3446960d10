//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror.
//! Expected terminal outcomes (censorship, polling timeout) get their own
//! variants so callers branch on data rather than on message strings.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication rejected by generation service: {0}")]
    Auth(String),

    #[error("Generation service rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Generation service error: {0}")]
    Service(String),

    #[error("Request rejected by content moderation")]
    Censorship,

    #[error("Generation did not finish within {attempts} poll attempts")]
    Timeout { attempts: u32 },

    #[error("Image processing error: {0}")]
    Processing(String),
}

pub type Result<T> = std::result::Result<T, Error>;
