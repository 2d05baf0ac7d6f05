//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror,
//! plus the coarse taxonomy the workflow reports to users.

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] dotenvy::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("AI provider error: {0}")]
    AiProvider(String),

    #[error("Empty response: {0}")]
    EmptyResponse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Share error: {0}")]
    Share(String),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// How a failure is classified when it reaches the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Local precondition failure; never reached the provider.
    Validation,
    /// The provider answered but returned nothing usable.
    EmptyResponse,
    /// Transport, authentication, quota or remote-side fault.
    Provider,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::EmptyResponse(_) => ErrorKind::EmptyResponse,
            _ => ErrorKind::Provider,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
