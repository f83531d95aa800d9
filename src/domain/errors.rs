//! Typed failures of a search run

use thiserror::Error;

/// Rejected before a run starts; no state transition happens
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("no items to search")]
    NoItems,

    #[error("qualifier is empty")]
    EmptyQualifier,

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Navigation or page-execution failure; fatal for the run
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("page execution failed: {reason}")]
    Execution { reason: String },

    #[error("page session is closed")]
    Closed,
}

impl SessionError {
    pub fn navigation(url: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Navigation { url: url.into(), reason: reason.to_string() }
    }

    pub fn execution(reason: impl std::fmt::Display) -> Self {
        Self::Execution { reason: reason.to_string() }
    }
}

/// Why `run` refused to start
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("a search run is already in progress")]
    AlreadyRunning,
}
