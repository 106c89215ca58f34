//! Error types for the convoctx domain.
//!
//! Uses `thiserror` for ergonomic error definitions. The processing stages
//! themselves are infallible; these errors cover loading inputs at the
//! orchestrator boundary.

use std::path::PathBuf;

use thiserror::Error;

/// The top-level error type for all convoctx operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Input errors ---
    #[error("Invalid conversation: {0}")]
    InvalidConversation(String),

    #[error("Invalid citation sources: {0}")]
    InvalidSources(String),

    #[error("Failed to read {path}: {reason}")]
    Io { path: PathBuf, reason: String },

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;
