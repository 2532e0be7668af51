//! Error types for the engine

use cumulo_core::ProviderError;
use thiserror::Error;

/// Engine result type
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur in the engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// Account identity could not be resolved. Fatal: aborts the aggregate,
    /// never isolated.
    #[error("account resolution failed: {0}")]
    AccountResolution(#[source] ProviderError),

    /// Provider error that escaped outside a fan-out boundary
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl EngineError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
