//! Error taxonomy for the Prism workspace.
//!
//! Each subsystem owns a small thiserror enum; `PrismError` is the umbrella
//! callers match on at the boundary. Config rejection is always synchronous
//! and leaves held state untouched.

mod config_error;
mod embedding_error;
mod retrieval_error;

pub use config_error::ConfigError;
pub use embedding_error::EmbeddingError;
pub use retrieval_error::RetrievalError;

/// Umbrella error for all Prism subsystems.
#[derive(Debug, thiserror::Error)]
pub enum PrismError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("backend '{backend_id}' failed: {reason}")]
    Backend { backend_id: String, reason: String },
}

/// Convenience alias used across the workspace.
pub type PrismResult<T> = Result<T, PrismError>;
