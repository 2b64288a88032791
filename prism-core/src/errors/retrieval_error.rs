/// Retrieval subsystem errors.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("all backends failed: {}", failed.join(", "))]
    AllBackendsFailed { failed: Vec<String> },

    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("unknown backend '{backend_id}'")]
    UnknownBackend { backend_id: String },
}
