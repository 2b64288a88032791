/// Configuration validation errors.
///
/// Raised synchronously by constructors and `update_config` methods before
/// any held state is mutated.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid pattern '{name}': {reason}")]
    InvalidPattern { name: String, reason: String },

    #[error("{field} out of range: {value} (allowed {min}..={max})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{field} must not be empty")]
    EmptyValue { field: &'static str },

    #[error("{field} must be positive")]
    NotPositive { field: &'static str },

    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },
}
