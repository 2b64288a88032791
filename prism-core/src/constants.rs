/// Prism system version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Reserved weight tag matching any hit regardless of its tags.
pub const BASE_WEIGHT_TAG: &str = "*";

/// Weight every backend starts from before any feedback.
pub const NEUTRAL_WEIGHT: f64 = 1.0;

/// Maximum absolute delta accepted from an external Adjust signal.
pub const MAX_FEEDBACK_ADJUST: f64 = 0.5;

/// Marker appended when the purifier truncates text.
pub const TRUNCATION_MARKER: &str = " [... truncated]";

/// Maximum number of hits a single backend query may return.
pub const MAX_BACKEND_K: usize = 500;
