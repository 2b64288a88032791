//! Default values referenced by the config `Default` impls.

// Suppressor
pub const DEFAULT_SUPPORT_THRESHOLD: f64 = 0.5;
pub const DEFAULT_MIN_OVERALL_CONFIDENCE: f64 = 0.7;

// Retrieval
pub const DEFAULT_RRF_CONSTANT: f64 = 60.0;
pub const DEFAULT_PER_BACKEND_TIMEOUT_MS: u64 = 2_000;
pub const DEFAULT_MIN_WEIGHT: f64 = 0.25;
pub const DEFAULT_MAX_WEIGHT: f64 = 4.0;
pub const DEFAULT_LEARNING_RATE: f64 = 0.02;

// Three-phase pipeline
pub const DEFAULT_LENS_MULTIPLIER: usize = 4;
pub const DEFAULT_MAX_EXPANSION_TERMS: usize = 4;
pub const DEFAULT_EXPANSION_K: usize = 8;
