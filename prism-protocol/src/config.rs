use serde::{Deserialize, Serialize};

use prism_core::errors::ConfigError;

/// Default block sentinels. Chosen for their near-zero collision rate with
/// natural model output; deployments can rebind all four markers.
pub const DEFAULT_START_SENTINEL: &str = "<<<[TOOL_REQUEST]>>>";
pub const DEFAULT_END_SENTINEL: &str = "<<<[END_TOOL_REQUEST]>>>";
pub const DEFAULT_VALUE_OPEN: &str = "「始」";
pub const DEFAULT_VALUE_CLOSE: &str = "「末」";

/// Parser configuration. Sentinels and value markers are literals; the
/// parser escapes them before any of them reaches a regex, so metacharacters
/// in the defaults (or in custom markers) are safe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Line that opens a block.
    pub start_sentinel: String,
    /// Line that closes a block.
    pub end_sentinel: String,
    /// Marker before a bracketed field value.
    pub value_open: String,
    /// Marker after a bracketed field value.
    pub value_close: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            start_sentinel: DEFAULT_START_SENTINEL.to_string(),
            end_sentinel: DEFAULT_END_SENTINEL.to_string(),
            value_open: DEFAULT_VALUE_OPEN.to_string(),
            value_close: DEFAULT_VALUE_CLOSE.to_string(),
        }
    }
}

impl ParserConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("start_sentinel", &self.start_sentinel),
            ("end_sentinel", &self.end_sentinel),
            ("value_open", &self.value_open),
            ("value_close", &self.value_close),
        ] {
            if value.is_empty() {
                return Err(ConfigError::EmptyValue { field });
            }
        }
        // Identical sentinels make open and close indistinguishable.
        if self.start_sentinel == self.end_sentinel {
            return Err(ConfigError::InvalidPattern {
                name: "end_sentinel".to_string(),
                reason: "must differ from start_sentinel".to_string(),
            });
        }
        Ok(())
    }
}
