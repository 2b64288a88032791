use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// One redaction rule. The pattern string is compiled by the purifier when
/// the config is applied; an uncompilable pattern rejects the whole update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactPattern {
    /// Short label, embedded in the placeholder as `[REDACTED:<name>]`.
    pub name: String,
    /// Regular expression source.
    pub pattern: String,
    /// Replacement text. Empty means use the standard placeholder.
    #[serde(default)]
    pub replacement: String,
}

/// Purifier configuration. Every transform is independently toggleable and
/// everything defaults to off, so an unconfigured purifier is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PurifyConfig {
    /// Strip HTML/XML tags, keeping only text content.
    pub strip_markup_to_plain_text: bool,
    /// Convert HTML to markdown instead of stripping. Wins over
    /// `strip_markup_to_plain_text` when both are set.
    pub convert_html_to_markdown: bool,
    /// Collapse space/tab runs and squeeze blank-line stacks.
    pub collapse_whitespace: bool,
    /// Drop exact repeats of earlier non-empty lines.
    pub deduplicate_lines: bool,
    /// Cut the text at this many characters, marker included.
    pub max_length: Option<usize>,
    /// Redaction rules, applied in order.
    pub redact_patterns: Vec<RedactPattern>,
}

impl PurifyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_length == Some(0) {
            return Err(ConfigError::NotPositive {
                field: "max_length",
            });
        }
        for p in &self.redact_patterns {
            if p.name.is_empty() {
                return Err(ConfigError::EmptyValue {
                    field: "redact_patterns.name",
                });
            }
            if p.pattern.is_empty() {
                return Err(ConfigError::EmptyValue {
                    field: "redact_patterns.pattern",
                });
            }
        }
        Ok(())
    }

    /// Apply a partial update, validating before anything is returned.
    pub fn merged(&self, patch: PurifyConfigPatch) -> Result<Self, ConfigError> {
        let mut next = self.clone();
        if let Some(v) = patch.strip_markup_to_plain_text {
            next.strip_markup_to_plain_text = v;
        }
        if let Some(v) = patch.convert_html_to_markdown {
            next.convert_html_to_markdown = v;
        }
        if let Some(v) = patch.collapse_whitespace {
            next.collapse_whitespace = v;
        }
        if let Some(v) = patch.deduplicate_lines {
            next.deduplicate_lines = v;
        }
        if let Some(v) = patch.max_length {
            next.max_length = v;
        }
        if let Some(v) = patch.redact_patterns {
            next.redact_patterns = v;
        }
        next.validate()?;
        Ok(next)
    }
}

/// Partial purifier update. `None` leaves the field alone; `max_length`
/// is doubly optional so `Some(None)` can clear an existing limit.
#[derive(Debug, Clone, Default)]
pub struct PurifyConfigPatch {
    pub strip_markup_to_plain_text: Option<bool>,
    pub convert_html_to_markdown: Option<bool>,
    pub collapse_whitespace: Option<bool>,
    pub deduplicate_lines: Option<bool>,
    pub max_length: Option<Option<usize>>,
    pub redact_patterns: Option<Vec<RedactPattern>>,
}
