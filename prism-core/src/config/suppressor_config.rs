use serde::{Deserialize, Serialize};

use super::defaults;
use crate::errors::ConfigError;

/// How generated text is segmented into claims.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimSplit {
    /// Split on sentence terminators and newlines.
    #[default]
    Sentence,
    /// Additionally split on `;` and `,`, yielding finer claims.
    Clause,
}

/// What auto-revision does with an unsupported claim.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisionStyle {
    /// Keep the claim, append an explicit unverified marker.
    #[default]
    Hedge,
    /// Delete the claim outright.
    Remove,
}

/// Suppressor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuppressorConfig {
    pub claim_split_strategy: ClaimSplit,
    /// Claims scoring below this against every reference become detections.
    pub support_threshold: f64,
    /// Rewrite the text when overall confidence drops below the minimum.
    pub auto_revise: bool,
    pub min_overall_confidence: f64,
    pub revision_style: RevisionStyle,
    /// Count a claim repeated verbatim from the query or history as
    /// supported, so the engine does not flag the user's own words.
    pub treat_history_as_support: bool,
}

impl Default for SuppressorConfig {
    fn default() -> Self {
        Self {
            claim_split_strategy: ClaimSplit::default(),
            support_threshold: defaults::DEFAULT_SUPPORT_THRESHOLD,
            auto_revise: false,
            min_overall_confidence: defaults::DEFAULT_MIN_OVERALL_CONFIDENCE,
            revision_style: RevisionStyle::default(),
            treat_history_as_support: true,
        }
    }
}

impl SuppressorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("support_threshold", self.support_threshold),
            ("min_overall_confidence", self.min_overall_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange {
                    field,
                    value,
                    min: 0.0,
                    max: 1.0,
                });
            }
        }
        Ok(())
    }

    /// Apply a partial update, validating before anything is returned.
    pub fn merged(&self, patch: SuppressorConfigPatch) -> Result<Self, ConfigError> {
        let mut next = self.clone();
        if let Some(v) = patch.claim_split_strategy {
            next.claim_split_strategy = v;
        }
        if let Some(v) = patch.support_threshold {
            next.support_threshold = v;
        }
        if let Some(v) = patch.auto_revise {
            next.auto_revise = v;
        }
        if let Some(v) = patch.min_overall_confidence {
            next.min_overall_confidence = v;
        }
        if let Some(v) = patch.revision_style {
            next.revision_style = v;
        }
        if let Some(v) = patch.treat_history_as_support {
            next.treat_history_as_support = v;
        }
        next.validate()?;
        Ok(next)
    }
}

/// Partial suppressor update.
#[derive(Debug, Clone, Default)]
pub struct SuppressorConfigPatch {
    pub claim_split_strategy: Option<ClaimSplit>,
    pub support_threshold: Option<f64>,
    pub auto_revise: Option<bool>,
    pub min_overall_confidence: Option<f64>,
    pub revision_style: Option<RevisionStyle>,
    pub treat_history_as_support: Option<bool>,
}
