use serde::{Deserialize, Serialize};

use super::defaults;
use crate::errors::ConfigError;

/// Knobs for the Lens, Expansion, Focus pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreePhaseConfig {
    /// Lens queries ask for `k * lens_multiplier` hits.
    pub lens_multiplier: usize,
    /// How many distinct tags from lens hits seed the expansion phase.
    pub max_expansion_terms: usize,
    /// Per-term k for expansion queries.
    pub expansion_k: usize,
}

impl Default for ThreePhaseConfig {
    fn default() -> Self {
        Self {
            lens_multiplier: defaults::DEFAULT_LENS_MULTIPLIER,
            max_expansion_terms: defaults::DEFAULT_MAX_EXPANSION_TERMS,
            expansion_k: defaults::DEFAULT_EXPANSION_K,
        }
    }
}

/// Retrieval coordinator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// RRF constant: each hit contributes `weight / (constant + rank)`.
    pub rrf_constant: f64,
    /// Independent timeout applied to every backend query.
    pub per_backend_timeout_ms: u64,
    /// Fixed tie-break order. Backends missing from this list sort after
    /// listed ones, alphabetically, so ordering stays total.
    pub backend_priority: Vec<String>,
    /// Lower clamp for adaptive weights.
    pub min_weight: f64,
    /// Upper clamp for adaptive weights.
    pub max_weight: f64,
    /// Post-search nudge applied when a request enables learning.
    pub learning_rate: f64,
    pub three_phase: ThreePhaseConfig,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            rrf_constant: defaults::DEFAULT_RRF_CONSTANT,
            per_backend_timeout_ms: defaults::DEFAULT_PER_BACKEND_TIMEOUT_MS,
            backend_priority: Vec::new(),
            min_weight: defaults::DEFAULT_MIN_WEIGHT,
            max_weight: defaults::DEFAULT_MAX_WEIGHT,
            learning_rate: defaults::DEFAULT_LEARNING_RATE,
            three_phase: ThreePhaseConfig::default(),
        }
    }
}

impl RetrievalConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rrf_constant <= 0.0 {
            return Err(ConfigError::NotPositive {
                field: "rrf_constant",
            });
        }
        if self.per_backend_timeout_ms == 0 {
            return Err(ConfigError::NotPositive {
                field: "per_backend_timeout_ms",
            });
        }
        if self.min_weight <= 0.0 {
            return Err(ConfigError::NotPositive { field: "min_weight" });
        }
        // Neutral weight must stay reachable, otherwise clamping pins every
        // backend above or below 1.0 permanently.
        if self.min_weight > 1.0 || self.max_weight < 1.0 {
            return Err(ConfigError::OutOfRange {
                field: "min_weight..max_weight",
                value: self.min_weight,
                min: 0.0,
                max: 1.0,
            });
        }
        if self.learning_rate < 0.0 || self.learning_rate > 1.0 {
            return Err(ConfigError::OutOfRange {
                field: "learning_rate",
                value: self.learning_rate,
                min: 0.0,
                max: 1.0,
            });
        }
        for (field, value) in [
            ("three_phase.lens_multiplier", self.three_phase.lens_multiplier),
            (
                "three_phase.max_expansion_terms",
                self.three_phase.max_expansion_terms,
            ),
            ("three_phase.expansion_k", self.three_phase.expansion_k),
        ] {
            if value == 0 {
                return Err(ConfigError::NotPositive { field });
            }
        }
        Ok(())
    }

    /// Apply a partial update, validating before anything is returned.
    pub fn merged(&self, patch: RetrievalConfigPatch) -> Result<Self, ConfigError> {
        let mut next = self.clone();
        if let Some(v) = patch.rrf_constant {
            next.rrf_constant = v;
        }
        if let Some(v) = patch.per_backend_timeout_ms {
            next.per_backend_timeout_ms = v;
        }
        if let Some(v) = patch.backend_priority {
            next.backend_priority = v;
        }
        if let Some(v) = patch.min_weight {
            next.min_weight = v;
        }
        if let Some(v) = patch.max_weight {
            next.max_weight = v;
        }
        if let Some(v) = patch.learning_rate {
            next.learning_rate = v;
        }
        if let Some(v) = patch.three_phase {
            next.three_phase = v;
        }
        next.validate()?;
        Ok(next)
    }

    /// Position of a backend in the tie-break order. Unlisted backends all
    /// share a rank after the listed ones; callers break the remaining tie
    /// alphabetically.
    pub fn priority_index(&self, backend_id: &str) -> usize {
        self.backend_priority
            .iter()
            .position(|b| b == backend_id)
            .unwrap_or(self.backend_priority.len())
    }
}

/// Partial retrieval update.
#[derive(Debug, Clone, Default)]
pub struct RetrievalConfigPatch {
    pub rrf_constant: Option<f64>,
    pub per_backend_timeout_ms: Option<u64>,
    pub backend_priority: Option<Vec<String>>,
    pub min_weight: Option<f64>,
    pub max_weight: Option<f64>,
    pub learning_rate: Option<f64>,
    pub three_phase: Option<ThreePhaseConfig>,
}
