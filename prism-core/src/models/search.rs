use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{FusedHit, PhaseMetrics};

/// Per-request embedding selection, resolved into a provider by the
/// injected `IEmbedderResolver`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    pub provider_id: String,
    pub model_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// A unified retrieval request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    /// How many fused hits the caller wants. Must be positive.
    pub k: usize,
    /// Which registered backends to fan out to. Must be non-empty.
    pub backend_ids: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<EmbeddingSettings>,
    /// Nudge adaptive weights for backends that contribute top hits.
    #[serde(default)]
    pub enable_learning: bool,
    /// Run the Lens, Expansion, Focus pipeline instead of the single pass.
    #[serde(default)]
    pub use_three_phase: bool,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, k: usize) -> Self {
        Self {
            query: query.into(),
            k,
            backend_ids: BTreeSet::new(),
            embedding: None,
            enable_learning: false,
            use_three_phase: false,
        }
    }

    pub fn with_backends<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.backend_ids = ids.into_iter().map(Into::into).collect();
        self
    }
}

/// A unified retrieval response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Fused hits, best first, at most the requested `k`.
    pub hits: Vec<FusedHit>,
    /// Backends that failed, timed out, or were cancelled mid-flight.
    pub failed_backends: Vec<String>,
    /// Per-phase metrics. Empty in single-phase mode.
    #[serde(default)]
    pub phases: Vec<PhaseMetrics>,
}
