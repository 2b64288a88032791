use serde::{Deserialize, Serialize};

/// Stages of the three-phase retrieval pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalPhase {
    /// Cheap, wide first pass over all requested backends.
    Lens,
    /// Tag-driven widening of the candidate set.
    Expansion,
    /// Expensive re-scoring of the candidate union.
    Focus,
}

impl RetrievalPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lens => "lens",
            Self::Expansion => "expansion",
            Self::Focus => "focus",
        }
    }
}

/// What one phase did, for observability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseMetrics {
    pub phase: RetrievalPhase,
    /// Backends queried in this phase.
    pub backends_queried: usize,
    /// Distinct candidate ids alive after the phase.
    pub candidates: usize,
    /// Backends that failed or timed out during the phase.
    pub failed: usize,
    pub elapsed_ms: u64,
}
