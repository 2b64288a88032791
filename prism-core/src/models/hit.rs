use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One query dispatched to a single backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendQuery {
    /// Target backend.
    pub backend_id: String,
    /// Query text.
    pub query: String,
    /// Maximum number of hits the backend should return.
    pub k: usize,
    /// Query embedding, computed once by the coordinator and shared with
    /// vector-capable backends. Backends without vector support ignore it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_embedding: Option<Vec<f32>>,
}

/// Structured metadata attached to a hit. Tags are first-class because they
/// drive adaptive weights and expansion; everything else goes in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitMetadata {
    pub tags: Vec<String>,
    pub source: Option<String>,
    pub extra: BTreeMap<String, String>,
}

/// One ranked result from one backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryHit {
    /// Backend-assigned identifier. Hits sharing an id across backends are
    /// treated as the same underlying item during fusion.
    pub id: String,
    /// Retrieved content.
    pub content: String,
    /// The backend's own relevance score. Only its ordering is trusted;
    /// fusion works on ranks, not raw scores.
    pub score: f64,
    /// Backend that produced this hit.
    pub backend_id: String,
    /// When the underlying item was created.
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: HitMetadata,
}

/// Identity equality: two hits are equal if they carry the same id.
/// Cross-backend copies of one item compare equal even when their content
/// snapshots differ; fusion picks the primary copy explicitly.
impl PartialEq for MemoryHit {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// A deduplicated hit after rank fusion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusedHit {
    /// The primary copy: from the contributing backend with the longest
    /// content, ties resolved toward the higher-priority backend.
    pub hit: MemoryHit,
    /// Weighted reciprocal-rank score summed across contributing backends.
    pub fused_score: f64,
    /// Every backend that returned this id.
    pub contributing_backends: BTreeSet<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(id: &str, backend: &str) -> MemoryHit {
        MemoryHit {
            id: id.to_string(),
            content: String::new(),
            score: 0.0,
            backend_id: backend.to_string(),
            created_at: Utc::now(),
            metadata: HitMetadata::default(),
        }
    }

    #[test]
    fn hit_equality_is_identity_only() {
        let a = hit("m-1", "vector");
        let b = hit("m-1", "lexical");
        let c = hit("m-2", "vector");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
