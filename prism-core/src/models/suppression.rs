use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::FusedHit;

/// A piece of retrieved knowledge used to ground generated text.
/// Immutable once constructed; the suppressor only borrows these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeReference {
    pub id: String,
    pub content: String,
    /// Where the knowledge came from (backend id, document path, URL).
    pub source: String,
    /// Content embedding when the producing backend had one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl KnowledgeReference {
    /// Build a reference from a fused retrieval hit, the usual bridge
    /// between the coordinator and the suppressor.
    pub fn from_fused(fused: &FusedHit) -> Self {
        let source = fused
            .hit
            .metadata
            .source
            .clone()
            .unwrap_or_else(|| fused.hit.backend_id.clone());
        Self {
            id: fused.hit.id.clone(),
            content: fused.hit.content.clone(),
            source,
            embedding: None,
        }
    }
}

/// One claim judged insufficiently supported by the knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    /// Byte range of the claim in the original text.
    pub span: (usize, usize),
    pub claim_text: String,
    /// `1 - support`: how confident the engine is that this claim is
    /// unsupported. Always in `[0, 1]`.
    pub confidence: f64,
    /// References that came closest to supporting the claim. May be empty
    /// when nothing scored above zero.
    pub supporting_ref_ids: BTreeSet<String>,
}

/// Outcome of a suppression pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuppressionResult {
    pub detections: Vec<Detection>,
    /// Length-weighted average support over all claims, in `[0, 1]`.
    /// Exactly 1.0 when nothing was flagged.
    pub overall_confidence: f64,
    /// Whether `revised_text` differs from the input.
    pub was_modified: bool,
    /// The input text, revised when auto-revision fired, verbatim otherwise.
    pub revised_text: String,
}
