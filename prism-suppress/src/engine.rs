use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use tracing::{debug, warn};

use prism_core::config::{RevisionStyle, SuppressorConfig, SuppressorConfigPatch};
use prism_core::errors::ConfigError;
use prism_core::models::{Detection, KnowledgeReference, SuppressionResult};
use prism_core::similarity::cosine_similarity;
use prism_core::traits::IEmbeddingProvider;

use crate::segment::{self, Claim};
use crate::support;

const TERMINATORS: [char; 5] = ['.', '!', '?', ';', ','];

/// Everything the engine needs besides the text itself.
///
/// Groups the retrieval output and conversation state so `suppress` does
/// not take a parameter per source.
#[derive(Clone, Copy)]
pub struct SuppressionContext<'a> {
    /// Prior turns, used to avoid flagging restatements of earlier text.
    pub conversation_history: &'a [String],
    /// Retrieved knowledge the claims are checked against.
    pub knowledge_base: &'a [KnowledgeReference],
    /// The query that produced the text under check.
    pub user_query: &'a str,
}

/// Hallucination suppressor.
///
/// Judges each claim by its best support across the knowledge base: lexical
/// token containment, or embedding cosine when both the reference carries a
/// vector and an embedder was injected. An empty knowledge base means there
/// is nothing to contradict, so the text passes through unflagged.
pub struct SuppressionEngine {
    config: SuppressorConfig,
    embedder: Option<Arc<dyn IEmbeddingProvider>>,
}

impl SuppressionEngine {
    pub fn new(config: SuppressorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            embedder: None,
        })
    }

    /// Enable the cosine signal for references that carry embeddings.
    pub fn with_embedder(mut self, embedder: Arc<dyn IEmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn config(&self) -> &SuppressorConfig {
        &self.config
    }

    /// Apply a partial config update, rejecting invalid values without
    /// mutating the held config.
    pub fn update_config(&mut self, patch: SuppressorConfigPatch) -> Result<(), ConfigError> {
        self.config = self.config.merged(patch)?;
        Ok(())
    }

    pub fn suppress(&self, text: &str, ctx: &SuppressionContext<'_>) -> SuppressionResult {
        if ctx.knowledge_base.is_empty() {
            return unflagged(text);
        }
        let claims = segment::split_claims(text, self.config.claim_split_strategy);
        if claims.is_empty() {
            return unflagged(text);
        }

        let ref_tokens: Vec<HashSet<String>> = ctx
            .knowledge_base
            .iter()
            .map(|r| support::tokenize(&r.content))
            .collect();
        let claim_vecs = self.embed_claims(&claims, ctx);

        let mut detections = Vec::new();
        let mut weighted = 0.0;
        let mut total_len = 0.0;
        for (claim, claim_vec) in claims.iter().zip(&claim_vecs) {
            let len = claim.text.chars().count() as f64;
            total_len += len;
            let (score, closest) = self.score_claim(claim, claim_vec.as_deref(), ctx, &ref_tokens);
            if score < self.config.support_threshold {
                weighted += len * score;
                detections.push(Detection {
                    span: claim.span,
                    claim_text: claim.text.to_string(),
                    confidence: 1.0 - score,
                    supporting_ref_ids: closest,
                });
            } else {
                weighted += len;
            }
        }
        let overall_confidence = if total_len > 0.0 {
            weighted / total_len
        } else {
            1.0
        };

        let mut revised_text = text.to_string();
        if self.config.auto_revise && overall_confidence < self.config.min_overall_confidence {
            revise(&mut revised_text, &detections, self.config.revision_style);
        }
        let was_modified = revised_text != text;
        debug!(
            claims = claims.len(),
            detections = detections.len(),
            overall_confidence,
            was_modified,
            "suppression pass complete"
        );
        SuppressionResult {
            detections,
            overall_confidence,
            was_modified,
            revised_text,
        }
    }

    /// Embed every claim in one batch, or return a `None` per claim when
    /// embeddings are not in play. Embedding failure downgrades the whole
    /// pass to lexical scoring rather than failing it.
    fn embed_claims(&self, claims: &[Claim<'_>], ctx: &SuppressionContext<'_>) -> Vec<Option<Vec<f32>>> {
        let want = ctx.knowledge_base.iter().any(|r| r.embedding.is_some());
        match &self.embedder {
            Some(embedder) if want && embedder.is_available() => {
                let texts: Vec<String> = claims.iter().map(|c| c.text.to_string()).collect();
                match embedder.embed_batch(&texts) {
                    Ok(vecs) if vecs.len() == claims.len() => {
                        vecs.into_iter().map(Some).collect()
                    }
                    Ok(vecs) => {
                        warn!(
                            expected = claims.len(),
                            got = vecs.len(),
                            "embedder returned a short batch, lexical scoring only"
                        );
                        vec![None; claims.len()]
                    }
                    Err(e) => {
                        warn!(error = %e, "claim embedding failed, lexical scoring only");
                        vec![None; claims.len()]
                    }
                }
            }
            _ => vec![None; claims.len()],
        }
    }

    fn score_claim(
        &self,
        claim: &Claim<'_>,
        claim_vec: Option<&[f32]>,
        ctx: &SuppressionContext<'_>,
        ref_tokens: &[HashSet<String>],
    ) -> (f64, BTreeSet<String>) {
        if self.config.treat_history_as_support && appears_verbatim(claim.text, ctx) {
            return (1.0, BTreeSet::new());
        }
        let claim_tokens = support::tokenize(claim.text);
        if claim_tokens.is_empty() {
            // Nothing checkable: pure punctuation or symbols.
            return (1.0, BTreeSet::new());
        }

        let mut best = 0.0f64;
        let mut closest = BTreeSet::new();
        for (reference, tokens) in ctx.knowledge_base.iter().zip(ref_tokens) {
            let lexical = support::containment(&claim_tokens, tokens);
            let cosine = match (claim_vec, &reference.embedding) {
                (Some(cv), Some(rv)) => cosine_similarity(cv, rv),
                _ => 0.0,
            };
            let score = lexical.max(cosine);
            if score > best + 1e-9 {
                best = score;
                closest.clear();
                closest.insert(reference.id.clone());
            } else if score > 0.0 && (best - score).abs() <= 1e-9 {
                closest.insert(reference.id.clone());
            }
        }
        (best, closest)
    }
}

fn unflagged(text: &str) -> SuppressionResult {
    SuppressionResult {
        detections: Vec::new(),
        overall_confidence: 1.0,
        was_modified: false,
        revised_text: text.to_string(),
    }
}

/// Whether the claim is a restatement of the query or an earlier turn.
fn appears_verbatim(claim: &str, ctx: &SuppressionContext<'_>) -> bool {
    let bare = claim.trim_end_matches(TERMINATORS).trim_end();
    std::iter::once(ctx.user_query)
        .chain(ctx.conversation_history.iter().map(String::as_str))
        .any(|hay| hay.contains(claim) || (!bare.is_empty() && hay.contains(bare)))
}

/// Rewrite detected spans, back-to-front so earlier spans stay valid while
/// later ones move.
fn revise(text: &mut String, detections: &[Detection], style: RevisionStyle) {
    for d in detections.iter().rev() {
        let (start, end) = d.span;
        match style {
            RevisionStyle::Hedge => {
                let claim = &text[start..end];
                let trailing = claim.len() - claim.trim_end_matches(TERMINATORS).len();
                text.insert_str(end - trailing, " (unverified)");
            }
            RevisionStyle::Remove => {
                let mut cut_end = end;
                while let Some(c) = text[cut_end..].chars().next() {
                    if !c.is_whitespace() {
                        break;
                    }
                    cut_end += c.len_utf8();
                }
                text.replace_range(start..cut_end, "");
            }
        }
    }
}
