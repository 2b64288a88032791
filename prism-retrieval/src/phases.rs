//! Pure helpers for the Lens, Expansion, Focus pipeline: tag statistics,
//! candidate pooling, and the focus re-scorer.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use prism_core::models::MemoryHit;
use prism_core::similarity::cosine_similarity;

use crate::fusion::BackendList;

/// Most frequent tags across the lens hits, highest count first, ties
/// alphabetical, at most `max_terms` of them.
pub(crate) fn top_tags(lists: &[BackendList], max_terms: usize) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for list in lists {
        for hit in &list.hits {
            for tag in &hit.metadata.tags {
                *counts.entry(tag.as_str()).or_default() += 1;
            }
        }
    }
    let mut tags: Vec<(&str, usize)> = counts.into_iter().collect();
    tags.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    tags.truncate(max_terms);
    tags.into_iter().map(|(tag, _)| tag.to_string()).collect()
}

/// Merge lens and expansion results into one candidate pool per backend.
/// The first occurrence of an id wins, so a lens copy is never displaced
/// by an expansion copy of the same item.
pub(crate) fn merge_pools(lens: Vec<BackendList>, expansions: Vec<BackendList>) -> Vec<BackendList> {
    let mut pools: BTreeMap<String, (Vec<MemoryHit>, HashSet<String>)> = BTreeMap::new();
    for list in lens.into_iter().chain(expansions) {
        let (pool, seen) = pools.entry(list.backend_id).or_default();
        for hit in list.hits {
            if seen.insert(hit.id.clone()) {
                pool.push(hit);
            }
        }
    }
    pools
        .into_iter()
        .map(|(backend_id, (hits, _))| BackendList { backend_id, hits })
        .collect()
}

/// Re-score every pooled candidate and reorder each backend's pool, best
/// first. Scores are cosine similarity against the query embedding when
/// candidate vectors are supplied, token overlap with the query text
/// otherwise. The sort is stable, so equal scores keep their pool order.
pub(crate) fn rescore_pools(
    pools: &mut [BackendList],
    query: &str,
    query_embedding: Option<&[f32]>,
    candidate_embeddings: Option<&HashMap<String, Vec<f32>>>,
) {
    let query_tokens = tokenize(query);
    for pool in pools.iter_mut() {
        for hit in &mut pool.hits {
            let vector = candidate_embeddings.and_then(|map| map.get(&hit.id));
            hit.score = match (query_embedding, vector) {
                (Some(q), Some(v)) => cosine_similarity(q, v),
                _ => token_overlap(&query_tokens, &hit.content),
            };
        }
        pool.hits
            .sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    }
}

/// Lowercased alphanumeric tokens of at least two characters.
pub(crate) fn tokenize(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 2)
        .map(str::to_lowercase)
        .collect()
}

/// Fraction of the query's tokens present in `content`, in `[0, 1]`.
pub(crate) fn token_overlap(query_tokens: &HashSet<String>, content: &str) -> f64 {
    if query_tokens.is_empty() {
        return 0.0;
    }
    let content_tokens = tokenize(content);
    let shared = query_tokens
        .iter()
        .filter(|t| content_tokens.contains(*t))
        .count();
    shared as f64 / query_tokens.len() as f64
}
