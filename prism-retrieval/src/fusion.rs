//! Weighted Reciprocal Rank Fusion.
//!
//! Pure functions over already-settled backend lists. A hit at 0-based
//! rank `r` in backend `b` contributes `weight(b, tags) / (rrf_constant + r)`
//! to its id's fused score, and contributions for one id sum across
//! backends. No I/O, no clocks; given the same lists, config, and weight
//! snapshot the output is identical.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use prism_core::config::RetrievalConfig;
use prism_core::models::{FusedHit, MemoryHit, WeightSnapshot};

/// One backend's ranked result list, as settled by the coordinator.
#[derive(Debug, Clone)]
pub struct BackendList {
    pub backend_id: String,
    pub hits: Vec<MemoryHit>,
}

/// Fuse ranked per-backend lists into one deduplicated list.
///
/// Output ordering is total: fused score descending, then the priority
/// index of the hit's primary backend, then id. The primary copy of an id
/// found in several lists is the one with the longest content; length ties
/// go to the higher-priority backend, then the lexically smaller id.
pub fn fuse(
    lists: &[BackendList],
    config: &RetrievalConfig,
    weights: &WeightSnapshot,
) -> Vec<FusedHit> {
    let mut by_id: BTreeMap<&str, FusedHit> = BTreeMap::new();

    for list in lists {
        for (rank, hit) in list.hits.iter().enumerate() {
            let weight = weights.weight_for(&list.backend_id, &hit.metadata.tags);
            let contribution = weight / (config.rrf_constant + rank as f64);

            match by_id.get_mut(hit.id.as_str()) {
                Some(existing) => {
                    existing.fused_score += contribution;
                    existing
                        .contributing_backends
                        .insert(list.backend_id.clone());
                    if prefer_as_primary(hit, &existing.hit, config) {
                        existing.hit = hit.clone();
                    }
                }
                None => {
                    let mut contributing = BTreeSet::new();
                    contributing.insert(list.backend_id.clone());
                    by_id.insert(
                        hit.id.as_str(),
                        FusedHit {
                            hit: hit.clone(),
                            fused_score: contribution,
                            contributing_backends: contributing,
                        },
                    );
                }
            }
        }
    }

    let mut fused: Vec<FusedHit> = by_id.into_values().collect();
    fused.sort_by(|a, b| {
        b.fused_score
            .partial_cmp(&a.fused_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                config
                    .priority_index(&a.hit.backend_id)
                    .cmp(&config.priority_index(&b.hit.backend_id))
            })
            .then_with(|| a.hit.id.cmp(&b.hit.id))
    });
    fused
}

/// Whether `candidate` should replace `current` as the primary copy.
/// Longest content wins; ties are broken by backend priority, then by
/// backend id, so the pick is independent of list processing order.
fn prefer_as_primary(candidate: &MemoryHit, current: &MemoryHit, config: &RetrievalConfig) -> bool {
    match candidate.content.len().cmp(&current.content.len()) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => {
            let candidate_priority = config.priority_index(&candidate.backend_id);
            let current_priority = config.priority_index(&current.backend_id);
            match candidate_priority.cmp(&current_priority) {
                Ordering::Less => true,
                Ordering::Greater => false,
                Ordering::Equal => candidate.backend_id < current.backend_id,
            }
        }
    }
}
