use std::collections::HashSet;

use chrono::Utc;
use proptest::prelude::*;

use prism_core::config::RetrievalConfig;
use prism_core::models::{
    AdaptiveWeight, FeedbackSignal, HitMetadata, MemoryHit, WeightKey, WeightSnapshot,
};
use prism_retrieval::{fuse, AdaptiveWeightStore, BackendList};

fn make_hit(id: String, backend_id: &str, content_len: usize, tags: Vec<String>) -> MemoryHit {
    MemoryHit {
        id,
        content: "x".repeat(content_len),
        score: 0.0,
        backend_id: backend_id.to_string(),
        created_at: Utc::now(),
        metadata: HitMetadata {
            tags,
            ..HitMetadata::default()
        },
    }
}

/// Ranked lists for up to `max_backends` backends. Ids are drawn from a
/// small pool so cross-backend duplicates are common; within one backend
/// an id appears at most once.
fn arb_lists(max_backends: usize) -> impl Strategy<Value = Vec<BackendList>> {
    let raw_hit = (0u8..12, 0usize..40, proptest::collection::vec(0u8..4, 0..3));
    let raw_hits = proptest::collection::vec(raw_hit, 0..8);
    proptest::collection::vec(raw_hits, 1..=max_backends).prop_map(|backends| {
        backends
            .into_iter()
            .enumerate()
            .map(|(index, raw)| {
                let backend_id = format!("backend-{index}");
                let mut seen = HashSet::new();
                let hits = raw
                    .into_iter()
                    .filter_map(|(id_index, content_len, tag_indexes)| {
                        let id = format!("m-{id_index}");
                        if !seen.insert(id.clone()) {
                            return None;
                        }
                        let tags = tag_indexes
                            .into_iter()
                            .map(|t| format!("tag-{t}"))
                            .collect();
                        Some(make_hit(id, &backend_id, content_len, tags))
                    })
                    .collect();
                BackendList { backend_id, hits }
            })
            .collect()
    })
}

fn input_ids(lists: &[BackendList]) -> HashSet<String> {
    lists
        .iter()
        .flat_map(|l| l.hits.iter().map(|h| h.id.clone()))
        .collect()
}

fn arb_signal() -> impl Strategy<Value = FeedbackSignal> {
    prop_oneof![
        Just(FeedbackSignal::Confirm),
        Just(FeedbackSignal::Reject),
        (-0.5f64..=0.5).prop_map(FeedbackSignal::Adjust),
    ]
}

// ── Fusion invariants ─────────────────────────────────────────────────────

proptest! {
    #[test]
    fn fused_ids_are_unique_and_cover_the_inputs(lists in arb_lists(3)) {
        let fused = fuse(&lists, &RetrievalConfig::default(), &WeightSnapshot::default());

        let mut output_ids = HashSet::new();
        for item in &fused {
            prop_assert!(output_ids.insert(item.hit.id.clone()), "duplicate {}", item.hit.id);
            prop_assert!(!item.contributing_backends.is_empty());
        }
        prop_assert_eq!(output_ids, input_ids(&lists));
    }

    #[test]
    fn fused_scores_never_increase_down_the_list(lists in arb_lists(3)) {
        let fused = fuse(&lists, &RetrievalConfig::default(), &WeightSnapshot::default());
        for pair in fused.windows(2) {
            prop_assert!(pair[0].fused_score >= pair[1].fused_score);
        }
    }

    #[test]
    fn reversing_two_lists_changes_nothing(lists in arb_lists(2)) {
        let config = RetrievalConfig::default();
        let snapshot = WeightSnapshot::default();
        let forward = fuse(&lists, &config, &snapshot);

        let mut reversed_input = lists.clone();
        reversed_input.reverse();
        let reversed = fuse(&reversed_input, &config, &snapshot);

        let forward_ids: Vec<&str> = forward.iter().map(|f| f.hit.id.as_str()).collect();
        let reversed_ids: Vec<&str> = reversed.iter().map(|f| f.hit.id.as_str()).collect();
        prop_assert_eq!(forward_ids, reversed_ids);
        for (a, b) in forward.iter().zip(reversed.iter()) {
            prop_assert_eq!(a.fused_score, b.fused_score);
        }
    }

    #[test]
    fn raising_a_base_weight_never_lowers_any_score(
        lists in arb_lists(3),
        boost in 0.1f64..2.0,
    ) {
        let config = RetrievalConfig::default();
        let neutral = fuse(&lists, &config, &WeightSnapshot::default());

        let mut snapshot = WeightSnapshot::default();
        snapshot.insert(WeightKey::base("backend-0"), AdaptiveWeight::new(1.0 + boost));
        let boosted = fuse(&lists, &config, &snapshot);

        for item in &neutral {
            let after = boosted
                .iter()
                .find(|b| b.hit.id == item.hit.id)
                .expect("same id set");
            prop_assert!(after.fused_score >= item.fused_score - 1e-12);
            if item.contributing_backends.contains("backend-0") {
                prop_assert!(after.fused_score > item.fused_score);
            }
        }
    }
}

// ── Weight store invariants ───────────────────────────────────────────────

proptest! {
    #[test]
    fn weights_stay_clamped_under_any_signal_sequence(
        signals in proptest::collection::vec((0u8..3, 0u8..3, arb_signal()), 0..40),
    ) {
        let store = AdaptiveWeightStore::new(0.25, 4.0);
        for (backend_index, tag_index, signal) in signals {
            let backend_id = format!("backend-{backend_index}");
            let tag = format!("tag-{tag_index}");
            let value = store
                .apply_feedback(&backend_id, &tag, signal)
                .expect("bounded signals are accepted");
            prop_assert!((0.25..=4.0).contains(&value));
        }
        for (_, weight) in store.snapshot().iter() {
            prop_assert!((0.25..=4.0).contains(&weight.value));
        }
    }

    #[test]
    fn export_import_roundtrips_the_store(
        signals in proptest::collection::vec((0u8..3, 0u8..3, arb_signal()), 0..30),
    ) {
        let store = AdaptiveWeightStore::new(0.25, 4.0);
        for (backend_index, tag_index, signal) in signals {
            let _ = store.apply_feedback(
                &format!("backend-{backend_index}"),
                &format!("tag-{tag_index}"),
                signal,
            );
        }

        let exported = store.export();
        let restored = AdaptiveWeightStore::new(0.25, 4.0);
        restored.import(&exported);
        prop_assert_eq!(restored.snapshot(), exported);
    }
}
