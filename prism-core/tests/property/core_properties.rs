//! Property tests for the numeric helpers shared across the workspace.

use proptest::prelude::*;

use prism_core::models::{AdaptiveWeight, WeightKey, WeightSnapshot};
use prism_core::similarity::{cosine_similarity, l2_normalize};

fn arb_vector() -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-100.0f32..100.0, 1..16)
}

proptest! {
    #[test]
    fn cosine_stays_within_unit_bounds(a in arb_vector(), b in arb_vector()) {
        let sim = cosine_similarity(&a, &b);
        prop_assert!((-1.0..=1.0).contains(&sim));
    }

    #[test]
    fn cosine_is_symmetric(a in arb_vector(), b in arb_vector()) {
        prop_assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    }

    #[test]
    fn normalized_vectors_have_unit_or_zero_norm(mut v in arb_vector()) {
        l2_normalize(&mut v);
        let norm: f64 = v.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
        prop_assert!(norm < 1e-6 || (norm - 1.0).abs() < 1e-3);
    }

    /// The effective weight is a mean over per-tag values, each falling back
    /// to the base weight, so it can never escape the range the entries span.
    #[test]
    fn weight_for_stays_within_entry_bounds(
        base in 0.25f64..4.0,
        tag_values in proptest::collection::vec(0.25f64..4.0, 0..4),
    ) {
        let mut snapshot = WeightSnapshot::default();
        snapshot.insert(WeightKey::base("vector"), AdaptiveWeight::new(base));
        let mut tags = Vec::new();
        for (i, v) in tag_values.iter().enumerate() {
            let tag = format!("t{i}");
            snapshot.insert(
                WeightKey::new("vector", tag.as_str()),
                AdaptiveWeight::new(*v),
            );
            tags.push(tag);
        }
        // A tag without its own entry falls back to the base weight.
        tags.push("unlisted".to_string());

        let effective = snapshot.weight_for("vector", &tags);
        let lo = tag_values.iter().copied().fold(base, f64::min);
        let hi = tag_values.iter().copied().fold(base, f64::max);
        prop_assert!(effective >= lo - 1e-12);
        prop_assert!(effective <= hi + 1e-12);
    }
}
