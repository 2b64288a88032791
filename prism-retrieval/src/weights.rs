//! Adaptive backend weights, learned from feedback.

use dashmap::DashMap;
use tracing::debug;

use prism_core::config::RetrievalConfig;
use prism_core::constants::{MAX_FEEDBACK_ADJUST, NEUTRAL_WEIGHT};
use prism_core::errors::ConfigError;
use prism_core::models::{AdaptiveWeight, FeedbackSignal, WeightKey, WeightSnapshot};

/// Fixed boost applied for a `Confirm` signal.
pub const CONFIRM_BOOST: f64 = 0.05;

/// Fixed penalty applied for a `Reject` signal.
pub const REJECT_PENALTY: f64 = 0.10;

/// Process-wide store of per-backend, per-tag boost weights.
///
/// Writes go through the shard locks of the underlying map, so concurrent
/// feedback for the same key serializes. Readers take a [`WeightSnapshot`];
/// fusion never reads the live map. The store holds no persistence of its
/// own, external layers export and import snapshots.
pub struct AdaptiveWeightStore {
    weights: DashMap<WeightKey, AdaptiveWeight>,
    min_weight: f64,
    max_weight: f64,
}

impl AdaptiveWeightStore {
    /// Create a store clamping every weight into `[min_weight, max_weight]`.
    pub fn new(min_weight: f64, max_weight: f64) -> Self {
        Self {
            weights: DashMap::new(),
            min_weight,
            max_weight,
        }
    }

    /// Apply one external feedback signal and return the new clamped value.
    ///
    /// An `Adjust` delta that is not finite or exceeds the accepted bound
    /// is rejected without touching the stored weight.
    pub fn apply_feedback(
        &self,
        backend_id: &str,
        tag: &str,
        signal: FeedbackSignal,
    ) -> Result<f64, ConfigError> {
        let delta = match signal {
            FeedbackSignal::Confirm => CONFIRM_BOOST,
            FeedbackSignal::Reject => -REJECT_PENALTY,
            FeedbackSignal::Adjust(delta) => {
                if !delta.is_finite() || delta.abs() > MAX_FEEDBACK_ADJUST {
                    return Err(ConfigError::OutOfRange {
                        field: "feedback.delta",
                        value: delta,
                        min: -MAX_FEEDBACK_ADJUST,
                        max: MAX_FEEDBACK_ADJUST,
                    });
                }
                delta
            }
        };
        let value = self.nudge(backend_id, tag, delta);
        debug!(backend_id, tag, delta, value, "applied feedback");
        Ok(value)
    }

    /// Shift one weight by `delta` and return the new clamped value. The
    /// coordinator's learning pass uses this directly; unlike `Adjust`
    /// feedback the delta is not bounded, only the result is.
    pub(crate) fn nudge(&self, backend_id: &str, tag: &str, delta: f64) -> f64 {
        let mut entry = self
            .weights
            .entry(WeightKey::new(backend_id, tag))
            .or_insert_with(|| AdaptiveWeight::new(NEUTRAL_WEIGHT));
        let next = (entry.value + delta).clamp(self.min_weight, self.max_weight);
        *entry = AdaptiveWeight::new(next);
        next
    }

    /// Effective weight for a hit from `backend_id` carrying `tags`. Same
    /// fallback chain as [`WeightSnapshot::weight_for`]: tag weight, then
    /// the backend's base weight, then 1.0.
    pub fn weight_for(&self, backend_id: &str, tags: &[String]) -> f64 {
        let base = self
            .weights
            .get(&WeightKey::base(backend_id))
            .map_or(NEUTRAL_WEIGHT, |w| w.value);
        if tags.is_empty() {
            return base;
        }
        let sum: f64 = tags
            .iter()
            .map(|tag| {
                self.weights
                    .get(&WeightKey::new(backend_id, tag.as_str()))
                    .map_or(base, |w| w.value)
            })
            .sum();
        sum / tags.len() as f64
    }

    /// Immutable, deterministically ordered view of every weight.
    pub fn snapshot(&self) -> WeightSnapshot {
        let mut snapshot = WeightSnapshot::default();
        for entry in self.weights.iter() {
            snapshot.insert(entry.key().clone(), *entry.value());
        }
        snapshot
    }

    /// Snapshot under its persistence-facing name; pairs with [`import`].
    ///
    /// [`import`]: AdaptiveWeightStore::import
    pub fn export(&self) -> WeightSnapshot {
        self.snapshot()
    }

    /// Replace the store contents from a persisted snapshot. Values outside
    /// this store's bounds are clamped on the way in.
    pub fn import(&self, snapshot: &WeightSnapshot) {
        self.weights.clear();
        for (key, weight) in snapshot.iter() {
            self.weights.insert(
                key.clone(),
                AdaptiveWeight {
                    value: weight.value.clamp(self.min_weight, self.max_weight),
                    last_updated: weight.last_updated,
                },
            );
        }
        debug!(entries = self.weights.len(), "imported weight snapshot");
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Drop every learned weight.
    pub fn clear(&self) {
        self.weights.clear();
    }
}

impl Default for AdaptiveWeightStore {
    fn default() -> Self {
        let config = RetrievalConfig::default();
        Self::new(config.min_weight, config.max_weight)
    }
}
