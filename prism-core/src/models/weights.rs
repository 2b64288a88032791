use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{BASE_WEIGHT_TAG, NEUTRAL_WEIGHT};

/// Identifies one adaptive weight: a backend crossed with a tag.
/// The reserved tag `"*"` holds the backend's base weight, applied to hits
/// whose tags carry no specific weight of their own.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WeightKey {
    pub backend_id: String,
    pub tag: String,
}

impl WeightKey {
    pub fn new(backend_id: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            backend_id: backend_id.into(),
            tag: tag.into(),
        }
    }

    /// Key for a backend's base weight.
    pub fn base(backend_id: impl Into<String>) -> Self {
        Self::new(backend_id, BASE_WEIGHT_TAG)
    }
}

/// A learned boost factor, clamped to the configured `[min, max]` range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveWeight {
    pub value: f64,
    pub last_updated: DateTime<Utc>,
}

impl AdaptiveWeight {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            last_updated: Utc::now(),
        }
    }
}

/// Flat row used for the snapshot's wire form. JSON maps need string keys,
/// so the snapshot serializes as a sorted row list instead of a keyed map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightRow {
    pub backend_id: String,
    pub tag: String,
    pub value: f64,
    pub last_updated: DateTime<Utc>,
}

/// Immutable, deterministic view of every adaptive weight. Fusion reads
/// weights only through a snapshot, so a concurrent update never skews the
/// ranking mid-call. External layers persist and restore this; the store
/// itself never touches disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<WeightRow>", from = "Vec<WeightRow>")]
pub struct WeightSnapshot {
    entries: BTreeMap<WeightKey, AdaptiveWeight>,
}

impl WeightSnapshot {
    pub fn get(&self, key: &WeightKey) -> Option<AdaptiveWeight> {
        self.entries.get(key).copied()
    }

    pub fn insert(&mut self, key: WeightKey, weight: AdaptiveWeight) {
        self.entries.insert(key, weight);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&WeightKey, &AdaptiveWeight)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Effective weight for a hit: the arithmetic mean over the hit's tags
    /// of each tag's weight, where a tag without its own entry falls back
    /// to the backend's base weight, and a missing base weight means 1.0.
    /// A hit without tags gets the base weight directly.
    pub fn weight_for(&self, backend_id: &str, tags: &[String]) -> f64 {
        let base = self
            .get(&WeightKey::base(backend_id))
            .map_or(NEUTRAL_WEIGHT, |w| w.value);
        if tags.is_empty() {
            return base;
        }
        let sum: f64 = tags
            .iter()
            .map(|tag| {
                self.get(&WeightKey::new(backend_id, tag.as_str()))
                    .map_or(base, |w| w.value)
            })
            .sum();
        sum / tags.len() as f64
    }
}

impl From<WeightSnapshot> for Vec<WeightRow> {
    fn from(snapshot: WeightSnapshot) -> Self {
        snapshot
            .entries
            .into_iter()
            .map(|(key, weight)| WeightRow {
                backend_id: key.backend_id,
                tag: key.tag,
                value: weight.value,
                last_updated: weight.last_updated,
            })
            .collect()
    }
}

impl From<Vec<WeightRow>> for WeightSnapshot {
    fn from(rows: Vec<WeightRow>) -> Self {
        let entries = rows
            .into_iter()
            .map(|row| {
                (
                    WeightKey::new(row.backend_id, row.tag),
                    AdaptiveWeight {
                        value: row.value,
                        last_updated: row.last_updated,
                    },
                )
            })
            .collect();
        Self { entries }
    }
}

/// External feedback applied to one weight key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackSignal {
    /// The hit was useful. Small fixed boost.
    Confirm,
    /// The hit was wrong or irrelevant. Larger fixed penalty.
    Reject,
    /// Caller-chosen delta, bounded to `[-0.5, 0.5]`.
    Adjust(f64),
}
