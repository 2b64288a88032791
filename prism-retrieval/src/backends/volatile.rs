//! In-memory backend. Useful for tests, demos, and as a seed store before
//! a real adapter is wired in; contents vanish with the process.

use std::cmp::Ordering;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use prism_core::errors::PrismResult;
use prism_core::models::{BackendHealth, BackendQuery, HitMetadata, MemoryHit};
use prism_core::traits::{Closeable, HealthCheckable, IMemoryBackend, Initializable};

use crate::phases::{token_overlap, tokenize};

#[derive(Debug, Clone)]
struct StoredItem {
    content: String,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
}

/// Volatile in-memory backend ranked by lexical overlap. Tags count toward
/// the match, so tag-driven expansion queries find tagged items even when
/// the tag never appears in the content. Query embeddings are ignored;
/// vector ranking belongs to real adapters.
pub struct VolatileBackend {
    id: String,
    items: DashMap<String, StoredItem>,
}

impl VolatileBackend {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            items: DashMap::new(),
        }
    }

    /// Store an item under a fresh v4 id and return the id.
    pub fn insert(&self, content: impl Into<String>, tags: Vec<String>) -> String {
        let id = Uuid::new_v4().to_string();
        self.insert_with_id(id.clone(), content, tags);
        id
    }

    /// Store an item under a caller-chosen id, replacing any previous item.
    pub fn insert_with_id(
        &self,
        id: impl Into<String>,
        content: impl Into<String>,
        tags: Vec<String>,
    ) {
        self.items.insert(
            id.into(),
            StoredItem {
                content: content.into(),
                tags,
                created_at: Utc::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[async_trait]
impl IMemoryBackend for VolatileBackend {
    fn id(&self) -> &str {
        &self.id
    }

    async fn query(&self, query: &BackendQuery) -> PrismResult<Vec<MemoryHit>> {
        let query_tokens = tokenize(&query.query);
        let mut hits: Vec<MemoryHit> = self
            .items
            .iter()
            .filter_map(|entry| {
                let item = entry.value();
                let content_score = token_overlap(&query_tokens, &item.content);
                let tag_score = token_overlap(&query_tokens, &item.tags.join(" "));
                let score = content_score.max(tag_score);
                if score <= 0.0 {
                    return None;
                }
                Some(MemoryHit {
                    id: entry.key().clone(),
                    content: item.content.clone(),
                    score,
                    backend_id: self.id.clone(),
                    created_at: item.created_at,
                    metadata: HitMetadata {
                        tags: item.tags.clone(),
                        ..HitMetadata::default()
                    },
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(query.k);
        Ok(hits)
    }
}

#[async_trait]
impl Initializable for VolatileBackend {
    async fn initialize(&self) -> PrismResult<()> {
        Ok(())
    }
}

#[async_trait]
impl HealthCheckable for VolatileBackend {
    async fn health_check(&self) -> PrismResult<BackendHealth> {
        Ok(BackendHealth::healthy(self.id.clone()))
    }
}

#[async_trait]
impl Closeable for VolatileBackend {
    async fn close(&self) -> PrismResult<()> {
        self.items.clear();
        Ok(())
    }
}
