use async_trait::async_trait;

use crate::errors::PrismResult;
use crate::models::{BackendHealth, BackendQuery, MemoryHit};

/// A heterogeneous memory backend. The single required capability is a
/// ranked query; the coordinator trusts the ordering of the returned list
/// and imposes nothing about how the backend ranks internally.
#[async_trait]
pub trait IMemoryBackend: Send + Sync {
    /// Stable identifier, used in requests, weights, and failure lists.
    fn id(&self) -> &str;

    /// Execute one query, best hits first, at most `query.k` of them.
    async fn query(&self, query: &BackendQuery) -> PrismResult<Vec<MemoryHit>>;
}

/// Optional capability: backends that need a startup step before their
/// first query (connection pools, index warm-up).
#[async_trait]
pub trait Initializable: Send + Sync {
    async fn initialize(&self) -> PrismResult<()>;
}

/// Optional capability: backends that can be probed for liveness.
#[async_trait]
pub trait HealthCheckable: Send + Sync {
    async fn health_check(&self) -> PrismResult<BackendHealth>;
}

/// Optional capability: backends holding resources that need an orderly
/// shutdown.
#[async_trait]
pub trait Closeable: Send + Sync {
    async fn close(&self) -> PrismResult<()>;
}
