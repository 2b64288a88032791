//! Backend registration and capability fan-outs.

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::join_all;
use tracing::debug;

use prism_core::errors::PrismResult;
use prism_core::models::BackendHealth;
use prism_core::traits::{Closeable, HealthCheckable, IMemoryBackend, Initializable};

/// Optional capabilities registered alongside a backend. Callers attach
/// only what the adapter actually supports; lifecycle fan-outs skip the
/// rest instead of probing through downcasts.
#[derive(Default, Clone)]
pub struct BackendCapabilities {
    init: Option<Arc<dyn Initializable>>,
    health: Option<Arc<dyn HealthCheckable>>,
    close: Option<Arc<dyn Closeable>>,
}

impl BackendCapabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_init(mut self, cap: Arc<dyn Initializable>) -> Self {
        self.init = Some(cap);
        self
    }

    pub fn with_health(mut self, cap: Arc<dyn HealthCheckable>) -> Self {
        self.health = Some(cap);
        self
    }

    pub fn with_close(mut self, cap: Arc<dyn Closeable>) -> Self {
        self.close = Some(cap);
        self
    }
}

#[derive(Clone)]
struct BackendEntry {
    backend: Arc<dyn IMemoryBackend>,
    capabilities: BackendCapabilities,
}

/// Thread-safe registry of memory backends, keyed by backend id.
pub struct BackendRegistry {
    entries: DashMap<String, BackendEntry>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Register a query-only backend under its own id. Re-registering an
    /// id replaces the previous entry.
    pub fn register(&self, backend: Arc<dyn IMemoryBackend>) {
        self.register_with_capabilities(backend, BackendCapabilities::default());
    }

    /// Register a backend together with its optional lifecycle capabilities.
    pub fn register_with_capabilities(
        &self,
        backend: Arc<dyn IMemoryBackend>,
        capabilities: BackendCapabilities,
    ) {
        let id = backend.id().to_string();
        debug!(backend_id = %id, "registering backend");
        self.entries.insert(
            id,
            BackendEntry {
                backend,
                capabilities,
            },
        );
    }

    /// Remove a backend. Returns whether it was present. In-flight queries
    /// holding the backend's `Arc` finish undisturbed.
    pub fn remove(&self, backend_id: &str) -> bool {
        self.entries.remove(backend_id).is_some()
    }

    /// Look up a backend for querying.
    pub fn get(&self, backend_id: &str) -> Option<Arc<dyn IMemoryBackend>> {
        self.entries
            .get(backend_id)
            .map(|entry| Arc::clone(&entry.backend))
    }

    pub fn contains(&self, backend_id: &str) -> bool {
        self.entries.contains_key(backend_id)
    }

    /// Registered backend ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run every `Initializable` backend's startup step concurrently and
    /// report per-backend outcomes, sorted by id. One failure never stops
    /// the others.
    pub async fn initialize_all(&self) -> Vec<(String, PrismResult<()>)> {
        let targets: Vec<(String, Arc<dyn Initializable>)> = self
            .entries
            .iter()
            .filter_map(|entry| {
                let cap = entry.value().capabilities.init.clone()?;
                Some((entry.key().clone(), cap))
            })
            .collect();

        let mut results = join_all(targets.into_iter().map(|(id, cap)| async move {
            let result = cap.initialize().await;
            (id, result)
        }))
        .await;
        results.sort_by(|a, b| a.0.cmp(&b.0));
        results
    }

    /// Probe every `HealthCheckable` backend concurrently. A probe error
    /// becomes an unhealthy report rather than failing the sweep.
    pub async fn health_check_all(&self) -> Vec<BackendHealth> {
        let targets: Vec<(String, Arc<dyn HealthCheckable>)> = self
            .entries
            .iter()
            .filter_map(|entry| {
                let cap = entry.value().capabilities.health.clone()?;
                Some((entry.key().clone(), cap))
            })
            .collect();

        let mut results = join_all(targets.into_iter().map(|(id, cap)| async move {
            match cap.health_check().await {
                Ok(mut health) => {
                    // Reports are keyed by the registry id, whatever the
                    // adapter stamped.
                    health.backend_id = id;
                    health
                }
                Err(e) => BackendHealth::unhealthy(id, e.to_string()),
            }
        }))
        .await;
        results.sort_by(|a, b| a.backend_id.cmp(&b.backend_id));
        results
    }

    /// Shut down every `Closeable` backend concurrently and report
    /// per-backend outcomes, sorted by id.
    pub async fn close_all(&self) -> Vec<(String, PrismResult<()>)> {
        let targets: Vec<(String, Arc<dyn Closeable>)> = self
            .entries
            .iter()
            .filter_map(|entry| {
                let cap = entry.value().capabilities.close.clone()?;
                Some((entry.key().clone(), cap))
            })
            .collect();

        let mut results = join_all(targets.into_iter().map(|(id, cap)| async move {
            let result = cap.close().await;
            (id, result)
        }))
        .await;
        results.sort_by(|a, b| a.0.cmp(&b.0));
        results
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}
