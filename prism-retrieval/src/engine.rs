//! The retrieval coordinator: concurrent fan-out over registered backends,
//! weighted rank fusion of whatever settled, and the optional three-phase
//! pipeline. One slow backend never stalls a search past its own timeout,
//! and one failed backend never fails the call while another answered.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinSet;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use prism_core::config::{RetrievalConfig, RetrievalConfigPatch};
use prism_core::constants::{BASE_WEIGHT_TAG, MAX_BACKEND_K};
use prism_core::errors::{ConfigError, PrismResult, RetrievalError};
use prism_core::models::{
    BackendQuery, FeedbackSignal, FusedHit, MemoryHit, PhaseMetrics, RetrievalPhase,
    SearchRequest, SearchResponse,
};
use prism_core::traits::{IEmbedderResolver, IEmbeddingProvider};

use crate::embedding::QueryEmbeddingCache;
use crate::fusion::{self, BackendList};
use crate::phases;
use crate::registry::BackendRegistry;
use crate::weights::AdaptiveWeightStore;

/// Lifecycle of one search call, surfaced through tracing events. Control
/// flow follows these states; they exist so operators can line up logs
/// with what the coordinator was doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RetrievalState {
    Idle,
    Dispatched,
    Running,
    Succeeded,
    Failed,
    TimedOut,
    Fusing,
    Done,
    AllFailed,
}

impl RetrievalState {
    fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Dispatched => "dispatched",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
            Self::Fusing => "fusing",
            Self::Done => "done",
            Self::AllFailed => "all_failed",
        }
    }
}

/// What one fan-out pass settled: ranked lists from backends that
/// answered, ordered by the priority list, and the ids of everything that
/// did not answer.
struct FanOut {
    lists: Vec<BackendList>,
    failed: BTreeSet<String>,
}

/// Orchestrates unified retrieval across heterogeneous backends.
///
/// Every collaborator is injected: the registry owns adapters, the weight
/// store owns learned boosts, and an optional resolver supplies embedding
/// providers per request. The coordinator itself holds no backend state,
/// so it is cheap to construct and safe to share behind an `Arc`.
pub struct RetrievalCoordinator {
    registry: Arc<BackendRegistry>,
    weights: Arc<AdaptiveWeightStore>,
    config: RetrievalConfig,
    resolver: Option<Arc<dyn IEmbedderResolver>>,
    embedding_cache: QueryEmbeddingCache,
}

impl RetrievalCoordinator {
    /// Build a coordinator over the given registry and weight store. The
    /// config is validated up front; an invalid one never produces a
    /// half-working coordinator.
    pub fn new(
        registry: Arc<BackendRegistry>,
        weights: Arc<AdaptiveWeightStore>,
        config: RetrievalConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            registry,
            weights,
            config,
            resolver: None,
            embedding_cache: QueryEmbeddingCache::new(),
        })
    }

    /// Attach an embedding resolver. Without one, every request scores
    /// lexically.
    pub fn with_embedder_resolver(mut self, resolver: Arc<dyn IEmbedderResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Apply a partial config update. A failed validation leaves the held
    /// config untouched.
    pub fn update_config(&mut self, patch: RetrievalConfigPatch) -> Result<(), ConfigError> {
        self.config = self.config.merged(patch)?;
        Ok(())
    }

    /// Route one external feedback signal to the weight store, after
    /// checking the backend is actually registered so typos in feedback
    /// plumbing surface instead of training a phantom backend.
    pub fn feedback(
        &self,
        backend_id: &str,
        tag: &str,
        signal: FeedbackSignal,
    ) -> PrismResult<f64> {
        if !self.registry.contains(backend_id) {
            return Err(RetrievalError::UnknownBackend {
                backend_id: backend_id.to_string(),
            }
            .into());
        }
        Ok(self.weights.apply_feedback(backend_id, tag, signal)?)
    }

    /// Run a search to completion.
    pub async fn search(&self, request: SearchRequest) -> PrismResult<SearchResponse> {
        self.search_with_cancellation(request, CancellationToken::new())
            .await
    }

    /// Run a search that can be interrupted. Once `cancel` fires, settled
    /// backends are fused as-is and the rest are reported in
    /// `failed_backends`; cancellation itself is not an error.
    pub async fn search_with_cancellation(
        &self,
        request: SearchRequest,
        cancel: CancellationToken,
    ) -> PrismResult<SearchResponse> {
        validate_request(&request)?;
        debug!(
            state = RetrievalState::Idle.as_str(),
            k = request.k,
            backends = request.backend_ids.len(),
            three_phase = request.use_three_phase,
            "starting search"
        );

        let response = if request.use_three_phase {
            self.run_three_phase(&request, &cancel).await?
        } else {
            self.run_single_phase(&request, &cancel).await?
        };

        if request.enable_learning {
            self.apply_learning(&response.hits);
        }

        info!(
            state = RetrievalState::Done.as_str(),
            hits = response.hits.len(),
            failed = response.failed_backends.len(),
            "search complete"
        );
        Ok(response)
    }

    async fn run_single_phase(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> PrismResult<SearchResponse> {
        let query_embedding = self.resolve_query_embedding(request);
        let outcome = self
            .fan_out(
                &request.backend_ids,
                &request.query,
                request.k,
                query_embedding.as_deref(),
                cancel,
            )
            .await;

        if outcome.lists.is_empty() {
            let failed: Vec<String> = outcome.failed.into_iter().collect();
            debug!(
                state = RetrievalState::AllFailed.as_str(),
                failed = failed.len(),
                "no backend answered"
            );
            return Err(RetrievalError::AllBackendsFailed { failed }.into());
        }

        debug!(
            state = RetrievalState::Fusing.as_str(),
            lists = outcome.lists.len(),
            "fusing settled lists"
        );
        let snapshot = self.weights.snapshot();
        let mut hits = fusion::fuse(&outcome.lists, &self.config, &snapshot);
        hits.truncate(request.k);

        Ok(SearchResponse {
            hits,
            failed_backends: outcome.failed.into_iter().collect(),
            phases: Vec::new(),
        })
    }

    async fn run_three_phase(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> PrismResult<SearchResponse> {
        let three = &self.config.three_phase;
        let mut metrics = Vec::with_capacity(3);
        let mut failed: BTreeSet<String> = BTreeSet::new();

        // Lens: cheap, wide pass without embeddings.
        let started = Instant::now();
        let lens_k = request.k.saturating_mul(three.lens_multiplier);
        let lens = self
            .fan_out(&request.backend_ids, &request.query, lens_k, None, cancel)
            .await;
        failed.extend(lens.failed.iter().cloned());
        metrics.push(phase_metrics(
            RetrievalPhase::Lens,
            request.backend_ids.len(),
            distinct_ids(&lens.lists),
            lens.failed.len(),
            started,
        ));

        if lens.lists.is_empty() {
            debug!(
                state = RetrievalState::AllFailed.as_str(),
                "no backend survived the lens phase"
            );
            return Err(RetrievalError::AllBackendsFailed {
                failed: failed.into_iter().collect(),
            }
            .into());
        }

        // Expansion: widen the pool with the lens hits' dominant tags.
        // Backends that failed the lens are excluded from here on.
        let started = Instant::now();
        let surviving: BTreeSet<String> =
            lens.lists.iter().map(|l| l.backend_id.clone()).collect();
        let terms = phases::top_tags(&lens.lists, three.max_expansion_terms);
        let mut expansions: Vec<BackendList> = Vec::new();
        let mut expansion_failed: BTreeSet<String> = BTreeSet::new();
        for term in &terms {
            if cancel.is_cancelled() {
                break;
            }
            let outcome = self
                .fan_out(&surviving, term, three.expansion_k, None, cancel)
                .await;
            expansion_failed.extend(outcome.failed);
            expansions.extend(outcome.lists);
        }
        failed.extend(expansion_failed.iter().cloned());
        let expansion_backend_count = if terms.is_empty() { 0 } else { surviving.len() };

        // An expansion failure costs a backend its extra candidates, not
        // its lens candidates.
        let mut pools = phases::merge_pools(lens.lists, expansions);
        metrics.push(phase_metrics(
            RetrievalPhase::Expansion,
            expansion_backend_count,
            distinct_ids(&pools),
            expansion_failed.len(),
            started,
        ));

        // Focus: expensive re-scoring of the pooled candidates, then the
        // same weighted fusion as the single pass.
        let started = Instant::now();
        debug!(
            state = RetrievalState::Fusing.as_str(),
            pools = pools.len(),
            "focus re-scoring pooled candidates"
        );
        let provider = self.resolve_provider(request);
        let query_embedding = provider
            .as_ref()
            .and_then(|p| self.cached_query_embedding(p.as_ref(), request));
        let candidate_embeddings = match (&provider, &query_embedding) {
            (Some(provider), Some(_)) => embed_candidates(provider.as_ref(), &pools),
            _ => None,
        };
        phases::rescore_pools(
            &mut pools,
            &request.query,
            query_embedding.as_deref(),
            candidate_embeddings.as_ref(),
        );

        let snapshot = self.weights.snapshot();
        let mut hits = fusion::fuse(&pools, &self.config, &snapshot);
        hits.truncate(request.k);
        metrics.push(phase_metrics(
            RetrievalPhase::Focus,
            pools.len(),
            hits.len(),
            0,
            started,
        ));

        Ok(SearchResponse {
            hits,
            failed_backends: failed.into_iter().collect(),
            phases: metrics,
        })
    }

    /// Fan one query out to every named backend, one task per backend,
    /// each under its own timeout. Unknown ids settle as failed without a
    /// task. Returned lists are ordered by the priority list, then id, so
    /// downstream float accumulation never depends on completion order.
    async fn fan_out(
        &self,
        backend_ids: &BTreeSet<String>,
        query: &str,
        k: usize,
        query_embedding: Option<&[f32]>,
        cancel: &CancellationToken,
    ) -> FanOut {
        let mut failed: BTreeSet<String> = BTreeSet::new();
        let mut pending: BTreeSet<String> = BTreeSet::new();
        let mut join_set = JoinSet::new();
        let per_backend = Duration::from_millis(self.config.per_backend_timeout_ms);

        for backend_id in backend_ids {
            let Some(backend) = self.registry.get(backend_id) else {
                warn!(backend_id = %backend_id, "unknown backend requested");
                failed.insert(backend_id.clone());
                continue;
            };
            let id = backend_id.clone();
            let backend_query = BackendQuery {
                backend_id: id.clone(),
                query: query.to_string(),
                k: k.min(MAX_BACKEND_K),
                query_embedding: query_embedding.map(<[f32]>::to_vec),
            };
            pending.insert(id.clone());
            join_set.spawn(async move {
                debug!(
                    state = RetrievalState::Running.as_str(),
                    backend_id = %id,
                    "querying backend"
                );
                let result = timeout(per_backend, backend.query(&backend_query)).await;
                (id, result)
            });
        }
        debug!(
            state = RetrievalState::Dispatched.as_str(),
            dispatched = pending.len(),
            unknown = failed.len(),
            "dispatched backend queries"
        );

        let mut settled: BTreeMap<String, Vec<MemoryHit>> = BTreeMap::new();
        loop {
            tokio::select! {
                next = join_set.join_next() => {
                    let Some(next) = next else { break };
                    match next {
                        Ok((id, Ok(Ok(mut hits)))) => {
                            debug!(
                                state = RetrievalState::Succeeded.as_str(),
                                backend_id = %id,
                                hits = hits.len(),
                                "backend settled"
                            );
                            pending.remove(&id);
                            // Hits are keyed by the registry id, whatever
                            // the adapter stamped.
                            for hit in &mut hits {
                                hit.backend_id = id.clone();
                            }
                            settled.insert(id, hits);
                        }
                        Ok((id, Ok(Err(e)))) => {
                            warn!(
                                state = RetrievalState::Failed.as_str(),
                                backend_id = %id,
                                error = %e,
                                "backend failed"
                            );
                            pending.remove(&id);
                            failed.insert(id);
                        }
                        Ok((id, Err(_))) => {
                            warn!(
                                state = RetrievalState::TimedOut.as_str(),
                                backend_id = %id,
                                timeout_ms = self.config.per_backend_timeout_ms,
                                "backend timed out"
                            );
                            pending.remove(&id);
                            failed.insert(id);
                        }
                        Err(e) => {
                            warn!(error = %e, "backend task join error");
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    join_set.abort_all();
                    debug!(
                        unsettled = pending.len(),
                        "search cancelled, fusing what settled"
                    );
                    break;
                }
            }
        }
        // Whatever never settled, cancelled tasks and panicked tasks
        // alike, counts as failed.
        failed.extend(pending);

        let mut lists: Vec<BackendList> = settled
            .into_iter()
            .map(|(backend_id, hits)| BackendList { backend_id, hits })
            .collect();
        lists.sort_by(|a, b| {
            self.config
                .priority_index(&a.backend_id)
                .cmp(&self.config.priority_index(&b.backend_id))
                .then_with(|| a.backend_id.cmp(&b.backend_id))
        });
        FanOut { lists, failed }
    }

    /// Nudge the weight of every (backend, tag) pair that contributed a
    /// returned hit. Failed backends are never penalized through this
    /// path; penalties only arrive as external feedback.
    fn apply_learning(&self, hits: &[FusedHit]) {
        let rate = self.config.learning_rate;
        if rate == 0.0 {
            return;
        }
        for fused in hits {
            for backend_id in &fused.contributing_backends {
                if fused.hit.metadata.tags.is_empty() {
                    self.weights.nudge(backend_id, BASE_WEIGHT_TAG, rate);
                } else {
                    for tag in &fused.hit.metadata.tags {
                        self.weights.nudge(backend_id, tag, rate);
                    }
                }
            }
        }
        debug!(hits = hits.len(), rate, "applied learning nudges");
    }

    fn resolve_query_embedding(&self, request: &SearchRequest) -> Option<Vec<f32>> {
        let provider = self.resolve_provider(request)?;
        self.cached_query_embedding(provider.as_ref(), request)
    }

    fn resolve_provider(&self, request: &SearchRequest) -> Option<Arc<dyn IEmbeddingProvider>> {
        let resolver = self.resolver.as_ref()?;
        let provider = resolver.resolve(request.embedding.as_ref())?;
        if !provider.is_available() {
            debug!(
                provider = provider.name(),
                "embedding provider unavailable, scoring lexically"
            );
            return None;
        }
        Some(provider)
    }

    fn cached_query_embedding(
        &self,
        provider: &dyn IEmbeddingProvider,
        request: &SearchRequest,
    ) -> Option<Vec<f32>> {
        let model = request
            .embedding
            .as_ref()
            .map(|settings| settings.model_id.as_str())
            .unwrap_or_default();
        let key = QueryEmbeddingCache::key(provider.name(), model, &request.query);
        if let Some(cached) = self.embedding_cache.get(&key) {
            return Some(cached);
        }
        match provider.embed(&request.query) {
            Ok(vector) => {
                self.embedding_cache.insert(key, vector.clone());
                Some(vector)
            }
            Err(e) => {
                warn!(
                    error = %e,
                    provider = provider.name(),
                    "query embedding failed, scoring lexically"
                );
                None
            }
        }
    }
}

fn validate_request(request: &SearchRequest) -> Result<(), RetrievalError> {
    if request.k == 0 {
        return Err(RetrievalError::InvalidRequest {
            reason: "k must be positive".to_string(),
        });
    }
    if request.backend_ids.is_empty() {
        return Err(RetrievalError::InvalidRequest {
            reason: "no backends requested".to_string(),
        });
    }
    Ok(())
}

/// Embed every distinct candidate's content in one batch. `None` keeps
/// the focus pass on lexical scoring.
fn embed_candidates(
    provider: &dyn IEmbeddingProvider,
    pools: &[BackendList],
) -> Option<HashMap<String, Vec<f32>>> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut ids: Vec<String> = Vec::new();
    let mut texts: Vec<String> = Vec::new();
    for pool in pools {
        for hit in &pool.hits {
            if seen.insert(hit.id.as_str()) {
                ids.push(hit.id.clone());
                texts.push(hit.content.clone());
            }
        }
    }

    match provider.embed_batch(&texts) {
        Ok(vectors) if vectors.len() == ids.len() => {
            Some(ids.into_iter().zip(vectors).collect())
        }
        Ok(vectors) => {
            warn!(
                expected = ids.len(),
                actual = vectors.len(),
                "embedding batch size mismatch, scoring lexically"
            );
            None
        }
        Err(e) => {
            warn!(error = %e, "candidate embedding failed, scoring lexically");
            None
        }
    }
}

fn distinct_ids(lists: &[BackendList]) -> usize {
    let mut seen: HashSet<&str> = HashSet::new();
    for list in lists {
        for hit in &list.hits {
            seen.insert(hit.id.as_str());
        }
    }
    seen.len()
}

fn phase_metrics(
    phase: RetrievalPhase,
    backends_queried: usize,
    candidates: usize,
    failed: usize,
    started: Instant,
) -> PhaseMetrics {
    let metrics = PhaseMetrics {
        phase,
        backends_queried,
        candidates,
        failed,
        elapsed_ms: started.elapsed().as_millis() as u64,
    };
    debug!(
        phase = phase.as_str(),
        backends = metrics.backends_queried,
        candidates = metrics.candidates,
        failed = metrics.failed,
        elapsed_ms = metrics.elapsed_ms,
        "phase complete"
    );
    metrics
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coordinator(config: RetrievalConfig) -> Result<RetrievalCoordinator, ConfigError> {
        RetrievalCoordinator::new(
            Arc::new(BackendRegistry::new()),
            Arc::new(AdaptiveWeightStore::default()),
            config,
        )
    }

    #[test]
    fn construction_rejects_invalid_config() {
        let config = RetrievalConfig {
            rrf_constant: 0.0,
            ..RetrievalConfig::default()
        };
        assert!(coordinator(config).is_err());
    }

    #[test]
    fn update_config_keeps_state_on_rejection() {
        let mut coordinator = coordinator(RetrievalConfig::default()).unwrap();
        let patch = RetrievalConfigPatch {
            learning_rate: Some(2.0),
            ..RetrievalConfigPatch::default()
        };
        assert!(coordinator.update_config(patch).is_err());
        assert!((coordinator.config().learning_rate - 0.02).abs() < 1e-9);

        let patch = RetrievalConfigPatch {
            rrf_constant: Some(10.0),
            ..RetrievalConfigPatch::default()
        };
        coordinator.update_config(patch).unwrap();
        assert!((coordinator.config().rrf_constant - 10.0).abs() < 1e-9);
    }

    #[test]
    fn requests_are_validated_before_dispatch() {
        let request = SearchRequest::new("query", 0).with_backends(["vector"]);
        assert!(matches!(
            validate_request(&request),
            Err(RetrievalError::InvalidRequest { .. })
        ));

        let request = SearchRequest::new("query", 5);
        assert!(matches!(
            validate_request(&request),
            Err(RetrievalError::InvalidRequest { .. })
        ));

        let request = SearchRequest::new("query", 5).with_backends(["vector"]);
        assert!(validate_request(&request).is_ok());
    }

    #[test]
    fn feedback_requires_known_backend() {
        let coordinator = coordinator(RetrievalConfig::default()).unwrap();
        let result = coordinator.feedback("ghost", "rust", FeedbackSignal::Confirm);
        assert!(result.is_err());
    }
}
