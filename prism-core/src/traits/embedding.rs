use std::sync::Arc;

use crate::errors::PrismResult;
use crate::models::EmbeddingSettings;

/// Embedding generation provider.
pub trait IEmbeddingProvider: Send + Sync {
    /// Embed a single text, returning a vector of floats.
    fn embed(&self, text: &str) -> PrismResult<Vec<f32>>;

    /// Embed a batch of texts.
    fn embed_batch(&self, texts: &[String]) -> PrismResult<Vec<Vec<f32>>>;

    /// The dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// Human-readable provider name.
    fn name(&self) -> &str;

    /// Whether this provider is currently available.
    fn is_available(&self) -> bool;
}

/// Maps a request's embedding settings to a concrete provider. Injected
/// into the coordinator so provider wiring stays outside this core.
/// Returning `None` means "no embedder for these settings"; callers
/// degrade to lexical scoring rather than failing the request.
pub trait IEmbedderResolver: Send + Sync {
    fn resolve(&self, settings: Option<&EmbeddingSettings>)
        -> Option<Arc<dyn IEmbeddingProvider>>;
}

/// Resolver that ignores the settings and always hands back the one
/// provider it was constructed with. Suits deployments wired to a
/// single embedder.
pub struct FixedEmbedder {
    provider: Arc<dyn IEmbeddingProvider>,
}

impl FixedEmbedder {
    pub fn new(provider: Arc<dyn IEmbeddingProvider>) -> Self {
        Self { provider }
    }
}

impl IEmbedderResolver for FixedEmbedder {
    fn resolve(
        &self,
        _settings: Option<&EmbeddingSettings>,
    ) -> Option<Arc<dyn IEmbeddingProvider>> {
        Some(Arc::clone(&self.provider))
    }
}
