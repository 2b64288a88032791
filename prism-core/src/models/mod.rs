//! Shared data models. All request-scoped; the only process-wide state in
//! the workspace lives behind `AdaptiveWeightStore` in prism-retrieval.

mod health;
mod hit;
mod invocation;
mod phase;
mod purify;
mod search;
mod suppression;
mod weights;

pub use health::BackendHealth;
pub use hit::{BackendQuery, FusedHit, HitMetadata, MemoryHit};
pub use invocation::ToolInvocation;
pub use phase::{PhaseMetrics, RetrievalPhase};
pub use purify::{Modification, ModificationKind, PurifyResult};
pub use search::{EmbeddingSettings, SearchRequest, SearchResponse};
pub use suppression::{Detection, KnowledgeReference, SuppressionResult};
pub use weights::{AdaptiveWeight, FeedbackSignal, WeightKey, WeightSnapshot};
