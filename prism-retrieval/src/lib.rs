//! # prism-retrieval
//!
//! Unified retrieval over heterogeneous memory backends: concurrent
//! fan-out with per-backend timeouts, weighted reciprocal rank fusion,
//! adaptive per-backend weights learned from feedback, and an optional
//! three-phase pipeline (lens, expansion, focus) for recall-heavy
//! queries. Partial backend failure degrades the result set; only total
//! failure fails a search.

mod embedding;
mod engine;
mod fusion;
mod phases;
mod registry;
mod weights;

pub mod backends;

pub use embedding::HashingEmbedder;
pub use engine::RetrievalCoordinator;
pub use fusion::{fuse, BackendList};
pub use registry::{BackendCapabilities, BackendRegistry};
pub use weights::{AdaptiveWeightStore, CONFIRM_BOOST, REJECT_PENALTY};
