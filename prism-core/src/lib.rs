//! # prism-core
//!
//! Foundation crate for the Prism context engine.
//! Defines all types, traits, errors, config, and constants.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod similarity;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::PrismConfig;
pub use errors::{PrismError, PrismResult};
pub use models::{FusedHit, MemoryHit, PurifyResult, SuppressionResult, ToolInvocation};
