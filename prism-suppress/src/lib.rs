//! # prism-suppress
//!
//! Flags generated claims that the retrieved knowledge base does not
//! support, and optionally revises them. Scoring combines lexical token
//! containment with embedding cosine similarity when an embedder is
//! injected; without one the engine degrades to lexical scoring.

mod engine;
mod segment;
mod support;

pub use engine::{SuppressionContext, SuppressionEngine};
