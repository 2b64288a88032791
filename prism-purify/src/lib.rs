//! # prism-purify
//!
//! Sanitizes raw context text before it reaches a model. Transforms run in
//! a fixed order (markup, redaction, whitespace, dedup, truncation), each
//! recording what it changed so the output is fully auditable and the
//! change log can be replayed against the input.

mod engine;
mod markup;
mod patterns;

pub use engine::PurifyEngine;
pub use patterns::secret_presets;
