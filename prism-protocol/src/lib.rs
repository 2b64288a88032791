//! # prism-protocol
//!
//! Extracts structured tool invocations from free-form model output.
//! Blocks are bounded by configurable sentinel lines; malformed or
//! still-streaming blocks degrade to "fewer results", never to an error.

mod config;
mod engine;

pub use config::ParserConfig;
pub use engine::ProtocolParser;
