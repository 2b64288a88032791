//! Engine configuration. Every struct deserializes with `#[serde(default)]`
//! so partial TOML files parse; `update_config` paths go through the patch
//! types, which validate before any held state changes.

pub mod defaults;

mod purify_config;
mod retrieval_config;
mod suppressor_config;

pub use purify_config::{PurifyConfig, PurifyConfigPatch, RedactPattern};
pub use retrieval_config::{RetrievalConfig, RetrievalConfigPatch, ThreePhaseConfig};
pub use suppressor_config::{ClaimSplit, RevisionStyle, SuppressorConfig, SuppressorConfigPatch};

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Top-level configuration covering every engine in the workspace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PrismConfig {
    pub purifier: PurifyConfig,
    pub suppressor: SuppressorConfig,
    pub retrieval: RetrievalConfig,
}

impl PrismConfig {
    /// Parse from TOML, filling missing sections and fields with defaults.
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input).map_err(|e| ConfigError::ParseFailed {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check every section. Called after parsing and by engines that are
    /// handed a full config at construction.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.purifier.validate()?;
        self.suppressor.validate()?;
        self.retrieval.validate()?;
        Ok(())
    }
}
