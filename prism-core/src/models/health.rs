use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of probing one backend through its `HealthCheckable` capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendHealth {
    pub backend_id: String,
    pub healthy: bool,
    /// Probe detail, usually only present on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl BackendHealth {
    pub fn healthy(backend_id: impl Into<String>) -> Self {
        Self {
            backend_id: backend_id.into(),
            healthy: true,
            detail: None,
            checked_at: Utc::now(),
        }
    }

    pub fn unhealthy(backend_id: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            backend_id: backend_id.into(),
            healthy: false,
            detail: Some(detail.into()),
            checked_at: Utc::now(),
        }
    }
}
