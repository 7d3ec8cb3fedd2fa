//! Monitor response types.

use serde::{Deserialize, Serialize};

/// Health check response.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Whether the storage root is reachable.
    pub is_healthy: bool,
    /// Storage root the server reads files from.
    pub storage_root: String,
    /// Application version.
    pub version: String,
}
