//! Storage configuration.

use serde::Deserialize;

/// Trade ledger persistence settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    pub path: Option<String>,
    /// Maximum number of pooled connections.
    pub max_connections: Option<u32>,
}
