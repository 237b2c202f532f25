//! Venue configuration.

use serde::Deserialize;

/// Settings for a single venue used as a price source.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VenueConfig {
    /// Whether this venue may be quoted.
    #[serde(default)]
    pub enabled: bool,
    /// Override for the venue REST base URL (mirrors, test servers).
    pub base_url: Option<String>,
}
