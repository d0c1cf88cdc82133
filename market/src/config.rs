//! Service configuration with TOML file support.

use serde::{Deserialize, Serialize};

use fairlance_types::MarketParams;

use crate::MarketError;

/// Configuration for the market service.
///
/// Can be loaded from a TOML file via [`MarketConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Engine parameters (quorum, point values, voting windows).
    #[serde(default)]
    pub params: MarketParams,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl MarketConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, MarketError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| MarketError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, MarketError> {
        toml::from_str(s).map_err(|e| MarketError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("MarketConfig is always serializable to TOML")
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            params: MarketParams::default(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}
