//! Configuration schema
//!
//! Configuration is stored at `~/.config/zygote/config.toml`

use crate::eval::LookupPolicy;
use crate::manifest::UNSAFE_SENTINEL;
use crate::tree::CostParams;
use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cost model settings
    pub simulation: SimulationConfig,

    /// Manifest parsing settings
    pub manifest: ManifestConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Cost model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Cost of forking a warm process, in milliseconds
    pub fork_ms: f64,

    /// Cost of starting the root process, in milliseconds
    pub cold_start_ms: f64,

    /// Default lookup policy
    pub policy: LookupPolicy,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let params = CostParams::default();
        Self {
            fork_ms: params.fork_ms,
            cold_start_ms: params.cold_start_ms,
            policy: LookupPolicy::default(),
        }
    }
}

impl SimulationConfig {
    pub fn cost_params(&self) -> CostParams {
        CostParams {
            fork_ms: self.fork_ms,
            cold_start_ms: self.cold_start_ms,
        }
    }
}

/// Manifest parsing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestConfig {
    /// Line marking the end of the package section
    pub unsafe_sentinel: String,

    /// Manifests mentioning any of these are left out of package counts
    pub url_blacklist: Vec<String>,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            unsafe_sentinel: UNSAFE_SENTINEL.to_string(),
            url_blacklist: vec!["https://".to_string(), "http://".to_string()],
        }
    }
}
