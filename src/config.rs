//! Runtime configuration, read from `config.json` in the data directory.
//!
//! ```json
//! { "namespace": "ticketapp", "mutationLatencyMs": 500, "authLatencyMs": 1500 }
//! ```
//! Every field is optional and falls back to its default.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Prefix for every persisted key.
    pub namespace: String,
    pub mutation_latency_ms: u64,
    pub auth_latency_ms: u64,
    pub success_ttl_ms: u64,
    pub default_ttl_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace: "ticketapp".to_string(),
            mutation_latency_ms: 500,
            auth_latency_ms: 1500,
            success_ttl_ms: 4000,
            default_ttl_ms: 4000,
        }
    }
}

impl Config {
    /// Load `config.json` from `dir`; a missing file yields the defaults.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Invalid config in {}", path.display()))
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        let path = dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Same settings with the simulated latency removed.
    pub fn instant(mut self) -> Self {
        self.mutation_latency_ms = 0;
        self.auth_latency_ms = 0;
        self
    }

    pub fn mutation_latency(&self) -> Duration {
        Duration::from_millis(self.mutation_latency_ms)
    }

    pub fn auth_latency(&self) -> Duration {
        Duration::from_millis(self.auth_latency_ms)
    }

    pub fn success_ttl(&self) -> Duration {
        Duration::from_millis(self.success_ttl_ms)
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }
}
