//! gasmon configuration

use gas_insight::InsightConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::{GasmonError, GasmonResult};

/// Configuration for the gasmon dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GasmonConfig {
    /// Directory holding `state/dashboard.json`
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,

    /// Simulated refill duration in milliseconds
    #[serde(default = "default_refill_delay")]
    pub refill_delay_ms: u64,

    /// Toast lifetime in milliseconds
    #[serde(default = "default_toast_ttl")]
    pub toast_ttl_ms: u64,

    /// AI safety-tip provider
    #[serde(default)]
    pub insight: InsightConfig,
}

pub fn default_state_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(".gasmon")
}

fn default_refill_delay() -> u64 {
    1000
}

fn default_toast_ttl() -> u64 {
    3000
}

impl GasmonConfig {
    pub fn load(path: &Path) -> GasmonResult<Self> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| GasmonError::Config(format!("read {}: {e}", path.display())))?;
        serde_json::from_str(&data)
            .map_err(|e| GasmonError::Config(format!("parse {}: {e}", path.display())))
    }

    /// Like [`GasmonConfig::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> GasmonResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> GasmonResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }

    pub fn refill_delay(&self) -> Duration {
        Duration::from_millis(self.refill_delay_ms)
    }

    pub fn toast_ttl(&self) -> Duration {
        Duration::from_millis(self.toast_ttl_ms)
    }
}

impl Default for GasmonConfig {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
            refill_delay_ms: default_refill_delay(),
            toast_ttl_ms: default_toast_ttl(),
            insight: InsightConfig::default(),
        }
    }
}
