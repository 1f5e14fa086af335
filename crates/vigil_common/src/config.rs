//! Engine configuration.
//!
//! Config file: /etc/vigil/config.toml (override with --config).
//! Every section has defaults so a missing or partial file is fine.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::complaint::Severity;

/// Dispatch tuning: radii and lookback for the nearby query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Radius for low-severity complaints, km
    #[serde(default = "default_low_radius_km")]
    pub low_radius_km: f64,
    /// Radius for medium-severity complaints, km
    #[serde(default = "default_medium_radius_km")]
    pub medium_radius_km: f64,
    /// Radius for high-severity complaints, km. Deliberately the widest:
    /// high severity casts the broadest net.
    #[serde(default = "default_high_radius_km")]
    pub high_radius_km: f64,
    /// Only complaints created within this window are dispatchable
    #[serde(default = "default_lookback_secs")]
    pub lookback_secs: u64,
}

fn default_low_radius_km() -> f64 {
    10.0
}
fn default_medium_radius_km() -> f64 {
    20.0
}
fn default_high_radius_km() -> f64 {
    200.0
}
fn default_lookback_secs() -> u64 {
    2 * 3600
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            low_radius_km: default_low_radius_km(),
            medium_radius_km: default_medium_radius_km(),
            high_radius_km: default_high_radius_km(),
            lookback_secs: default_lookback_secs(),
        }
    }
}

impl DispatchConfig {
    pub fn radius_km(&self, severity: Severity) -> f64 {
        match severity {
            Severity::Low => self.low_radius_km,
            Severity::Medium => self.medium_radius_km,
            Severity::High => self.high_radius_km,
        }
    }

    pub fn lookback(&self) -> Duration {
        Duration::from_secs(self.lookback_secs)
    }
}

/// Rejection tracking tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectionConfig {
    /// Distinct officers needed to force-close a pending complaint
    #[serde(default = "default_close_threshold")]
    pub close_threshold: usize,
    /// TTL on the per-officer exclusion set; matches the dispatch lookback
    #[serde(default = "default_index_ttl_secs")]
    pub index_ttl_secs: u64,
}

fn default_close_threshold() -> usize {
    3
}
fn default_index_ttl_secs() -> u64 {
    2 * 3600
}

impl Default for RejectionConfig {
    fn default() -> Self {
        Self {
            close_threshold: default_close_threshold(),
            index_ttl_secs: default_index_ttl_secs(),
        }
    }
}

impl RejectionConfig {
    pub fn index_ttl(&self) -> Duration {
        Duration::from_secs(self.index_ttl_secs)
    }
}

/// Notification fan-out tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Whole-list TTL, refreshed on every append
    #[serde(default = "default_list_ttl_secs")]
    pub list_ttl_secs: u64,
    /// Hard cap per user; oldest entries evicted beyond this
    #[serde(default = "default_list_cap")]
    pub list_cap: usize,
}

fn default_list_ttl_secs() -> u64 {
    30 * 60
}
fn default_list_cap() -> usize {
    50
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            list_ttl_secs: default_list_ttl_secs(),
            list_cap: default_list_cap(),
        }
    }
}

impl NotifyConfig {
    pub fn list_ttl(&self) -> Duration {
        Duration::from_secs(self.list_ttl_secs)
    }
}

/// Worker loop tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// How often the worker polls the queue for due jobs
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

fn default_tick_ms() -> u64 {
    1000
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
        }
    }
}

impl WorkerConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub rejection: RejectionConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Escalation policy JSON file; built-in ladder used when absent
    #[serde(default)]
    pub policy_path: Option<PathBuf>,
}

impl EngineConfig {
    /// Load from a TOML file, or defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }
}
