//! Run configuration, loaded from a TOML file.

use crate::constants::*;
use crate::enumerate::ClusterLayout;
use crate::error::{Error, Result};
use crate::grid::CoverageGrid;
use crate::scoring::Aggregation;
use log::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Parameters of the built-in path-loss oracle.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OracleConfig {
    pub frequency_hz: f64,
    pub tx_power_dbm: f64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        OracleConfig {
            frequency_hz: DEFAULT_FREQUENCY_HZ,
            tx_power_dbm: DEFAULT_TX_POWER_DBM,
        }
    }
}

/// Full configuration for one optimization run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunConfig {
    /// Path to the scene file (a JSON array of building records).
    pub scene: String,
    /// Buildings at or below this height are not candidates.
    pub height_threshold: f64,
    /// Number of base stations to place.
    pub k: usize,
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    #[serde(default = "default_timeout_ms")]
    pub timeout_per_evaluation_ms: u64,
    /// Overall run budget. Unset means run to completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wall_clock_budget_ms: Option<u64>,
    #[serde(default)]
    pub aggregation: Aggregation,
    /// When set, placements take `k` sites per spatial cluster instead of
    /// `k` sites overall.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_layout: Option<ClusterLayout>,
    pub grid: CoverageGrid,
    #[serde(default)]
    pub oracle: OracleConfig,
}

fn default_worker_count() -> usize {
    DEFAULT_WORKER_COUNT
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_PER_EVALUATION_MS
}

impl RunConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: RunConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        debug!("loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.k < 1 {
            return Err(Error::Config("k must be at least 1".to_string()));
        }
        if self.worker_count < 1 {
            return Err(Error::Config(format!(
                "worker count must be at least 1, got {}",
                self.worker_count
            )));
        }
        if self.timeout_per_evaluation_ms == 0 {
            return Err(Error::Config(
                "per-evaluation timeout must be positive".to_string(),
            ));
        }
        if !self.height_threshold.is_finite() {
            return Err(Error::Config(format!(
                "height threshold must be finite, got {}",
                self.height_threshold
            )));
        }
        self.grid.validate()?;
        if let Some(layout) = &self.cluster_layout {
            layout.validate()?;
        }
        Ok(())
    }

    /// A starting-point config, written out by `init-config`.
    pub fn example() -> Self {
        RunConfig {
            scene: "scene.json".to_string(),
            height_threshold: 10.0,
            k: 3,
            aggregation: Aggregation::default(),
            cluster_layout: None,
            worker_count: DEFAULT_WORKER_COUNT,
            timeout_per_evaluation_ms: DEFAULT_TIMEOUT_PER_EVALUATION_MS,
            wall_clock_budget_ms: None,
            grid: CoverageGrid {
                min_x: 0.0,
                min_y: 0.0,
                max_x: 1000.0,
                max_y: 1000.0,
                resolution: 50.0,
                sample_height: 1.5,
            },
            oracle: OracleConfig::default(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_per_evaluation_ms)
    }

    pub fn wall_clock_budget(&self) -> Option<Duration> {
        self.wall_clock_budget_ms.map(Duration::from_millis)
    }
}
