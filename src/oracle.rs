//! Signal oracle: the external model that predicts coverage for a set of
//! transmitter sites.
//!
//! The search treats the oracle as an opaque, possibly unreliable service.
//! Every failure mode is expressed as an `OracleError` so a single bad
//! evaluation never aborts the run. `FsplOracle` is the built-in free-space
//! model used when no external service is configured.

use crate::constants::*;
use crate::error::OracleError;
use crate::grid::{CoverageGrid, CoverageSample};
use crate::site::Site;

/// Predicts received signal strength over the coverage grid for a set of
/// transmitter sites. One call per placement.
pub trait SignalOracle: Send + Sync {
    fn name(&self) -> &str;

    /// Evaluate a placement. Returns one sample per grid cell on success.
    fn evaluate(
        &self,
        sites: &[&Site],
        grid: &CoverageGrid,
    ) -> std::result::Result<Vec<CoverageSample>, OracleError>;
}

/// Free-space path loss model: each receiver hears the strongest of the
/// transmitters, with loss growing as 20 log10(d).
pub struct FsplOracle {
    pub frequency_hz: f64,
    pub tx_power_dbm: f64,
}

impl Default for FsplOracle {
    fn default() -> Self {
        FsplOracle {
            frequency_hz: DEFAULT_FREQUENCY_HZ,
            tx_power_dbm: DEFAULT_TX_POWER_DBM,
        }
    }
}

impl FsplOracle {
    pub fn new(frequency_hz: f64, tx_power_dbm: f64) -> Self {
        FsplOracle {
            frequency_hz,
            tx_power_dbm,
        }
    }

    /// Free-space path loss in dB at `distance_m` meters.
    fn path_loss_db(&self, distance_m: f64) -> f64 {
        let d = distance_m.max(MIN_PATH_DISTANCE_M);
        20.0 * d.log10() + 20.0 * self.frequency_hz.log10() - 147.55
    }
}

impl SignalOracle for FsplOracle {
    fn name(&self) -> &str {
        "fspl"
    }

    fn evaluate(
        &self,
        sites: &[&Site],
        grid: &CoverageGrid,
    ) -> std::result::Result<Vec<CoverageSample>, OracleError> {
        if sites.is_empty() {
            return Err(OracleError::Malformed(
                "placement resolved to no sites".to_string(),
            ));
        }
        let samples = grid
            .cells()
            .map(|cell| {
                let strength_dbm = sites
                    .iter()
                    .map(|site| self.tx_power_dbm - self.path_loss_db(site.position.distance_to(cell)))
                    .fold(f64::NEG_INFINITY, f64::max);
                CoverageSample {
                    location: cell,
                    strength_dbm,
                }
            })
            .collect();
        Ok(samples)
    }
}
