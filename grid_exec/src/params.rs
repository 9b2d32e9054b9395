//! # Grid Executable Parameters
//!
//! This module provides parameters for the grid executable's planning loop.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridExecParams {
    /// Target period of one planning cycle.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// Number of consecutive cycle overruns after which execution stops.
    pub max_consec_overruns: u64,

    /// A snapshot of the grid is saved to the session every this many cycles,
    /// zero disables periodic snapshots.
    #[serde(default)]
    pub snapshot_period_cycles: u64,
}

impl Default for GridExecParams {
    fn default() -> Self {
        Self {
            cycle_period_s: 0.05,
            max_consec_overruns: 20,
            snapshot_period_cycles: 0,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_shipped_params() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("params")
            .join("grid_exec.toml");
        let p: GridExecParams = util::params::load_from_path(path).unwrap();

        assert!(p.cycle_period_s > 0.0);
        assert!(p.max_consec_overruns > 0);
    }
}
