//! Scenario files.
//!
//! A scenario bundles everything one run needs: the initial compartments, the
//! rates, the output time grid and the solver. Scenarios are read from JSON:
//!
//! ```json
//! {
//!   "initial_state": {
//!     "susceptible": 11316039, "exposed": 125000, "infected": 14480,
//!     "hospitalized": 0, "recovered": 0, "deceased": 0
//!   },
//!   "rates": {
//!     "beta": 0.0999, "epsilon": 0.714, "sigma": 0.25,
//!     "mu": 0.1736111111, "tau": 0.2, "theta": 0.25
//!   },
//!   "times": { "start": 0, "end": 121, "step": 1 },
//!   "solver": { "method": "dormand_prince" }
//! }
//! ```
//!
//! `times` may also be an explicit array of output times, and `solver` may be
//! omitted to use the adaptive default.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::compartments::CompartmentState;
use crate::error::SeihrdError;
use crate::ode::SolverConfig;
use crate::parameters::RateParameters;
use crate::simulator::EpidemicSimulator;
use crate::trajectory::Trajectory;

/// Belgian population used for the spring 2020 scenario.
pub const BELGIUM_POPULATION: f64 = 11_455_519.0;
/// Initially infectious people in the spring 2020 scenario.
pub const BELGIUM_INITIAL_INFECTED: f64 = 14_480.0;
/// Initially exposed people in the spring 2020 scenario: 25 000 × 5. The
/// multiplier has no documented derivation; override `initial_state` in a
/// scenario file to explore other values.
pub const BELGIUM_INITIAL_EXPOSED: f64 = 25_000.0 * 5.0;

/// Output times, either a regular grid or an explicit list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeGrid {
    Range { start: f64, end: f64, step: f64 },
    Explicit(Vec<f64>),
}

impl TimeGrid {
    /// Unit-spaced days `0, 1, ..., days`.
    #[must_use]
    pub fn days(days: u32) -> Self {
        TimeGrid::Range {
            start: 0.0,
            end: f64::from(days),
            step: 1.0,
        }
    }

    /// Materializes the grid. A range includes `end` when `end` lies on the
    /// grid (within rounding).
    ///
    /// # Errors
    ///
    /// Returns `SeihrdError::InvalidInput` if a range has a non-positive step,
    /// non-finite bounds or `end < start`. Explicit lists are returned as-is
    /// and checked by the simulator.
    pub fn times(&self) -> Result<Vec<f64>, SeihrdError> {
        match self {
            TimeGrid::Explicit(times) => Ok(times.clone()),
            &TimeGrid::Range { start, end, step } => {
                if !(start.is_finite() && end.is_finite() && step.is_finite()) {
                    return Err(SeihrdError::invalid_input(
                        "time grid bounds and step must be finite",
                    ));
                }
                if step <= 0.0 {
                    return Err(SeihrdError::invalid_input(format!(
                        "time grid step must be positive, got {step}"
                    )));
                }
                if end < start {
                    return Err(SeihrdError::invalid_input(format!(
                        "time grid end {end} precedes start {start}"
                    )));
                }
                let intervals = ((end - start) / step + 1e-9).floor();
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let count = intervals as usize + 1;
                #[allow(clippy::cast_precision_loss)]
                Ok((0..count).map(|i| start + i as f64 * step).collect())
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub initial_state: CompartmentState,
    pub rates: RateParameters,
    pub times: TimeGrid,
    #[serde(default)]
    pub solver: SolverConfig,
}

impl Scenario {
    /// Belgium, spring 2020: 122 daily output times starting on 2020-03-15.
    #[must_use]
    pub fn belgium_spring_2020() -> Self {
        Self {
            initial_state: CompartmentState::seeded(
                BELGIUM_POPULATION,
                BELGIUM_INITIAL_EXPOSED,
                BELGIUM_INITIAL_INFECTED,
            ),
            rates: RateParameters::belgium_spring_2020(),
            times: TimeGrid::days(121),
            solver: SolverConfig::default(),
        }
    }

    /// # Errors
    ///
    /// Returns `SeihrdError::JsonError` if the text is not a valid scenario.
    pub fn from_json_str(json: &str) -> Result<Self, SeihrdError> {
        Ok(serde_json::from_str(json)?)
    }

    /// # Errors
    ///
    /// Returns `SeihrdError::IoError` if the file cannot be opened and
    /// `SeihrdError::JsonError` if it is not a valid scenario.
    pub fn from_json_file(path: &Path) -> Result<Self, SeihrdError> {
        info!("Loading scenario from {}", path.display());
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    #[must_use]
    pub fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }

    /// Runs the scenario.
    ///
    /// # Errors
    ///
    /// Any error from [`TimeGrid::times`] or [`EpidemicSimulator::simulate`].
    pub fn simulate(&self) -> Result<Trajectory, SeihrdError> {
        let times = self.times.times()?;
        EpidemicSimulator::new(self.solver).simulate(&self.initial_state, &self.rates, &times)
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self::belgium_spring_2020()
    }
}
