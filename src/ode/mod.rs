//! Explicit solvers for systems of ordinary differential equations.
//!
//! A model describes itself through [`OdeSystem`]: given a time and a state
//! vector of fixed length `N`, return the derivative. A solver implements
//! [`Integrator`], which advances an initial state through a strictly
//! increasing list of output times and returns one state per output time. The
//! two are independent of each other, so any model can be paired with any
//! method:
//!
//! * [`DormandPrince`]: adaptive 5(4) Runge-Kutta with local error control.
//! * [`Rk4`]: classic fixed-step fourth order Runge-Kutta.
//!
//! Solvers do not validate the output times; callers are expected to have
//! checked that they are finite and strictly increasing.

mod dormand_prince;
mod rk4;

pub use dormand_prince::DormandPrince;
pub use rk4::Rk4;

use serde::{Deserialize, Serialize};

/// A system `dy/dt = f(t, y)` with a state vector of length `N`.
pub trait OdeSystem<const N: usize> {
    /// Evaluates `f(t, y)`.
    fn derivatives(&self, t: f64, y: &[f64; N]) -> [f64; N];
}

impl<const N: usize, F> OdeSystem<N> for F
where
    F: Fn(f64, &[f64; N]) -> [f64; N],
{
    fn derivatives(&self, t: f64, y: &[f64; N]) -> [f64; N] {
        self(t, y)
    }
}

/// Work done by a solver during one call to [`Integrator::solve`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SolverStats {
    pub accepted_steps: usize,
    pub rejected_steps: usize,
    pub evaluations: usize,
}

/// States at each output time, `states[i]` belonging to `times[i]`.
#[derive(Clone, Debug)]
pub struct Solution<const N: usize> {
    pub states: Vec<[f64; N]>,
    pub stats: SolverStats,
}

/// Why a solver stopped before reaching the last output time. `index` is the
/// output time the solver was integrating towards.
#[derive(Clone, Debug, PartialEq)]
pub enum SolverFailure<const N: usize> {
    NonFinite {
        index: usize,
        time: f64,
        last_valid: [f64; N],
    },
    TooManySteps {
        index: usize,
        time: f64,
        max_steps: usize,
    },
    StepSizeUnderflow {
        index: usize,
        time: f64,
        step: f64,
    },
}

pub trait Integrator {
    /// Integrates `system` from `y0` at `times[0]` through every later entry
    /// of `times`.
    ///
    /// # Errors
    ///
    /// Returns a [`SolverFailure`] as soon as a non-finite value appears or
    /// the method cannot make progress.
    fn solve<const N: usize, S: OdeSystem<N>>(
        &self,
        system: &S,
        y0: [f64; N],
        times: &[f64],
    ) -> Result<Solution<N>, SolverFailure<N>>;
}

/// Serializable choice of solver, as it appears in scenario files:
///
/// ```json
/// { "method": "dormand_prince", "rtol": 1e-8, "atol": 1e-8 }
/// { "method": "rk4", "max_step": 0.1 }
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum SolverConfig {
    DormandPrince {
        #[serde(default = "DormandPrince::default_rtol")]
        rtol: f64,
        #[serde(default = "DormandPrince::default_atol")]
        atol: f64,
        #[serde(default = "DormandPrince::default_max_steps")]
        max_steps: usize,
    },
    Rk4 {
        #[serde(default = "Rk4::default_max_step")]
        max_step: f64,
    },
}

impl Default for SolverConfig {
    fn default() -> Self {
        DormandPrince::default().into()
    }
}

impl From<DormandPrince> for SolverConfig {
    fn from(solver: DormandPrince) -> Self {
        SolverConfig::DormandPrince {
            rtol: solver.rtol,
            atol: solver.atol,
            max_steps: solver.max_steps,
        }
    }
}

impl From<Rk4> for SolverConfig {
    fn from(solver: Rk4) -> Self {
        SolverConfig::Rk4 {
            max_step: solver.max_step,
        }
    }
}

impl SolverConfig {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            SolverConfig::DormandPrince { .. } => "dormand_prince",
            SolverConfig::Rk4 { .. } => "rk4",
        }
    }
}

pub(crate) fn all_finite<const N: usize>(y: &[f64; N]) -> bool {
    y.iter().all(|value| value.is_finite())
}
