//! Runs the SEIHRD model over a time grid.
//!
//! [`EpidemicSimulator`] validates its inputs, hands the
//! [`Seihrd`](crate::model::Seihrd) system to the configured solver and turns
//! the solver output into a [`Trajectory`]. It performs no I/O and keeps no
//! state between calls, so the same simulator can be reused (or cloned into
//! other threads) for any number of independent runs.

use std::time::Instant;

use log::{debug, info, trace, warn};

use crate::compartments::{Compartment, CompartmentState, COMPARTMENT_COUNT};
use crate::error::SeihrdError;
use crate::model::Seihrd;
use crate::numeric::CONSERVATION_TOLERANCE;
use crate::ode::{DormandPrince, Integrator, Rk4, Solution, SolverConfig, SolverFailure};
use crate::parameters::RateParameters;
use crate::trajectory::{Trajectory, TrajectoryPoint};

/// Checks that `times` is non-empty, finite and strictly increasing.
///
/// # Errors
///
/// Returns `SeihrdError::InvalidInput` describing the first problem found.
pub fn validate_times(times: &[f64]) -> Result<(), SeihrdError> {
    if times.is_empty() {
        return Err(SeihrdError::invalid_input("times must not be empty"));
    }
    if let Some((index, time)) = times.iter().enumerate().find(|(_, t)| !t.is_finite()) {
        return Err(SeihrdError::invalid_input(format!(
            "times[{index}] must be finite, got {time}"
        )));
    }
    if let Some(index) = times.windows(2).position(|pair| pair[1] <= pair[0]) {
        return Err(SeihrdError::invalid_input(format!(
            "times must be strictly increasing, but times[{}] = {} follows times[{}] = {}",
            index + 1,
            times[index + 1],
            index,
            times[index]
        )));
    }
    Ok(())
}

fn validate_solver(config: &SolverConfig) -> Result<(), SeihrdError> {
    match *config {
        SolverConfig::DormandPrince {
            rtol,
            atol,
            max_steps,
        } => {
            if !(rtol.is_finite() && rtol > 0.0 && atol.is_finite() && atol >= 0.0) {
                return Err(SeihrdError::invalid_input(format!(
                    "dormand_prince tolerances must be positive, got rtol={rtol} atol={atol}"
                )));
            }
            if max_steps == 0 {
                return Err(SeihrdError::invalid_input(
                    "dormand_prince max_steps must be at least 1",
                ));
            }
        }
        SolverConfig::Rk4 { max_step } => {
            if !(max_step.is_finite() && max_step > 0.0) {
                return Err(SeihrdError::invalid_input(format!(
                    "rk4 max_step must be positive, got {max_step}"
                )));
            }
        }
    }
    Ok(())
}

/// Integrates the SEIHRD equations with a configurable solver.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct EpidemicSimulator {
    solver: SolverConfig,
}

impl EpidemicSimulator {
    #[must_use]
    pub fn new(solver: SolverConfig) -> Self {
        Self { solver }
    }

    #[must_use]
    pub fn solver(&self) -> &SolverConfig {
        &self.solver
    }

    /// Integrates from `initial` at `times[0]` and returns the state at every
    /// entry of `times`.
    ///
    /// # Errors
    ///
    /// * `InvalidInput` if `times` is empty, not finite or not strictly
    ///   increasing, if any initial compartment or rate is negative or not
    ///   finite, or if the solver settings are unusable.
    /// * `NonFiniteResult` if the solver produces a NaN or an infinity.
    /// * `IntegrationFailed` if the solver runs out of steps.
    pub fn simulate(
        &self,
        initial: &CompartmentState,
        rates: &RateParameters,
        times: &[f64],
    ) -> Result<Trajectory, SeihrdError> {
        validate_times(times)?;
        initial.validate()?;
        rates.validate()?;
        validate_solver(&self.solver)?;

        debug!(
            "simulating {} output times from t={} with {}: {initial}",
            times.len(),
            times[0],
            self.solver.name()
        );

        let started = Instant::now();
        let system = Seihrd::new(*rates);
        let y0 = initial.to_array();
        let result = match self.solver {
            SolverConfig::DormandPrince {
                rtol,
                atol,
                max_steps,
            } => DormandPrince::new(rtol, atol)
                .with_max_steps(max_steps)
                .solve(&system, y0, times),
            SolverConfig::Rk4 { max_step } => Rk4::new(max_step).solve(&system, y0, times),
        };

        let solution = result.map_err(|failure| {
            let error = into_error(failure);
            warn!("{error}");
            error
        })?;
        let trajectory = into_trajectory(*rates, times, solution);

        let conservation_error = trajectory.max_conservation_error();
        if conservation_error > CONSERVATION_TOLERANCE {
            warn!("total population drifted by a relative {conservation_error:e}");
        }
        if let Some(peak) = trajectory.peak(Compartment::Infected) {
            debug!("infected peaks at t={} with {}", peak.time, peak.state.infected);
        }
        info!(
            "simulated {} points in {}",
            trajectory.len(),
            humantime::format_duration(started.elapsed())
        );
        Ok(trajectory)
    }
}

fn into_error(failure: SolverFailure<COMPARTMENT_COUNT>) -> SeihrdError {
    match failure {
        SolverFailure::NonFinite {
            index,
            time,
            last_valid,
        } => SeihrdError::NonFiniteResult {
            index,
            time,
            last_valid: CompartmentState::from_array(last_valid),
        },
        SolverFailure::TooManySteps {
            index,
            time,
            max_steps,
        } => SeihrdError::IntegrationFailed {
            index,
            time,
            reason: format!("exceeded {max_steps} steps"),
        },
        SolverFailure::StepSizeUnderflow { index, time, step } => SeihrdError::IntegrationFailed {
            index,
            time,
            reason: format!("step size {step:e} underflowed"),
        },
    }
}

fn into_trajectory(
    rates: RateParameters,
    times: &[f64],
    solution: Solution<COMPARTMENT_COUNT>,
) -> Trajectory {
    trace!(
        "solver took {} steps ({} rejected, {} evaluations)",
        solution.stats.accepted_steps,
        solution.stats.rejected_steps,
        solution.stats.evaluations
    );
    let points = times
        .iter()
        .zip(solution.states)
        .map(|(&time, state)| TrajectoryPoint {
            time,
            state: CompartmentState::from_array(state),
        })
        .collect();
    Trajectory::new(rates, points)
}

/// Integrates with the default adaptive solver.
///
/// # Errors
///
/// See [`EpidemicSimulator::simulate`].
pub fn simulate(
    initial: &CompartmentState,
    rates: &RateParameters,
    times: &[f64],
) -> Result<Trajectory, SeihrdError> {
    EpidemicSimulator::default().simulate(initial, rates, times)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_relatively_eq;

    fn days(n: u32) -> Vec<f64> {
        (0..=n).map(f64::from).collect()
    }

    fn initial() -> CompartmentState {
        CompartmentState::seeded(1_000_000.0, 5_000.0, 1_000.0)
    }

    fn rates() -> RateParameters {
        RateParameters {
            beta: 0.6,
            epsilon: 0.3,
            sigma: 0.05,
            mu: 0.15,
            tau: 0.1,
            theta: 0.02,
        }
    }

    #[test]
    fn rejects_bad_time_grids() {
        for times in [vec![], vec![5.0, 3.0, 8.0], vec![0.0, 1.0, 1.0], vec![0.0, f64::NAN]] {
            let error = simulate(&initial(), &rates(), &times).unwrap_err();
            assert!(error.is_invalid_input(), "{times:?} gave {error}");
        }
    }

    #[test]
    fn rejects_negative_initial_state() {
        let initial = CompartmentState {
            susceptible: -1.0,
            ..initial()
        };
        let error = simulate(&initial, &rates(), &days(10)).unwrap_err();
        assert!(error.is_invalid_input());
    }

    #[test]
    fn rejects_negative_rates_and_bad_solver_settings() {
        let negative = RateParameters {
            sigma: -0.5,
            ..rates()
        };
        assert!(simulate(&initial(), &negative, &days(10))
            .unwrap_err()
            .is_invalid_input());

        for solver in [
            SolverConfig::Rk4 { max_step: 0.0 },
            SolverConfig::DormandPrince {
                rtol: -1.0,
                atol: 1e-8,
                max_steps: 10,
            },
            SolverConfig::DormandPrince {
                rtol: 1e-6,
                atol: 1e-8,
                max_steps: 0,
            },
        ] {
            let error = EpidemicSimulator::new(solver)
                .simulate(&initial(), &rates(), &days(10))
                .unwrap_err();
            assert!(error.is_invalid_input());
        }
    }

    #[test]
    fn output_times_match_input_times() {
        let times = [0.0, 0.5, 2.0, 7.25, 30.0];
        let trajectory = simulate(&initial(), &rates(), &times).unwrap();
        assert_eq!(trajectory.times(), times);
        assert_eq!(trajectory.initial().unwrap().state, initial());
    }

    #[test]
    fn closely_spaced_output_times_with_both_solvers() {
        let initial = CompartmentState::seeded(1e6, 100.0, 10.0);
        let rates = RateParameters::belgium_spring_2020();
        for solver in [SolverConfig::default(), Rk4::default().into()] {
            let simulator = EpidemicSimulator::new(solver);
            for times in [vec![0.0, 1e-15, 1.0], vec![1e7, 1e7 + 1e-8]] {
                let trajectory = simulator.simulate(&initial, &rates, &times).unwrap();
                assert_eq!(trajectory.times(), times);
                assert!(trajectory.max_conservation_error() <= CONSERVATION_TOLERANCE);
            }
        }
    }

    #[test]
    fn solvers_agree() {
        let times = days(120);
        let adaptive = simulate(&initial(), &rates(), &times).unwrap();
        let fixed = EpidemicSimulator::new(Rk4::new(0.05).into())
            .simulate(&initial(), &rates(), &times)
            .unwrap();
        for (a, b) in adaptive.iter().zip(&fixed) {
            for compartment in [
                Compartment::Susceptible,
                Compartment::Infected,
                Compartment::Deceased,
            ] {
                assert_relatively_eq!(a.state[compartment], b.state[compartment], 1e-4);
            }
        }
    }

    #[test]
    fn non_finite_result_reports_last_valid_state() {
        let rates = RateParameters {
            beta: f64::MAX,
            ..rates()
        };
        let error = simulate(&initial(), &rates, &days(5)).unwrap_err();
        match error {
            SeihrdError::NonFiniteResult {
                index, last_valid, ..
            } => {
                assert_eq!(index, 1);
                assert_eq!(last_valid, initial());
            }
            other => panic!("expected NonFiniteResult, got {other}"),
        }
    }

    #[test]
    fn step_budget_exhaustion_is_an_integration_failure() {
        let solver = SolverConfig::DormandPrince {
            rtol: 1e-12,
            atol: 1e-12,
            max_steps: 1,
        };
        let error = EpidemicSimulator::new(solver)
            .simulate(&initial(), &rates(), &[0.0, 100.0])
            .unwrap_err();
        assert!(matches!(
            error,
            SeihrdError::IntegrationFailed { index: 1, .. }
        ));
    }
}
