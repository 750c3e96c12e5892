use log::trace;

use super::{all_finite, Integrator, OdeSystem, Solution, SolverFailure, SolverStats};

// Upper bound on the sub-steps a single interval may be split into.
const MAX_SUBSTEPS: usize = 1_000_000_000;

/// Fixed-step classic Runge-Kutta.
///
/// Each interval between consecutive output times is split into the smallest
/// number of equal sub-steps no longer than `max_step`, so the step never
/// exceeds the spacing of the output grid.
/// An interval that would need more than a billion sub-steps is refused
/// with [`SolverFailure::TooManySteps`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Rk4 {
    pub max_step: f64,
}

impl Rk4 {
    #[must_use]
    pub fn new(max_step: f64) -> Self {
        Self { max_step }
    }

    pub(crate) fn default_max_step() -> f64 {
        0.1
    }
}

impl Default for Rk4 {
    fn default() -> Self {
        Self::new(Self::default_max_step())
    }
}

/// Advances `y` by one step of length `dt`.
fn rk4_step<const N: usize, S: OdeSystem<N>>(
    system: &S,
    t: f64,
    dt: f64,
    y: &[f64; N],
) -> [f64; N] {
    let mut ytmp = [0.0; N];

    let k1 = system.derivatives(t, y);

    for i in 0..N {
        ytmp[i] = y[i] + 0.5 * dt * k1[i];
    }
    let k2 = system.derivatives(t + 0.5 * dt, &ytmp);

    for i in 0..N {
        ytmp[i] = y[i] + 0.5 * dt * k2[i];
    }
    let k3 = system.derivatives(t + 0.5 * dt, &ytmp);

    for i in 0..N {
        ytmp[i] = y[i] + dt * k3[i];
    }
    let k4 = system.derivatives(t + dt, &ytmp);

    let mut next = *y;
    for i in 0..N {
        next[i] += (dt / 6.0) * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]);
    }
    next
}

impl Integrator for Rk4 {
    fn solve<const N: usize, S: OdeSystem<N>>(
        &self,
        system: &S,
        y0: [f64; N],
        times: &[f64],
    ) -> Result<Solution<N>, SolverFailure<N>> {
        let mut stats = SolverStats::default();
        let mut states = Vec::with_capacity(times.len());
        let mut y = y0;
        states.push(y);

        for (index, window) in times.windows(2).enumerate() {
            let (t0, t1) = (window[0], window[1]);
            let interval = t1 - t0;
            let count = (interval / self.max_step).ceil();
            #[allow(clippy::cast_precision_loss)]
            let too_many = !count.is_finite() || count > MAX_SUBSTEPS as f64;
            if too_many {
                return Err(SolverFailure::TooManySteps {
                    index: index + 1,
                    time: t0,
                    max_steps: MAX_SUBSTEPS,
                });
            }
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let substeps = (count as usize).max(1);
            #[allow(clippy::cast_precision_loss)]
            let dt = interval / substeps as f64;
            trace!("rk4: [{t0}, {t1}] in {substeps} steps of {dt}");

            for step in 0..substeps {
                #[allow(clippy::cast_precision_loss)]
                let t = t0 + step as f64 * dt;
                let next = rk4_step(system, t, dt, &y);
                stats.evaluations += 4;
                if !all_finite(&next) {
                    return Err(SolverFailure::NonFinite {
                        index: index + 1,
                        time: t + dt,
                        last_valid: y,
                    });
                }
                stats.accepted_steps += 1;
                y = next;
            }
            states.push(y);
        }

        Ok(Solution { states, stats })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_almost_eq;

    fn decay(_t: f64, y: &[f64; 1]) -> [f64; 1] {
        [-0.5 * y[0]]
    }

    #[test]
    fn exponential_decay() {
        let times: Vec<f64> = (0..=10).map(f64::from).collect();
        let solution = Rk4::new(0.05).solve(&decay, [1.0], &times).unwrap();
        assert_eq!(solution.states.len(), times.len());
        for (t, y) in times.iter().zip(&solution.states) {
            assert_almost_eq!(y[0], (-0.5 * t).exp(), 1e-7);
        }
    }

    #[test]
    fn step_never_exceeds_output_spacing() {
        // max_step larger than the grid spacing: one step per interval.
        let times = [0.0, 0.5, 1.0, 1.25];
        let solution = Rk4::new(10.0).solve(&decay, [1.0], &times).unwrap();
        assert_eq!(solution.stats.accepted_steps, 3);
        assert_eq!(solution.stats.evaluations, 12);
    }

    #[test]
    fn sub_steps_split_uneven_intervals() {
        let times = [0.0, 1.0, 1.25];
        let solution = Rk4::new(0.3).solve(&decay, [1.0], &times).unwrap();
        // ceil(1.0 / 0.3) = 4, ceil(0.25 / 0.3) = 1
        assert_eq!(solution.stats.accepted_steps, 5);
    }

    #[test]
    fn reports_first_non_finite_state() {
        let blow_up = |_t: f64, y: &[f64; 2]| [y[0] * f64::MAX, 0.0];
        let failure = Rk4::new(1.0)
            .solve(&blow_up, [2.0, 1.0], &[0.0, 1.0, 2.0])
            .unwrap_err();
        assert_eq!(
            failure,
            SolverFailure::NonFinite {
                index: 1,
                time: 1.0,
                last_valid: [2.0, 1.0],
            }
        );
    }

    #[test]
    fn oversized_interval_is_refused() {
        let failure = Rk4::default()
            .solve(&decay, [1.0], &[0.0, 1.0, 1e300])
            .unwrap_err();
        assert_eq!(
            failure,
            SolverFailure::TooManySteps {
                index: 2,
                time: 1.0,
                max_steps: 1_000_000_000,
            }
        );
    }

    #[test]
    fn single_time_returns_initial_state() {
        let solution = Rk4::default().solve(&decay, [3.0], &[4.0]).unwrap();
        assert_eq!(solution.states, vec![[3.0]]);
        assert_eq!(solution.stats, SolverStats::default());
    }
}
