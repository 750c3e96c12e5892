//! Adaptive Dormand-Prince 5(4) with the error estimator and step size
//! controller described in Hairer, Nørsett & Wanner, *Solving Ordinary
//! Differential Equations I*, section II.4.
//!
//! Steps are clipped so the solver lands exactly on each output time; the
//! step size that was accepted last carries over into the next interval. The
//! last stage of an accepted step is reused as the first stage of the next
//! one ("first same as last").

use log::trace;

use super::{all_finite, Integrator, OdeSystem, Solution, SolverFailure, SolverStats};

const C2: f64 = 1.0 / 5.0;
const C3: f64 = 3.0 / 10.0;
const C4: f64 = 4.0 / 5.0;
const C5: f64 = 8.0 / 9.0;

const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;

// Fifth order weights, also the last row of the tableau.
const B1: f64 = 35.0 / 384.0;
const B3: f64 = 500.0 / 1113.0;
const B4: f64 = 125.0 / 192.0;
const B5: f64 = -2187.0 / 6784.0;
const B6: f64 = 11.0 / 84.0;

// Difference between the fifth and fourth order weights.
const E1: f64 = 71.0 / 57600.0;
const E3: f64 = -71.0 / 16695.0;
const E4: f64 = 71.0 / 1920.0;
const E5: f64 = -17253.0 / 339_200.0;
const E6: f64 = 22.0 / 525.0;
const E7: f64 = -1.0 / 40.0;

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 10.0;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DormandPrince {
    /// Relative tolerance of the local error estimate.
    pub rtol: f64,
    /// Absolute tolerance of the local error estimate.
    pub atol: f64,
    /// Step budget for each interval between output times.
    pub max_steps: usize,
}

impl DormandPrince {
    #[must_use]
    pub fn new(rtol: f64, atol: f64) -> Self {
        Self {
            rtol,
            atol,
            max_steps: Self::default_max_steps(),
        }
    }

    #[must_use]
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub(crate) fn default_rtol() -> f64 {
        1e-8
    }

    pub(crate) fn default_atol() -> f64 {
        1e-8
    }

    pub(crate) fn default_max_steps() -> usize {
        100_000
    }

    fn scale(&self, a: f64, b: f64) -> f64 {
        self.atol + self.rtol * a.abs().max(b.abs())
    }

    /// Root mean square of `v / sc` where `sc` comes from `y`.
    fn norm<const N: usize>(&self, v: &[f64; N], y: &[f64; N]) -> f64 {
        if N == 0 {
            return 0.0;
        }
        let sum: f64 = (0..N)
            .map(|i| {
                let ratio = v[i] / self.scale(y[i], y[i]);
                ratio * ratio
            })
            .sum();
        #[allow(clippy::cast_precision_loss)]
        let n = N as f64;
        (sum / n).sqrt()
    }

    /// Starting step size, following Hairer's heuristic.
    fn initial_step<const N: usize, S: OdeSystem<N>>(
        &self,
        system: &S,
        t: f64,
        y: &[f64; N],
        f0: &[f64; N],
        span: f64,
    ) -> f64 {
        let d0 = self.norm(y, y);
        let d1 = self.norm(f0, y);
        let h0 = if d0 < 1e-5 || d1 < 1e-5 {
            1e-6
        } else {
            0.01 * d0 / d1
        };
        let h0 = h0.min(span);

        let mut y1 = *y;
        for i in 0..N {
            y1[i] += h0 * f0[i];
        }
        let f1 = system.derivatives(t + h0, &y1);
        let mut df = [0.0; N];
        for i in 0..N {
            df[i] = f1[i] - f0[i];
        }
        let d2 = self.norm(&df, y) / h0;

        let h1 = if d1.max(d2) <= 1e-15 {
            (h0 * 1e-3).max(1e-6)
        } else {
            (0.01 / d1.max(d2)).powf(1.0 / 5.0)
        };
        let h = (100.0 * h0).min(h1).min(span);
        if h.is_finite() && h > 0.0 {
            h
        } else {
            span
        }
    }
}

impl Default for DormandPrince {
    fn default() -> Self {
        Self::new(Self::default_rtol(), Self::default_atol())
    }
}

/// Result of one trial step.
struct Trial<const N: usize> {
    y: [f64; N],
    /// Derivative at the end of the step; the first stage of the next step.
    f: [f64; N],
    error: f64,
}

impl DormandPrince {
    fn trial_step<const N: usize, S: OdeSystem<N>>(
        &self,
        system: &S,
        t: f64,
        h: f64,
        y: &[f64; N],
        k1: &[f64; N],
    ) -> Trial<N> {
        let mut ytmp = [0.0; N];

        for i in 0..N {
            ytmp[i] = y[i] + h * A21 * k1[i];
        }
        let k2 = system.derivatives(t + C2 * h, &ytmp);

        for i in 0..N {
            ytmp[i] = y[i] + h * (A31 * k1[i] + A32 * k2[i]);
        }
        let k3 = system.derivatives(t + C3 * h, &ytmp);

        for i in 0..N {
            ytmp[i] = y[i] + h * (A41 * k1[i] + A42 * k2[i] + A43 * k3[i]);
        }
        let k4 = system.derivatives(t + C4 * h, &ytmp);

        for i in 0..N {
            ytmp[i] = y[i] + h * (A51 * k1[i] + A52 * k2[i] + A53 * k3[i] + A54 * k4[i]);
        }
        let k5 = system.derivatives(t + C5 * h, &ytmp);

        for i in 0..N {
            ytmp[i] = y[i]
                + h * (A61 * k1[i] + A62 * k2[i] + A63 * k3[i] + A64 * k4[i] + A65 * k5[i]);
        }
        let k6 = system.derivatives(t + h, &ytmp);

        let mut y_new = [0.0; N];
        for i in 0..N {
            y_new[i] =
                y[i] + h * (B1 * k1[i] + B3 * k3[i] + B4 * k4[i] + B5 * k5[i] + B6 * k6[i]);
        }
        let k7 = system.derivatives(t + h, &y_new);

        let mut sum = 0.0;
        for i in 0..N {
            let estimate = h
                * (E1 * k1[i] + E3 * k3[i] + E4 * k4[i] + E5 * k5[i] + E6 * k6[i] + E7 * k7[i]);
            let ratio = estimate / self.scale(y[i], y_new[i]);
            sum += ratio * ratio;
        }
        #[allow(clippy::cast_precision_loss)]
        let error = if N == 0 { 0.0 } else { (sum / N as f64).sqrt() };

        Trial {
            y: y_new,
            f: k7,
            error,
        }
    }
}

impl Integrator for DormandPrince {
    fn solve<const N: usize, S: OdeSystem<N>>(
        &self,
        system: &S,
        y0: [f64; N],
        times: &[f64],
    ) -> Result<Solution<N>, SolverFailure<N>> {
        let mut stats = SolverStats::default();
        let mut states = Vec::with_capacity(times.len());
        states.push(y0);
        if times.len() < 2 {
            return Ok(Solution { states, stats });
        }

        let mut t = times[0];
        let mut y = y0;
        let mut f = system.derivatives(t, &y);
        stats.evaluations += 1;
        if !all_finite(&f) {
            return Err(SolverFailure::NonFinite {
                index: 1,
                time: t,
                last_valid: y,
            });
        }
        let mut h = self.initial_step(system, t, &y, &f, times[times.len() - 1] - t);
        stats.evaluations += 1;

        for (index, &t_out) in times.iter().enumerate().skip(1) {
            let mut steps = 0;
            while t < t_out {
                if steps >= self.max_steps {
                    return Err(SolverFailure::TooManySteps {
                        index,
                        time: t,
                        max_steps: self.max_steps,
                    });
                }
                steps += 1;

                // Land exactly on the output time; absorb a remainder too
                // small to be a meaningful step.
                let remaining = t_out - t;
                let landing = h >= remaining || remaining - h <= 1e-12 * t_out.abs().max(1.0);
                let step = if landing { remaining } else { h };
                // A landing step is as short as the output grid asks for; only
                // a step the controller shrank can underflow.
                if (!landing && step <= 1e-14 * t.abs().max(1.0)) || t + step == t {
                    return Err(SolverFailure::StepSizeUnderflow {
                        index,
                        time: t,
                        step,
                    });
                }

                let trial = self.trial_step(system, t, step, &y, &f);
                stats.evaluations += 6;

                if !all_finite(&trial.y) || !trial.error.is_finite() {
                    return Err(SolverFailure::NonFinite {
                        index,
                        time: t + step,
                        last_valid: y,
                    });
                }

                if trial.error <= 1.0 {
                    stats.accepted_steps += 1;
                    t = if landing { t_out } else { t + step };
                    y = trial.y;
                    f = trial.f;
                    let factor = if trial.error == 0.0 {
                        MAX_FACTOR
                    } else {
                        (SAFETY * trial.error.powf(-1.0 / 5.0)).clamp(MIN_FACTOR, MAX_FACTOR)
                    };
                    // A step shortened to hit an output time says little about
                    // the step the solution allows, so keep the longer one.
                    h = (step * factor).max(if landing { h } else { 0.0 });
                } else {
                    stats.rejected_steps += 1;
                    let factor =
                        (SAFETY * trial.error.powf(-1.0 / 5.0)).clamp(MIN_FACTOR, 1.0);
                    h = step * factor;
                    trace!("dormand_prince: rejected step {step} at t={t}, error {}", trial.error);
                }
            }
            states.push(y);
        }

        Ok(Solution { states, stats })
    }
}
