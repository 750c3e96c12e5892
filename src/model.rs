//! The SEIHRD equations.
//!
//! With `N = S + E + I + H + R + D` taken from the current state:
//!
//! ```text
//! λ  = β · I / N
//! dS = -λ · S
//! dE =  λ · S - ε · E
//! dI =  ε · E - μ · I - σ · I
//! dH =  σ · I - τ · H - θ · H
//! dR =  μ · I + τ · H
//! dD =  θ · H
//! ```

use crate::compartments::{Compartment, COMPARTMENT_COUNT};
use crate::ode::OdeSystem;
use crate::parameters::RateParameters;

/// Force of infection `β · I / N`. An empty population has no infection
/// pressure.
#[must_use]
pub fn force_of_infection(rates: &RateParameters, state: &[f64; COMPARTMENT_COUNT]) -> f64 {
    let n: f64 = state.iter().sum();
    if n > 0.0 {
        rates.beta * state[Compartment::Infected.index()] / n
    } else {
        0.0
    }
}

/// Time derivative of the compartment vector (S, E, I, H, R, D).
#[must_use]
pub fn seihrd_derivatives(
    rates: &RateParameters,
    state: &[f64; COMPARTMENT_COUNT],
) -> [f64; COMPARTMENT_COUNT] {
    let [s, e, i, h, _r, _d] = *state;
    let lambda = force_of_infection(rates, state);

    let infection = lambda * s;
    let onset = rates.epsilon * e;
    let admission = rates.sigma * i;
    let recovery = rates.mu * i;
    let discharge = rates.tau * h;
    let death = rates.theta * h;

    [
        -infection,
        infection - onset,
        onset - recovery - admission,
        admission - discharge - death,
        recovery + discharge,
        death,
    ]
}

/// The SEIHRD system with fixed rates, ready to hand to an
/// [`Integrator`](crate::ode::Integrator).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Seihrd {
    pub rates: RateParameters,
}

impl Seihrd {
    #[must_use]
    pub fn new(rates: RateParameters) -> Self {
        Self { rates }
    }
}

impl OdeSystem<COMPARTMENT_COUNT> for Seihrd {
    fn derivatives(&self, _t: f64, y: &[f64; COMPARTMENT_COUNT]) -> [f64; COMPARTMENT_COUNT] {
        seihrd_derivatives(&self.rates, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_almost_eq;
    use crate::compartments::CompartmentState;

    fn unit_rates() -> RateParameters {
        RateParameters {
            beta: 0.5,
            epsilon: 0.2,
            sigma: 0.1,
            mu: 0.3,
            tau: 0.05,
            theta: 0.02,
        }
    }

    #[test]
    fn derivatives_match_hand_computation() {
        let state = [700.0, 100.0, 100.0, 50.0, 40.0, 10.0];
        let d = seihrd_derivatives(&unit_rates(), &state);
        // λ = 0.5 * 100 / 1000 = 0.05
        assert_almost_eq!(d[0], -35.0, 1e-12);
        assert_almost_eq!(d[1], 35.0 - 20.0, 1e-12);
        assert_almost_eq!(d[2], 20.0 - 30.0 - 10.0, 1e-12);
        assert_almost_eq!(d[3], 10.0 - 2.5 - 1.0, 1e-12);
        assert_almost_eq!(d[4], 30.0 + 2.5, 1e-12);
        assert_almost_eq!(d[5], 1.0, 1e-12);
    }

    #[test]
    fn derivatives_sum_to_zero() {
        let state = CompartmentState::seeded(11_455_519.0, 125_000.0, 14_480.0).to_array();
        let d = seihrd_derivatives(&RateParameters::belgium_spring_2020(), &state);
        assert_almost_eq!(d.iter().sum::<f64>(), 0.0, 1e-8);
    }

    #[test]
    fn population_size_comes_from_state() {
        // Doubling every compartment leaves λ unchanged.
        let rates = unit_rates();
        let state = [700.0, 100.0, 100.0, 50.0, 40.0, 10.0];
        let doubled = state.map(|x| 2.0 * x);
        assert_almost_eq!(
            force_of_infection(&rates, &state),
            force_of_infection(&rates, &doubled),
            1e-15
        );
    }

    #[test]
    fn empty_population_has_no_force_of_infection() {
        let d = seihrd_derivatives(&unit_rates(), &[0.0; COMPARTMENT_COUNT]);
        assert_eq!(d, [0.0; COMPARTMENT_COUNT]);
    }

    #[test]
    fn system_ignores_time() {
        let system = Seihrd::new(unit_rates());
        let state = [700.0, 100.0, 100.0, 50.0, 40.0, 10.0];
        assert_eq!(
            system.derivatives(0.0, &state),
            system.derivatives(42.0, &state)
        );
    }
}
