//! The output of one simulation run.
//!
//! A [`Trajectory`] is an ordered list of `(time, state)` points, one for
//! every requested output time, together with the rates that produced it so
//! that derived series such as daily hospital admissions can be computed
//! without carrying the parameters around separately.

use serde::Serialize;

use crate::compartments::{Compartment, CompartmentState};
use crate::numeric::relative_difference;
use crate::parameters::RateParameters;

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct TrajectoryPoint {
    pub time: f64,
    pub state: CompartmentState,
}

impl TrajectoryPoint {
    /// New hospital admissions per day at this instant, `σ · I`.
    #[must_use]
    pub fn new_hospitalizations(&self, rates: &RateParameters) -> f64 {
        rates.sigma * self.state.infected
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Trajectory {
    rates: RateParameters,
    points: Vec<TrajectoryPoint>,
}

impl Trajectory {
    pub(crate) fn new(rates: RateParameters, points: Vec<TrajectoryPoint>) -> Self {
        Self { rates, points }
    }

    #[must_use]
    pub fn rates(&self) -> &RateParameters {
        &self.rates
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn points(&self) -> &[TrajectoryPoint] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrajectoryPoint> {
        self.points.iter()
    }

    #[must_use]
    pub fn times(&self) -> Vec<f64> {
        self.points.iter().map(|point| point.time).collect()
    }

    #[must_use]
    pub fn states(&self) -> Vec<CompartmentState> {
        self.points.iter().map(|point| point.state).collect()
    }

    #[must_use]
    pub fn initial(&self) -> Option<&TrajectoryPoint> {
        self.points.first()
    }

    #[must_use]
    pub fn last(&self) -> Option<&TrajectoryPoint> {
        self.points.last()
    }

    /// The point whose time is exactly `time`, if any.
    #[must_use]
    pub fn at(&self, time: f64) -> Option<&TrajectoryPoint> {
        self.points
            .binary_search_by(|point| point.time.total_cmp(&time))
            .ok()
            .map(|index| &self.points[index])
    }

    /// Values of one compartment at every output time.
    #[must_use]
    pub fn series(&self, compartment: Compartment) -> Vec<f64> {
        self.points
            .iter()
            .map(|point| point.state[compartment])
            .collect()
    }

    /// New hospital admissions per day, `σ · I(t)`, at every output time.
    #[must_use]
    pub fn new_hospitalizations(&self) -> Vec<f64> {
        self.points
            .iter()
            .map(|point| point.new_hospitalizations(&self.rates))
            .collect()
    }

    /// The point where `compartment` is largest. Earlier points win ties.
    #[must_use]
    pub fn peak(&self, compartment: Compartment) -> Option<&TrajectoryPoint> {
        self.points.iter().fold(None, |best, point| match best {
            Some(best) if best.state[compartment] >= point.state[compartment] => Some(best),
            _ => Some(point),
        })
    }

    /// Largest relative deviation of the total population from its initial
    /// value.
    #[must_use]
    pub fn max_conservation_error(&self) -> f64 {
        let Some(initial) = self.initial() else {
            return 0.0;
        };
        let total = initial.state.total();
        self.points
            .iter()
            .map(|point| relative_difference(point.state.total(), total))
            .fold(0.0, f64::max)
    }
}

impl<'a> IntoIterator for &'a Trajectory {
    type Item = &'a TrajectoryPoint;
    type IntoIter = std::slice::Iter<'a, TrajectoryPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Trajectory {
        let rates = RateParameters::belgium_spring_2020();
        let points = [(0.0, 10.0), (1.0, 30.0), (2.0, 30.0), (3.0, 5.0)]
            .into_iter()
            .map(|(time, infected)| TrajectoryPoint {
                time,
                state: CompartmentState::new(100.0 - infected, 0.0, infected, 0.0, 0.0, 0.0),
            })
            .collect();
        Trajectory::new(rates, points)
    }

    #[test]
    fn series_and_derived_admissions() {
        let trajectory = sample();
        assert_eq!(trajectory.len(), 4);
        assert_eq!(trajectory.times(), vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(
            trajectory.series(Compartment::Infected),
            vec![10.0, 30.0, 30.0, 5.0]
        );
        assert_eq!(
            trajectory.new_hospitalizations(),
            vec![2.5, 7.5, 7.5, 1.25]
        );
    }

    #[test]
    fn peak_prefers_earliest() {
        let trajectory = sample();
        assert_eq!(trajectory.peak(Compartment::Infected).unwrap().time, 1.0);
        assert_eq!(trajectory.peak(Compartment::Susceptible).unwrap().time, 3.0);
    }

    #[test]
    fn lookup_by_exact_time() {
        let trajectory = sample();
        assert_eq!(trajectory.at(2.0).unwrap().state.infected, 30.0);
        assert!(trajectory.at(2.5).is_none());
    }

    #[test]
    fn conservation_error_of_closed_population_is_zero() {
        assert_eq!(sample().max_conservation_error(), 0.0);
        let empty = Trajectory::new(RateParameters::belgium_spring_2020(), Vec::new());
        assert!(empty.is_empty());
        assert_eq!(empty.max_conservation_error(), 0.0);
    }
}
