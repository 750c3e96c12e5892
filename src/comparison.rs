//! Lines a simulated trajectory up against observed admissions.
//!
//! Observation dates are turned into day offsets from the first observed
//! date and paired with the trajectory point whose time equals that offset.
//! The modeled counterpart of an observed daily admission count is the
//! derived series `σ · I(t)`.

use chrono::NaiveDate;
use log::debug;
use serde::Serialize;

use crate::observed::ObservedSeries;
use crate::trajectory::Trajectory;

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub day: i64,
    pub date: NaiveDate,
    pub observed: u64,
    pub modeled_new_hospitalizations: f64,
    pub modeled_hospitalized: f64,
}

impl ComparisonRow {
    /// Modeled minus observed admissions.
    #[must_use]
    pub fn residual(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let observed = self.observed as f64;
        self.modeled_new_hospitalizations - observed
    }
}

/// Goodness-of-fit summaries of a [`Comparison`].
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct FitSummary {
    pub days: usize,
    pub sum_squared_error: f64,
    pub root_mean_squared_error: f64,
    pub mean_absolute_error: f64,
    pub observed_peak_day: i64,
    pub modeled_peak_day: i64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Comparison {
    rows: Vec<ComparisonRow>,
}

impl Comparison {
    /// Pairs every observation with the trajectory point at its day offset.
    /// Observations beyond the simulated horizon, or on days the trajectory
    /// has no output time for, are left out.
    #[must_use]
    pub fn new(trajectory: &Trajectory, observed: &ObservedSeries) -> Self {
        let rates = trajectory.rates();
        let mut unmatched = 0_usize;
        let rows = observed
            .with_offsets()
            .filter_map(|(day, observation)| {
                #[allow(clippy::cast_precision_loss)]
                let time = day as f64;
                let Some(point) = trajectory.at(time) else {
                    unmatched += 1;
                    return None;
                };
                Some(ComparisonRow {
                    day,
                    date: observation.date,
                    observed: observation.count,
                    modeled_new_hospitalizations: point.new_hospitalizations(rates),
                    modeled_hospitalized: point.state.hospitalized,
                })
            })
            .collect();
        if unmatched > 0 {
            debug!("{unmatched} observed days have no matching output time");
        }
        Self { rows }
    }

    #[must_use]
    pub fn rows(&self) -> &[ComparisonRow] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `None` when no day could be matched.
    #[must_use]
    pub fn summary(&self) -> Option<FitSummary> {
        if self.rows.is_empty() {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let n = self.rows.len() as f64;
        let sum_squared_error: f64 = self.rows.iter().map(|row| row.residual().powi(2)).sum();
        let absolute_error: f64 = self.rows.iter().map(|row| row.residual().abs()).sum();

        let observed_peak = self.rows.iter().fold(&self.rows[0], |best, row| {
            if row.observed > best.observed {
                row
            } else {
                best
            }
        });
        let modeled_peak = self.rows.iter().fold(&self.rows[0], |best, row| {
            if row.modeled_new_hospitalizations > best.modeled_new_hospitalizations {
                row
            } else {
                best
            }
        });

        Some(FitSummary {
            days: self.rows.len(),
            sum_squared_error,
            root_mean_squared_error: (sum_squared_error / n).sqrt(),
            mean_absolute_error: absolute_error / n,
            observed_peak_day: observed_peak.day,
            modeled_peak_day: modeled_peak.day,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_almost_eq;
    use crate::compartments::CompartmentState;
    use crate::parameters::RateParameters;
    use crate::simulator::simulate;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, m, d).unwrap()
    }

    fn trajectory() -> Trajectory {
        let rates = RateParameters {
            beta: 0.0,
            epsilon: 0.0,
            sigma: 0.5,
            mu: 0.0,
            tau: 0.0,
            theta: 0.0,
        };
        // Only σ moves people, so I(t) = 100 e^{-t/2} and H = 100 - I.
        let initial = CompartmentState::new(0.0, 0.0, 100.0, 0.0, 0.0, 0.0);
        let times: Vec<f64> = (0..=3).map(f64::from).collect();
        simulate(&initial, &rates, &times).unwrap()
    }

    #[test]
    fn aligns_by_day_offset() {
        let observed = ObservedSeries::from_pairs([
            (date(3, 15), 50),
            (date(3, 17), 20),
            // Beyond the simulated horizon.
            (date(3, 25), 1),
        ]);
        let comparison = Comparison::new(&trajectory(), &observed);
        assert_eq!(comparison.len(), 2);

        let rows = comparison.rows();
        assert_eq!((rows[0].day, rows[0].date), (0, date(3, 15)));
        assert_almost_eq!(rows[0].modeled_new_hospitalizations, 50.0, 1e-9);
        assert_almost_eq!(rows[0].modeled_hospitalized, 0.0, 1e-9);

        assert_eq!(rows[1].day, 2);
        assert_almost_eq!(rows[1].modeled_new_hospitalizations, 50.0 * (-1.0_f64).exp(), 1e-6);
        assert_almost_eq!(rows[1].modeled_hospitalized, 100.0 * (1.0 - (-1.0_f64).exp()), 1e-6);
    }

    #[test]
    fn summary_statistics() {
        let observed = ObservedSeries::from_pairs([(date(3, 15), 40), (date(3, 16), 40)]);
        let comparison = Comparison::new(&trajectory(), &observed);
        let summary = comparison.summary().unwrap();

        let r0 = 50.0 - 40.0;
        let r1 = 50.0 * (-0.5_f64).exp() - 40.0;
        assert_eq!(summary.days, 2);
        assert_almost_eq!(summary.sum_squared_error, r0 * r0 + r1 * r1, 1e-5);
        assert_almost_eq!(
            summary.root_mean_squared_error,
            ((r0 * r0 + r1 * r1) / 2.0).sqrt(),
            1e-5
        );
        assert_almost_eq!(summary.mean_absolute_error, (r0.abs() + r1.abs()) / 2.0, 1e-5);
        assert_eq!(summary.observed_peak_day, 0);
        assert_eq!(summary.modeled_peak_day, 0);
    }

    #[test]
    fn empty_comparison_has_no_summary() {
        let comparison = Comparison::new(&trajectory(), &ObservedSeries::default());
        assert!(comparison.is_empty());
        assert!(comparison.summary().is_none());
    }
}
