//! An SEIHRD compartmental model of COVID-19 hospital admissions
//!
//! The population is split into six compartments: Susceptible, Exposed,
//! Infectious, Hospitalized, Recovered and Dead. Their evolution is a system of
//! ordinary differential equations driven by six per-day rates, integrated
//! numerically and sampled at requested output times. The quantity of interest
//! is the daily number of new hospital admissions, `σ · I(t)`, which can be
//! compared against observed admission counts.
//!
//! The pieces are:
//! * [`compartments`] and [`parameters`] hold the model state and the rates.
//! * [`model`] evaluates the right-hand side of the equations.
//! * [`ode`] provides the integrators: an adaptive Dormand-Prince 5(4)
//!   solver and a fixed-step fourth order Runge-Kutta solver.
//! * [`simulator`] validates input, runs an integrator and produces a
//!   [`Trajectory`].
//! * [`scenario`] loads complete runs from JSON, including the Belgium
//!   spring 2020 defaults.
//! * [`observed`] and [`comparison`] load admission counts from CSV and line
//!   them up against the model.
//! * [`report`] writes trajectories and comparisons as CSV files.
//! * [`runner`] and the `seihrd` binary tie everything together from the
//!   command line.
//!
//! ```
//! use seihrd::{CompartmentState, EpidemicSimulator, RateParameters};
//!
//! let initial = CompartmentState::seeded(1_000_000.0, 100.0, 10.0);
//! let times: Vec<f64> = (0..=30).map(f64::from).collect();
//! let trajectory = EpidemicSimulator::default()
//!     .simulate(&initial, &RateParameters::belgium_spring_2020(), &times)
//!     .unwrap();
//! assert_eq!(trajectory.len(), 31);
//! ```
pub mod comparison;
pub mod compartments;
pub mod error;
pub mod log;
pub mod model;
pub mod numeric;
pub mod observed;
pub mod ode;
pub mod parameters;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod simulator;
pub mod trajectory;

mod macros;

pub use compartments::{Compartment, CompartmentState};
pub use error::SeihrdError;
pub use parameters::RateParameters;
pub use scenario::Scenario;
pub use simulator::{simulate, EpidemicSimulator};
pub use trajectory::Trajectory;

