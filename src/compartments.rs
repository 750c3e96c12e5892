//! The six compartments of the SEIHRD model and a snapshot of their sizes.
//!
//! A [`CompartmentState`] is a plain record of six population counts. The
//! solver works on `[f64; 6]` vectors, so the state converts to and from an
//! array in S, E, I, H, R, D order. [`Compartment`] names each slot and is
//! used to pull single series out of a trajectory and to label report columns.

use std::fmt::{self, Display};
use std::ops::Index;

use serde::{Deserialize, Serialize};
use strum::{Display as StrumDisplay, EnumCount, EnumIter, IntoEnumIterator};

use crate::error::SeihrdError;

/// Number of compartments in the model.
pub const COMPARTMENT_COUNT: usize = Compartment::COUNT;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter, EnumCount, StrumDisplay)]
#[strum(serialize_all = "snake_case")]
pub enum Compartment {
    Susceptible,
    Exposed,
    Infected,
    Hospitalized,
    Recovered,
    Deceased,
}

impl Compartment {
    /// Position of this compartment in the state vector.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// One-letter label used in compact log output.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Compartment::Susceptible => "S",
            Compartment::Exposed => "E",
            Compartment::Infected => "I",
            Compartment::Hospitalized => "H",
            Compartment::Recovered => "R",
            Compartment::Deceased => "D",
        }
    }
}

/// Sizes of the six compartments at one instant.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CompartmentState {
    pub susceptible: f64,
    pub exposed: f64,
    pub infected: f64,
    pub hospitalized: f64,
    pub recovered: f64,
    pub deceased: f64,
}

impl CompartmentState {
    #[must_use]
    pub fn new(
        susceptible: f64,
        exposed: f64,
        infected: f64,
        hospitalized: f64,
        recovered: f64,
        deceased: f64,
    ) -> Self {
        Self {
            susceptible,
            exposed,
            infected,
            hospitalized,
            recovered,
            deceased,
        }
    }

    /// A population of `population` people of whom `exposed` are exposed and
    /// `infected` are infectious; everyone else is susceptible.
    #[must_use]
    pub fn seeded(population: f64, exposed: f64, infected: f64) -> Self {
        Self {
            susceptible: population - exposed - infected,
            exposed,
            infected,
            ..Self::default()
        }
    }

    /// S + E + I + H + R + D
    #[must_use]
    pub fn total(&self) -> f64 {
        self.to_array().iter().sum()
    }

    #[must_use]
    pub fn get(&self, compartment: Compartment) -> f64 {
        self.to_array()[compartment.index()]
    }

    #[must_use]
    pub fn to_array(&self) -> [f64; COMPARTMENT_COUNT] {
        [
            self.susceptible,
            self.exposed,
            self.infected,
            self.hospitalized,
            self.recovered,
            self.deceased,
        ]
    }

    #[must_use]
    pub fn from_array(values: [f64; COMPARTMENT_COUNT]) -> Self {
        let [susceptible, exposed, infected, hospitalized, recovered, deceased] = values;
        Self {
            susceptible,
            exposed,
            infected,
            hospitalized,
            recovered,
            deceased,
        }
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|value| value.is_finite())
    }

    /// Checks that every compartment is finite and non-negative.
    ///
    /// # Errors
    ///
    /// Returns `SeihrdError::InvalidInput` naming the first offending
    /// compartment.
    pub fn validate(&self) -> Result<(), SeihrdError> {
        for compartment in Compartment::iter() {
            let value = self.get(compartment);
            if !value.is_finite() {
                return Err(SeihrdError::invalid_input(format!(
                    "initial {compartment} count must be finite, got {value}"
                )));
            }
            if value < 0.0 {
                return Err(SeihrdError::invalid_input(format!(
                    "initial {compartment} count must be non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}

impl From<[f64; COMPARTMENT_COUNT]> for CompartmentState {
    fn from(values: [f64; COMPARTMENT_COUNT]) -> Self {
        Self::from_array(values)
    }
}

impl From<CompartmentState> for [f64; COMPARTMENT_COUNT] {
    fn from(state: CompartmentState) -> Self {
        state.to_array()
    }
}

impl Index<Compartment> for CompartmentState {
    type Output = f64;

    fn index(&self, compartment: Compartment) -> &f64 {
        match compartment {
            Compartment::Susceptible => &self.susceptible,
            Compartment::Exposed => &self.exposed,
            Compartment::Infected => &self.infected,
            Compartment::Hospitalized => &self.hospitalized,
            Compartment::Recovered => &self.recovered,
            Compartment::Deceased => &self.deceased,
        }
    }
}

impl Display for CompartmentState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut first = true;
        for compartment in Compartment::iter() {
            if !first {
                write!(f, " ")?;
            }
            first = false;
            write!(f, "{}={}", compartment.symbol(), self[compartment])?;
        }
        Ok(())
    }
}
