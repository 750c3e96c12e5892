//! Provides `SeihrdError` and maps other errors to it.
//!
//! The simulator itself only ever produces [`SeihrdError::InvalidInput`],
//! [`SeihrdError::NonFiniteResult`] and [`SeihrdError::IntegrationFailed`].
//! The remaining variants come from the configuration, data loading and
//! reporting layers.
use std::fmt::{self, Debug, Display};
use std::io;

use crate::compartments::CompartmentState;

#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum SeihrdError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    CSVError(csv::Error),
    /// A malformed time grid, a negative initial compartment, a negative rate
    /// or an unusable solver setting.
    InvalidInput(String),
    /// The solver produced a NaN or an infinity while integrating towards
    /// `times[index]`. `time` is the solver time that was being attempted and
    /// `last_valid` is the last finite state it accepted.
    NonFiniteResult {
        index: usize,
        time: f64,
        last_valid: CompartmentState,
    },
    /// The solver could not reach `times[index]`.
    IntegrationFailed {
        index: usize,
        time: f64,
        reason: String,
    },
    ReportError(String),
    SeihrdError(String),
}

impl SeihrdError {
    /// Convenience constructor for `InvalidInput`.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        SeihrdError::InvalidInput(message.into())
    }

    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, SeihrdError::InvalidInput(_))
    }
}

impl From<io::Error> for SeihrdError {
    fn from(error: io::Error) -> Self {
        SeihrdError::IoError(error)
    }
}

impl From<serde_json::Error> for SeihrdError {
    fn from(error: serde_json::Error) -> Self {
        SeihrdError::JsonError(error)
    }
}

impl From<csv::Error> for SeihrdError {
    fn from(error: csv::Error) -> Self {
        SeihrdError::CSVError(error)
    }
}

impl From<String> for SeihrdError {
    fn from(error: String) -> Self {
        SeihrdError::SeihrdError(error)
    }
}

impl From<&str> for SeihrdError {
    fn from(error: &str) -> Self {
        SeihrdError::SeihrdError(error.to_string())
    }
}

impl std::error::Error for SeihrdError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SeihrdError::IoError(error) => Some(error),
            SeihrdError::JsonError(error) => Some(error),
            SeihrdError::CSVError(error) => Some(error),
            _ => None,
        }
    }
}

impl Display for SeihrdError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SeihrdError::InvalidInput(message) => write!(f, "invalid input: {message}"),
            SeihrdError::NonFiniteResult {
                index,
                time,
                last_valid,
            } => write!(
                f,
                "integration produced a non-finite value at t={time} \
                 (output index {index}); last valid state: {last_valid}"
            ),
            SeihrdError::IntegrationFailed {
                index,
                time,
                reason,
            } => write!(
                f,
                "integration failed at t={time} (output index {index}): {reason}"
            ),
            SeihrdError::ReportError(message) => write!(f, "report error: {message}"),
            _ => write!(f, "Error: {self:?}"),
        }
    }
}
