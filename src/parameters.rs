use serde::{Deserialize, Serialize};

use crate::error::SeihrdError;

/// Per-day transition rates of the SEIHRD model.
///
/// The field names follow the Greek letters used in the model equations.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RateParameters {
    /// Transmission rate (β).
    pub beta: f64,
    /// Exposed to infectious (ε), one over the latent period.
    pub epsilon: f64,
    /// Infectious to hospitalized (σ).
    pub sigma: f64,
    /// Infectious to recovered (μ).
    pub mu: f64,
    /// Hospitalized to recovered (τ).
    pub tau: f64,
    /// Hospitalized to deceased (θ).
    pub theta: f64,
}

impl RateParameters {
    /// Rates used for Belgium in spring 2020.
    #[must_use]
    pub fn belgium_spring_2020() -> Self {
        Self {
            beta: 0.0999,
            epsilon: 0.714,
            sigma: 0.25,
            mu: (1.0 / 2.4_f64).powi(2),
            tau: 0.2,
            theta: 0.25,
        }
    }

    /// Basic reproduction number `β / (σ + μ)`. Infinite when nobody ever
    /// leaves the infectious compartment.
    #[must_use]
    pub fn basic_reproduction_number(&self) -> f64 {
        self.beta / (self.sigma + self.mu)
    }

    fn named(&self) -> [(&'static str, f64); 6] {
        [
            ("beta", self.beta),
            ("epsilon", self.epsilon),
            ("sigma", self.sigma),
            ("mu", self.mu),
            ("tau", self.tau),
            ("theta", self.theta),
        ]
    }

    /// # Errors
    ///
    /// Returns `SeihrdError::InvalidInput` if any rate is negative or not
    /// finite.
    pub fn validate(&self) -> Result<(), SeihrdError> {
        for (name, value) in self.named() {
            if !value.is_finite() || value < 0.0 {
                return Err(SeihrdError::invalid_input(format!(
                    "rate {name} must be finite and non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}
