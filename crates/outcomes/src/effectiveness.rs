//! Health outcomes: disability- and quality-adjusted life years.

use hivsim_core::Compartments;
use serde::{Deserialize, Serialize};

use crate::quadrature::simpson;

/// Disability weight of each living compartment.
///
/// A weight of 0 is full health and 1 is equivalent to death.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisabilityWeights {
    pub susceptible: f64,
    pub vaccinated: f64,
    pub acute: f64,
    pub undiagnosed: f64,
    pub diagnosed: f64,
    pub treated: f64,
    pub suppressed: f64,
    pub aids: f64,
}

impl Default for DisabilityWeights {
    /// Global Burden of Disease weights for untreated HIV, HIV on effective
    /// treatment, and AIDS.
    fn default() -> Self {
        Self {
            susceptible: 0.0,
            vaccinated: 0.0,
            acute: 0.274,
            undiagnosed: 0.274,
            diagnosed: 0.274,
            treated: 0.274,
            suppressed: 0.078,
            aids: 0.582,
        }
    }
}

impl DisabilityWeights {
    /// Years of healthy life lost per year across `state`.
    #[must_use]
    pub fn disability_rate(&self, state: &Compartments) -> f64 {
        self.susceptible * state.susceptible
            + self.vaccinated * state.vaccinated
            + self.acute * state.acute
            + self.undiagnosed * state.undiagnosed
            + self.diagnosed * state.diagnosed
            + self.treated * state.treated
            + self.suppressed * state.suppressed
            + self.aids * state.aids
    }

    /// Quality-adjusted years lived per year across `state`.
    ///
    /// Always `state.alive() - self.disability_rate(state)`.
    #[must_use]
    pub fn quality_rate(&self, state: &Compartments) -> f64 {
        state.alive() - self.disability_rate(state)
    }
}

/// Disability-adjusted life years accumulated along a trajectory.
///
/// # Panics
///
/// Panics if `times` and `trajectory` have different lengths.
#[must_use]
pub fn dalys(times: &[f64], trajectory: &[Compartments], weights: &DisabilityWeights) -> f64 {
    let rates: Vec<f64> = trajectory
        .iter()
        .map(|state| weights.disability_rate(state))
        .collect();
    simpson(times, &rates)
}

/// Quality-adjusted life years accumulated along a trajectory.
///
/// # Panics
///
/// Panics if `times` and `trajectory` have different lengths.
#[must_use]
pub fn qalys(times: &[f64], trajectory: &[Compartments], weights: &DisabilityWeights) -> f64 {
    let rates: Vec<f64> = trajectory
        .iter()
        .map(|state| weights.quality_rate(state))
        .collect();
    simpson(times, &rates)
}
