//! Control rates: the transition rates that steer the population toward a target.

use crate::{Compartments, Proportions};

#[cfg(feature = "serde-derive")]
use serde::{Deserialize, Serialize};

/// A clipped-linear approximation of the unit step.
///
/// Returns 0 for `x ≤ 0`, 1 for `x ≥ width`, and `x / width` in between.
/// Unlike a true step it is continuous, which keeps ODE solvers stable.
///
/// ```
/// use hivsim_core::control::ramp;
///
/// assert_eq!(ramp(-1.0, 1e-4), 0.0);
/// assert_eq!(ramp(0.5e-4, 1e-4), 0.5);
/// assert_eq!(ramp(1.0, 1e-4), 1.0);
/// ```
#[must_use]
pub fn ramp(x: f64, width: f64) -> f64 {
    (x / width).clamp(0.0, 1.0)
}

/// Upper bounds on the control rates and the width of the ramp that switches them.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-derive", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde-derive", serde(default))]
pub struct ControlLimits {
    pub diagnosis_rate_max: f64,
    pub treatment_rate_max: f64,
    pub nonadherence_rate_max: f64,
    pub vaccination_rate_max: f64,
    /// Shortfall in a proportion at which a rate reaches its maximum.
    pub ramp_width: f64,
}

impl Default for ControlLimits {
    fn default() -> Self {
        Self {
            diagnosis_rate_max: 1.0,
            treatment_rate_max: 10.0,
            nonadherence_rate_max: 1.0,
            vaccination_rate_max: 1.0,
            ramp_width: 1e-4,
        }
    }
}

/// Instantaneous control rates, per person per year.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControlRates {
    /// Undiagnosed to diagnosed.
    pub diagnosis: f64,
    /// Diagnosed to treated.
    pub treatment: f64,
    /// Treated or suppressed back to diagnosed.
    pub nonadherence: f64,
    /// Susceptible to vaccinated.
    pub vaccination: f64,
}

impl ControlRates {
    /// Computes the control rates for a population given the target proportions.
    ///
    /// Diagnosis, treatment, and vaccination switch on while the current
    /// proportion falls short of its target.
    /// Nonadherence switches on while the suppressed proportion *exceeds* its
    /// target, so a target below the achieved level actively moves people off
    /// suppression.
    /// Vaccination is zero whenever `vaccine_efficacy` is zero.
    #[must_use]
    pub fn compute(
        state: &Compartments,
        target: &Proportions,
        vaccine_efficacy: f64,
        limits: &ControlLimits,
    ) -> Self {
        let current = Proportions::of(state);
        let width = limits.ramp_width;

        let vaccination = if vaccine_efficacy > 0.0 {
            limits.vaccination_rate_max * ramp(target.vaccinated - current.vaccinated, width)
        } else {
            0.0
        };

        Self {
            diagnosis: limits.diagnosis_rate_max * ramp(target.diagnosed - current.diagnosed, width),
            treatment: limits.treatment_rate_max * ramp(target.treated - current.treated, width),
            nonadherence: limits.nonadherence_rate_max
                * ramp(current.suppressed - target.suppressed, width),
            vaccination,
        }
    }
}
