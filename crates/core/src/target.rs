//! Intervention targets: time-varying care-cascade and vaccination goals.
//!
//! A [`Target`] is built once from a scenario description and then only
//! evaluated.
//! Each of its four cascade dimensions follows a [`Schedule`], a primitive
//! time shape anchored on the proportion the population had initially.

use thiserror::Error;

use crate::{
    Parameters, Proportions,
    constraint::{ConstraintError, UnitInterval},
};

#[cfg(feature = "serde-derive")]
use serde::{Deserialize, Serialize};

/// The time course of one target proportion.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-derive", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde-derive", serde(rename_all = "snake_case"))]
pub enum Schedule {
    /// Always zero.
    Zero,
    /// Held at the initial proportion.
    Initial,
    /// A fixed proportion, never below the initial proportion.
    Constant(f64),
    /// Linear from the initial proportion at `start` to `value` at `end`,
    /// then held at `value`.
    ///
    /// The result is never below the initial proportion, so a ramp toward a
    /// goal already exceeded holds the initial value.
    Ramp { value: f64, start: f64, end: f64 },
}

impl Schedule {
    /// Evaluates the schedule at time `t` given the initial proportion.
    #[must_use]
    pub fn evaluate(&self, t: f64, initial: f64) -> f64 {
        match *self {
            Schedule::Zero => 0.0,
            Schedule::Initial => initial,
            Schedule::Constant(value) => value.max(initial),
            Schedule::Ramp { value, start, end } => {
                let ramped = if t <= start {
                    initial
                } else if t >= end {
                    value
                } else {
                    initial + (value - initial) * (t - start) / (end - start)
                };
                ramped.max(initial)
            }
        }
    }

    fn validate(&self, dimension: &'static str) -> Result<(), TargetError> {
        let invalid = |source| TargetError::InvalidProportion { dimension, source };
        match *self {
            Schedule::Zero | Schedule::Initial => Ok(()),
            Schedule::Constant(value) => UnitInterval::new(value).map(|_| ()).map_err(invalid),
            Schedule::Ramp { value, start, end } => {
                UnitInterval::new(value).map_err(invalid)?;
                if start.is_finite() && end.is_finite() && start <= end {
                    Ok(())
                } else {
                    Err(TargetError::InvalidInterval {
                        dimension,
                        start,
                        end,
                    })
                }
            }
        }
    }
}

/// When a target starts to scale up and how long it takes to reach its goal.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-derive", derive(Serialize, Deserialize))]
pub struct ScaleUp {
    /// Calendar year the scale-up begins.
    pub start: f64,
    /// Years from `start` until the goal is reached.
    pub duration: f64,
}

impl ScaleUp {
    #[must_use]
    pub fn new(start: f64, duration: f64) -> Self {
        Self { start, duration }
    }

    fn ramp(self, value: f64) -> Schedule {
        Schedule::Ramp {
            value,
            start: self.start,
            end: self.start + self.duration,
        }
    }
}

/// A vaccination programme attached to a [`Target`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-derive", derive(Serialize, Deserialize))]
pub struct Vaccine {
    /// Relative reduction in susceptibility.
    pub efficacy: f64,
    /// Proportion of uninfected people vaccinated once scaled up.
    pub coverage: f64,
    /// Calendar year and duration of the roll-out.
    pub roll_out: ScaleUp,
}

/// Errors raised by [`Target::validate`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TargetError {
    #[error("invalid {dimension} proportion: {source}")]
    InvalidProportion {
        dimension: &'static str,
        #[source]
        source: ConstraintError,
    },

    #[error("invalid {dimension} ramp interval: start {start}, end {end}")]
    InvalidInterval {
        dimension: &'static str,
        start: f64,
        end: f64,
    },

    #[error("invalid vaccine efficacy: {0}")]
    InvalidEfficacy(#[source] ConstraintError),
}

/// A policy scenario: one [`Schedule`] per cascade dimension.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-derive", derive(Serialize, Deserialize))]
pub struct Target {
    label: String,
    diagnosed: Schedule,
    treated: Schedule,
    suppressed: Schedule,
    vaccinated: Schedule,
    vaccine: Option<Vaccine>,
}

impl Target {
    /// Holds every cascade proportion at its initial value, with no vaccine.
    #[must_use]
    pub fn status_quo() -> Self {
        Self {
            label: "Status quo".to_owned(),
            diagnosed: Schedule::Initial,
            treated: Schedule::Initial,
            suppressed: Schedule::Initial,
            vaccinated: Schedule::Zero,
            vaccine: None,
        }
    }

    /// Scales each cascade proportion linearly toward `levels`.
    ///
    /// `levels` are the diagnosed, treated, and suppressed goals.
    #[must_use]
    pub fn cascade(label: impl Into<String>, levels: [f64; 3], scale_up: ScaleUp) -> Self {
        let [diagnosed, treated, suppressed] = levels;
        Self {
            label: label.into(),
            diagnosed: scale_up.ramp(diagnosed),
            treated: scale_up.ramp(treated),
            suppressed: scale_up.ramp(suppressed),
            vaccinated: Schedule::Zero,
            vaccine: None,
        }
    }

    /// The UNAIDS 90-90-90 goals, scaled up from 2015 to 2020.
    #[must_use]
    pub fn unaids_90_90_90() -> Self {
        Self::cascade("90-90-90", [0.9, 0.9, 0.9], ScaleUp::new(2015.0, 5.0))
    }

    /// The UNAIDS 95-95-95 goals, scaled up from 2015 to 2030.
    #[must_use]
    pub fn unaids_95_95_95() -> Self {
        Self::cascade("95-95-95", [0.95, 0.95, 0.95], ScaleUp::new(2015.0, 15.0))
    }

    /// Builds a target from explicit schedules, without a vaccine.
    #[must_use]
    pub fn from_schedules(
        label: impl Into<String>,
        diagnosed: Schedule,
        treated: Schedule,
        suppressed: Schedule,
    ) -> Self {
        Self {
            label: label.into(),
            diagnosed,
            treated,
            suppressed,
            vaccinated: Schedule::Zero,
            vaccine: None,
        }
    }

    /// Returns this target with a vaccine rolled out on top of it.
    ///
    /// The label gets a `+ vaccine` suffix and the vaccine's efficacy replaces
    /// the parameter efficacy during a solve.
    #[must_use]
    pub fn with_vaccine(self, vaccine: Vaccine) -> Self {
        Self {
            label: format!("{} + vaccine", self.label),
            vaccinated: vaccine.roll_out.ramp(vaccine.coverage),
            vaccine: Some(vaccine),
            ..self
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn vaccine(&self) -> Option<&Vaccine> {
        self.vaccine.as_ref()
    }

    /// The vaccine efficacy in effect, from the attached vaccine if any.
    #[must_use]
    pub fn vaccine_efficacy(&self, parameters: &Parameters) -> f64 {
        self.vaccine
            .map_or(parameters.vaccine_efficacy, |vaccine| vaccine.efficacy)
    }

    /// Target proportions at time `t`, anchored on the `initial` proportions.
    #[must_use]
    pub fn evaluate(&self, t: f64, initial: &Proportions) -> Proportions {
        Proportions {
            diagnosed: self.diagnosed.evaluate(t, initial.diagnosed),
            treated: self.treated.evaluate(t, initial.treated),
            suppressed: self.suppressed.evaluate(t, initial.suppressed),
            vaccinated: self.vaccinated.evaluate(t, initial.vaccinated),
        }
    }

    /// Target proportions at each of `times` for a population starting from
    /// `parameters.initial_conditions`.
    #[must_use]
    pub fn evaluate_many(&self, times: &[f64], parameters: &Parameters) -> Vec<Proportions> {
        let initial = parameters.initial_proportions();
        times.iter().map(|&t| self.evaluate(t, &initial)).collect()
    }

    /// Checks that every goal is a proportion and every ramp interval is ordered.
    ///
    /// # Errors
    ///
    /// Returns a [`TargetError`] naming the first invalid dimension.
    pub fn validate(&self) -> Result<(), TargetError> {
        self.diagnosed.validate("diagnosed")?;
        self.treated.validate("treated")?;
        self.suppressed.validate("suppressed")?;
        self.vaccinated.validate("vaccinated")?;
        if let Some(vaccine) = self.vaccine {
            UnitInterval::new(vaccine.efficacy).map_err(TargetError::InvalidEfficacy)?;
        }
        Ok(())
    }
}
