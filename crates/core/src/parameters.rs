use std::collections::HashMap;

use thiserror::Error;

use crate::{
    Compartments, Proportions,
    constraint::{ConstraintError, NonNegative, UnitInterval},
};

#[cfg(feature = "serde-derive")]
use serde::{Deserialize, Serialize};

/// Country-specific epidemiological parameters for one model run.
///
/// All rates are per person per year.
/// A `Parameters` value may be a point estimate or one draw from a
/// [`ParameterSampler`](crate::sampling::ParameterSampler); the model treats
/// both the same way.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-derive", derive(Serialize, Deserialize))]
pub struct Parameters {
    pub country: String,
    pub birth_rate: f64,
    /// Background (non-AIDS) mortality.
    pub death_rate: f64,
    /// Acute to chronic undiagnosed.
    pub progression_rate_acute: f64,
    /// Chronic unsuppressed (`U`, `D`, `T`) to AIDS.
    pub progression_rate_unsuppressed: f64,
    /// Virally suppressed to AIDS.
    pub progression_rate_suppressed: f64,
    /// Treated to virally suppressed.
    pub suppression_rate: f64,
    pub death_rate_aids: f64,
    pub transmission_rate_acute: f64,
    pub transmission_rate_unsuppressed: f64,
    pub transmission_rate_suppressed: f64,
    /// Relative reduction in susceptibility of vaccinated people.
    pub vaccine_efficacy: f64,
    /// Gross domestic product per capita, in the same currency as costs.
    pub gdp_per_capita: f64,
    pub initial_conditions: Compartments,
}

/// Errors raised while obtaining or validating [`Parameters`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParametersError {
    #[error("no parameters found for {country}")]
    NotFound { country: String },

    #[error("{country}: invalid {field}: {source}")]
    Invalid {
        country: String,
        field: &'static str,
        #[source]
        source: ConstraintError,
    },

    #[error("{country}: basic reproduction number is not finite ({r0})")]
    NonFiniteR0 { country: String, r0: f64 },

    #[error("{country}: initial conditions are all zero")]
    ZeroInitialConditions { country: String },

    #[error("{country}: initial conditions are not finite")]
    NonFiniteInitialConditions { country: String },
}

impl Parameters {
    /// The basic reproduction number in a fully susceptible, untreated population.
    ///
    /// ```text
    /// R0 = βA / (ρA + μ) + ρA / (ρA + μ) · βU / (ρU + μ)
    /// ```
    ///
    /// The first term counts infections during the acute stage, the second
    /// those during the chronic stage for people who survive acute infection.
    #[must_use]
    pub fn r0(&self) -> f64 {
        let acute_exit = self.progression_rate_acute + self.death_rate;
        let chronic_exit = self.progression_rate_unsuppressed + self.death_rate;

        self.transmission_rate_acute / acute_exit
            + self.progression_rate_acute / acute_exit * self.transmission_rate_unsuppressed
                / chronic_exit
    }

    /// Care-cascade proportions achieved by the initial population.
    #[must_use]
    pub fn initial_proportions(&self) -> Proportions {
        Proportions::of(&self.initial_conditions)
    }

    /// Checks the preconditions for solving with these parameters.
    ///
    /// # Errors
    ///
    /// Returns a [`ParametersError`] if any rate is negative or not finite,
    /// the vaccine efficacy lies outside `[0, 1]`, a live initial compartment
    /// is negative, the initial conditions are all zero or not finite, or the basic reproduction number is not finite.
    pub fn validate(&self) -> Result<(), ParametersError> {
        let rates = [
            ("birth_rate", self.birth_rate),
            ("death_rate", self.death_rate),
            ("progression_rate_acute", self.progression_rate_acute),
            (
                "progression_rate_unsuppressed",
                self.progression_rate_unsuppressed,
            ),
            (
                "progression_rate_suppressed",
                self.progression_rate_suppressed,
            ),
            ("suppression_rate", self.suppression_rate),
            ("death_rate_aids", self.death_rate_aids),
            ("transmission_rate_acute", self.transmission_rate_acute),
            (
                "transmission_rate_unsuppressed",
                self.transmission_rate_unsuppressed,
            ),
            (
                "transmission_rate_suppressed",
                self.transmission_rate_suppressed,
            ),
            ("gdp_per_capita", self.gdp_per_capita),
        ];
        for (field, value) in rates {
            NonNegative::new(value).map_err(|source| self.invalid(field, source))?;
        }

        UnitInterval::new(self.vaccine_efficacy)
            .map_err(|source| self.invalid("vaccine_efficacy", source))?;

        if !self.initial_conditions.is_finite() {
            return Err(ParametersError::NonFiniteInitialConditions {
                country: self.country.clone(),
            });
        }
        let initial = &self.initial_conditions;
        let live = [
            ("initial_conditions.susceptible", initial.susceptible),
            ("initial_conditions.vaccinated", initial.vaccinated),
            ("initial_conditions.acute", initial.acute),
            ("initial_conditions.undiagnosed", initial.undiagnosed),
            ("initial_conditions.diagnosed", initial.diagnosed),
            ("initial_conditions.treated", initial.treated),
            ("initial_conditions.suppressed", initial.suppressed),
            ("initial_conditions.aids", initial.aids),
        ];
        for (field, value) in live {
            NonNegative::new(value).map_err(|source| self.invalid(field, source))?;
        }
        if self.initial_conditions.is_all_zero() {
            return Err(ParametersError::ZeroInitialConditions {
                country: self.country.clone(),
            });
        }

        let r0 = self.r0();
        if !r0.is_finite() {
            return Err(ParametersError::NonFiniteR0 {
                country: self.country.clone(),
                r0,
            });
        }

        Ok(())
    }

    fn invalid(&self, field: &'static str, source: ConstraintError) -> ParametersError {
        ParametersError::Invalid {
            country: self.country.clone(),
            field,
            source,
        }
    }
}

/// Supplies parameters by country.
///
/// Implementations must report unknown countries with
/// [`ParametersError::NotFound`] rather than substituting defaults.
pub trait ParameterSource {
    /// Returns the parameters for `country`.
    ///
    /// # Errors
    ///
    /// Returns [`ParametersError::NotFound`] if the source has no entry for `country`.
    fn parameters(&self, country: &str) -> Result<Parameters, ParametersError>;
}

/// An in-memory [`ParameterSource`] keyed by country.
#[derive(Debug, Clone, Default)]
pub struct ParameterTable {
    entries: HashMap<String, Parameters>,
}

impl ParameterTable {
    /// Creates a table from parameter records, keyed by their `country`.
    ///
    /// A later record for the same country replaces an earlier one.
    pub fn new<I>(records: I) -> Self
    where
        I: IntoIterator<Item = Parameters>,
    {
        let entries = records
            .into_iter()
            .map(|parameters| (parameters.country.clone(), parameters))
            .collect();
        Self { entries }
    }

    /// Adds or replaces the record for its country.
    pub fn insert(&mut self, parameters: Parameters) {
        self.entries.insert(parameters.country.clone(), parameters);
    }

    /// Returns the countries in the table, sorted.
    #[must_use]
    pub fn countries(&self) -> Vec<&str> {
        let mut countries: Vec<_> = self.entries.keys().map(String::as_str).collect();
        countries.sort_unstable();
        countries
    }
}

impl ParameterSource for ParameterTable {
    fn parameters(&self, country: &str) -> Result<Parameters, ParametersError> {
        self.entries
            .get(country)
            .cloned()
            .ok_or_else(|| ParametersError::NotFound {
                country: country.to_owned(),
            })
    }
}
