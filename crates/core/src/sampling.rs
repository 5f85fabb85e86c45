//! Stochastic parameters.
//!
//! A [`ParameterSampler`] perturbs selected fields of a point-estimate
//! [`Parameters`] with independent draws, producing parameter sets for an
//! ensemble of model runs.

use rand::{Rng, SeedableRng, distributions::Uniform};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Beta, Pert, Triangular};
use thiserror::Error;

use crate::{Parameters, ParametersError};

#[cfg(feature = "serde-derive")]
use serde::{Deserialize, Serialize};

/// A scalar field of [`Parameters`] that can be sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-derive", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde-derive", serde(rename_all = "snake_case"))]
pub enum ParameterKind {
    BirthRate,
    DeathRate,
    ProgressionRateAcute,
    ProgressionRateUnsuppressed,
    ProgressionRateSuppressed,
    SuppressionRate,
    DeathRateAids,
    TransmissionRateAcute,
    TransmissionRateUnsuppressed,
    TransmissionRateSuppressed,
    VaccineEfficacy,
}

impl ParameterKind {
    fn field_mut(self, parameters: &mut Parameters) -> &mut f64 {
        match self {
            ParameterKind::BirthRate => &mut parameters.birth_rate,
            ParameterKind::DeathRate => &mut parameters.death_rate,
            ParameterKind::ProgressionRateAcute => &mut parameters.progression_rate_acute,
            ParameterKind::ProgressionRateUnsuppressed => {
                &mut parameters.progression_rate_unsuppressed
            }
            ParameterKind::ProgressionRateSuppressed => &mut parameters.progression_rate_suppressed,
            ParameterKind::SuppressionRate => &mut parameters.suppression_rate,
            ParameterKind::DeathRateAids => &mut parameters.death_rate_aids,
            ParameterKind::TransmissionRateAcute => &mut parameters.transmission_rate_acute,
            ParameterKind::TransmissionRateUnsuppressed => {
                &mut parameters.transmission_rate_unsuppressed
            }
            ParameterKind::TransmissionRateSuppressed => {
                &mut parameters.transmission_rate_suppressed
            }
            ParameterKind::VaccineEfficacy => &mut parameters.vaccine_efficacy,
        }
    }

    /// Reads this field from `parameters`.
    #[must_use]
    pub fn get(self, parameters: &Parameters) -> f64 {
        match self {
            ParameterKind::BirthRate => parameters.birth_rate,
            ParameterKind::DeathRate => parameters.death_rate,
            ParameterKind::ProgressionRateAcute => parameters.progression_rate_acute,
            ParameterKind::ProgressionRateUnsuppressed => parameters.progression_rate_unsuppressed,
            ParameterKind::ProgressionRateSuppressed => parameters.progression_rate_suppressed,
            ParameterKind::SuppressionRate => parameters.suppression_rate,
            ParameterKind::DeathRateAids => parameters.death_rate_aids,
            ParameterKind::TransmissionRateAcute => parameters.transmission_rate_acute,
            ParameterKind::TransmissionRateUnsuppressed => {
                parameters.transmission_rate_unsuppressed
            }
            ParameterKind::TransmissionRateSuppressed => parameters.transmission_rate_suppressed,
            ParameterKind::VaccineEfficacy => parameters.vaccine_efficacy,
        }
    }

    /// Overwrites this field of `parameters` with `value`.
    pub fn apply(self, parameters: &mut Parameters, value: f64) {
        *self.field_mut(parameters) = value;
    }
}

/// A univariate distribution for one sampled parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-derive", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde-derive",
    serde(tag = "distribution", rename_all = "snake_case")
)]
pub enum Distribution {
    Constant { value: f64 },
    Uniform { min: f64, max: f64 },
    Triangular { min: f64, mode: f64, max: f64 },
    /// A beta-PERT distribution, the usual choice for expert-elicited ranges.
    Pert { min: f64, mode: f64, max: f64 },
    Beta { alpha: f64, beta: f64 },
}

/// Errors raised while sampling parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SamplingError {
    #[error("invalid {kind:?} distribution: {reason}")]
    InvalidDistribution {
        kind: ParameterKind,
        reason: String,
    },

    #[error("sampled parameters are invalid: {0}")]
    InvalidSample(#[from] ParametersError),
}

impl Distribution {
    /// Draws one value.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem if the distribution's
    /// parameters are invalid.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64, String> {
        match *self {
            Distribution::Constant { value } => Ok(value),
            Distribution::Uniform { min, max } => {
                if !(min.is_finite() && max.is_finite() && min < max) {
                    return Err(format!("uniform bounds must satisfy min < max, got [{min}, {max}]"));
                }
                Ok(rng.sample(Uniform::new(min, max)))
            }
            Distribution::Triangular { min, mode, max } => Triangular::new(min, max, mode)
                .map(|dist| rng.sample(dist))
                .map_err(|err| err.to_string()),
            Distribution::Pert { min, mode, max } => Pert::new(min, max, mode)
                .map(|dist| rng.sample(dist))
                .map_err(|err| err.to_string()),
            Distribution::Beta { alpha, beta } => Beta::new(alpha, beta)
                .map(|dist| rng.sample(dist))
                .map_err(|err| err.to_string()),
        }
    }
}

/// Draws parameter sets around a point estimate.
///
/// Fields without a distribution keep their point-estimate value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-derive", derive(Serialize, Deserialize))]
pub struct ParameterSampler {
    mode: Parameters,
    distributions: Vec<(ParameterKind, Distribution)>,
}

impl ParameterSampler {
    #[must_use]
    pub fn new(mode: Parameters) -> Self {
        Self {
            mode,
            distributions: Vec::new(),
        }
    }

    /// Samples `kind` from `distribution`, replacing any earlier choice for it.
    #[must_use]
    pub fn with(mut self, kind: ParameterKind, distribution: Distribution) -> Self {
        self.distributions.retain(|(existing, _)| *existing != kind);
        self.distributions.push((kind, distribution));
        self
    }

    /// The point estimate the sampler perturbs.
    #[must_use]
    pub fn mode(&self) -> &Parameters {
        &self.mode
    }

    /// Draws one validated parameter set.
    ///
    /// # Errors
    ///
    /// Returns a [`SamplingError`] if a distribution is invalid or the drawn
    /// parameters fail [`Parameters::validate`].
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Parameters, SamplingError> {
        let mut parameters = self.mode.clone();
        for &(kind, distribution) in &self.distributions {
            let value = distribution
                .sample(rng)
                .map_err(|reason| SamplingError::InvalidDistribution { kind, reason })?;
            kind.apply(&mut parameters, value);
        }
        parameters.validate()?;
        Ok(parameters)
    }

    /// Draws `n` parameter sets from a generator seeded with `seed`.
    ///
    /// The same seed always yields the same sets.
    ///
    /// # Errors
    ///
    /// Returns the first [`SamplingError`] encountered.
    pub fn samples(&self, n: usize, seed: u64) -> Result<Vec<Parameters>, SamplingError> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..n).map(|_| self.sample(&mut rng)).collect()
    }
}
