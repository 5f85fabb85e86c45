//! TOML configuration.
//!
//! Every section and field is optional; anything left out takes its default.
//!
//! ```toml
//! [controls]
//! treatment_rate_max = 5.0
//!
//! [solver]
//! horizon_years = 15.0
//! method = { kind = "dopri5", abs_tol = 1e-8, rel_tol = 1e-8 }
//!
//! [outcomes]
//! effectiveness = "qalys_gained"
//! breakpoint = 0.85
//!
//! [outcomes.costs]
//! aids = 1200.0
//! ```

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use hivsim_core::{
    ControlLimits,
    constraint::ConstraintError,
    model::DEFAULT_LOG_FLOOR,
};
use hivsim_solvers::{Method, SolveOptions};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uom::si::{f64::Time, time::year};

use crate::{
    cost::CostRates,
    effectiveness::DisabilityWeights,
    effort::{DEFAULT_BREAKPOINT, RelativeCostOfEffort},
    outcome::Effectiveness,
};

/// Errors that can occur while loading a [`Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse configuration")]
    Parse(#[from] toml::de::Error),
}

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub controls: ControlLimits,
    pub solver: SolverConfig,
    pub outcomes: OutcomeConfig,
}

impl Config {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if `content` is not valid configuration.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Loads a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Options for [`hivsim_solvers::solve`].
    #[must_use]
    pub fn solve_options(&self) -> SolveOptions {
        SolveOptions {
            method: self.solver.method,
            limits: self.controls,
            log_floor: self.solver.log_floor,
            start_year: self.solver.start_year,
            horizon: Time::new::<year>(self.solver.horizon_years),
            points: self.solver.points,
        }
    }
}

/// The `[solver]` section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub method: Method,
    pub start_year: f64,
    pub horizon_years: f64,
    pub points: usize,
    pub log_floor: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            method: Method::default(),
            start_year: 2015.0,
            horizon_years: 20.0,
            points: 1001,
            log_floor: DEFAULT_LOG_FLOOR,
        }
    }
}

/// The `[outcomes]` section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutcomeConfig {
    pub effectiveness: Effectiveness,
    /// Breakpoint of the relative cost of effort.
    pub breakpoint: f64,
    pub costs: CostRates,
    pub disability_weights: DisabilityWeights,
}

impl Default for OutcomeConfig {
    fn default() -> Self {
        Self {
            effectiveness: Effectiveness::default(),
            breakpoint: DEFAULT_BREAKPOINT,
            costs: CostRates::default(),
            disability_weights: DisabilityWeights::default(),
        }
    }
}

impl OutcomeConfig {
    /// The cost-of-effort curve for the configured breakpoint.
    ///
    /// # Errors
    ///
    /// Returns a [`ConstraintError`] unless `0.5 ≤ breakpoint < 1`.
    pub fn effort(&self) -> Result<RelativeCostOfEffort, ConstraintError> {
        RelativeCostOfEffort::new(self.breakpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn empty_config_is_default() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn defaults_match_solve_options() {
        assert_eq!(Config::default().solve_options(), SolveOptions::default());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = Config::from_toml_str(
            r#"
            [controls]
            treatment_rate_max = 5.0

            [solver]
            horizon_years = 15.0
            method = { kind = "dopri5", abs_tol = 1e-8, rel_tol = 1e-7 }

            [outcomes]
            effectiveness = "qalys_gained"
            breakpoint = 0.85

            [outcomes.costs]
            aids = 1200.0

            [outcomes.disability_weights]
            suppressed = 0.05
            "#,
        )
        .unwrap();

        assert_relative_eq!(config.controls.treatment_rate_max, 5.0);
        assert_eq!(
            config.controls.diagnosis_rate_max,
            ControlLimits::default().diagnosis_rate_max
        );
        assert_eq!(
            config.solver.method,
            Method::Dopri5 {
                abs_tol: 1e-8,
                rel_tol: 1e-7
            }
        );
        assert_eq!(config.solver.points, 1001);
        assert_relative_eq!(config.solve_options().horizon.get::<year>(), 15.0);

        assert_eq!(config.outcomes.effectiveness, Effectiveness::QalysGained);
        assert_relative_eq!(config.outcomes.effort().unwrap().breakpoint(), 0.85);
        assert_relative_eq!(config.outcomes.costs.aids, 1200.0);
        assert_relative_eq!(config.outcomes.costs.treatment, 300.0);
        assert_relative_eq!(config.outcomes.disability_weights.suppressed, 0.05);
        assert_relative_eq!(config.outcomes.disability_weights.aids, 0.582);
    }

    #[test]
    fn unknown_method_is_a_parse_error() {
        let result = Config::from_toml_str("[solver]\nmethod = { kind = \"euler\" }\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_file_names_the_path() {
        let error = Config::load("/nonexistent/hivsim.toml").unwrap_err();
        assert!(matches!(error, ConfigError::Read { .. }));
        assert!(error.to_string().contains("/nonexistent/hivsim.toml"));
    }

    #[test]
    fn invalid_breakpoint_is_reported_when_used() {
        let config = Config::from_toml_str("[outcomes]\nbreakpoint = 0.3\n").unwrap();
        assert!(config.outcomes.effort().is_err());
    }
}
