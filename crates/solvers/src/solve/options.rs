use hivsim_core::{ControlLimits, TimeGrid, TimeGridError, model::DEFAULT_LOG_FLOOR};
use uom::si::{f64::Time, time::year};

use crate::integrate::Method;

/// Settings for [`solve`](crate::solve()).
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOptions {
    pub method: Method,
    pub limits: ControlLimits,
    /// Log-domain value that zeros map to and below which a compartment may
    /// not decrease.
    pub log_floor: f64,
    /// First calendar year of the default grid.
    pub start_year: f64,
    /// Span of the default grid.
    pub horizon: Time,
    /// Number of points in the default grid.
    pub points: usize,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            method: Method::default(),
            limits: ControlLimits::default(),
            log_floor: DEFAULT_LOG_FLOOR,
            start_year: 2015.0,
            horizon: Time::new::<year>(20.0),
            points: 1001,
        }
    }
}

impl SolveOptions {
    /// The uniform grid described by `start_year`, `horizon`, and `points`.
    ///
    /// # Errors
    ///
    /// Returns a [`TimeGridError`] if those settings do not form a valid grid.
    pub fn default_grid(&self) -> Result<TimeGrid, TimeGridError> {
        TimeGrid::uniform(self.start_year, self.horizon, self.points)
    }

    pub(crate) fn validate(&self) -> Result<(), &'static str> {
        self.method.validate()?;

        if !(self.log_floor.is_finite() && self.log_floor < 0.0) {
            return Err("log floor must be finite and negative");
        }

        let ControlLimits {
            diagnosis_rate_max,
            treatment_rate_max,
            nonadherence_rate_max,
            vaccination_rate_max,
            ramp_width,
        } = self.limits;
        let rates = [
            diagnosis_rate_max,
            treatment_rate_max,
            nonadherence_rate_max,
            vaccination_rate_max,
        ];
        if !rates.iter().all(|rate| rate.is_finite() && *rate >= 0.0) {
            return Err("maximum control rates must be finite and non-negative");
        }
        if !(ramp_width.is_finite() && ramp_width > 0.0) {
            return Err("ramp width must be positive");
        }

        Ok(())
    }
}
