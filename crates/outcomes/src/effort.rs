//! The relative cost of increasing effort.
//!
//! Reaching the last people in a population costs more per person than
//! reaching the first. The marginal cost of raising a proportion `p` is flat
//! up to a breakpoint `b` and grows quadratically beyond it:
//!
//! ```text
//! c(p) = 1                   p ≤ b
//! c(p) = 1 + k (p − b)²      p > b,   k = 3(2b − 1) / (1 − b)⁴
//! ```
//!
//! `k` is chosen so that a fraction `b` of the total cost of full coverage
//! is spent on the final `1 − b` of the population, the "80-20 rule" at the
//! default `b = 0.8`.

use hivsim_core::constraint::{Breakpoint, ConstraintError};

/// The default breakpoint.
pub const DEFAULT_BREAKPOINT: f64 = 0.8;

/// A convex marginal-cost curve over proportions in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelativeCostOfEffort {
    breakpoint: f64,
    curvature: f64,
}

impl RelativeCostOfEffort {
    /// Creates the curve for `breakpoint`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConstraintError`] unless `0.5 ≤ breakpoint < 1`.
    pub fn new(breakpoint: f64) -> Result<Self, ConstraintError> {
        let breakpoint = Breakpoint::new(breakpoint)?.into_inner();
        Ok(Self::with_breakpoint(breakpoint))
    }

    fn with_breakpoint(breakpoint: f64) -> Self {
        Self {
            breakpoint,
            curvature: 3.0 * (2.0 * breakpoint - 1.0) / (1.0 - breakpoint).powi(4),
        }
    }

    #[must_use]
    pub fn breakpoint(&self) -> f64 {
        self.breakpoint
    }

    /// Marginal cost of raising the proportion at `p`, relative to the flat rate.
    ///
    /// ```
    /// use hivsim_outcomes::RelativeCostOfEffort;
    ///
    /// let effort = RelativeCostOfEffort::new(0.8).unwrap();
    /// assert_eq!(effort.relative_cost(0.5), 1.0);
    /// assert!(effort.relative_cost(0.95) > 1.0);
    /// ```
    #[must_use]
    pub fn relative_cost(&self, p: f64) -> f64 {
        let excess = (p - self.breakpoint).max(0.0);
        1.0 + self.curvature * excess * excess
    }

    /// Total cost of raising the proportion from 0 to `p`, the integral of
    /// [`relative_cost`](Self::relative_cost).
    #[must_use]
    pub fn total_cost(&self, p: f64) -> f64 {
        let excess = (p - self.breakpoint).max(0.0);
        p + self.curvature * excess.powi(3) / 3.0
    }
}

impl Default for RelativeCostOfEffort {
    fn default() -> Self {
        Self::with_breakpoint(DEFAULT_BREAKPOINT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    use crate::quadrature::simpson;

    #[test]
    fn last_stretch_costs_the_breakpoint_share() {
        for b in [0.5, 0.6, 0.75, 0.8, 0.9, 0.99] {
            let effort = RelativeCostOfEffort::new(b).unwrap();
            let share = (effort.total_cost(1.0) - effort.total_cost(b)) / effort.total_cost(1.0);
            assert_relative_eq!(share, b, max_relative = 1e-12);
        }
    }

    #[test]
    fn full_coverage_cost_has_closed_form() {
        let effort = RelativeCostOfEffort::new(0.8).unwrap();
        assert_relative_eq!(effort.total_cost(1.0), 4.0, max_relative = 1e-12);
        assert_relative_eq!(effort.total_cost(0.8), 0.8);
        assert_relative_eq!(effort.relative_cost(1.0), 46.0, max_relative = 1e-12);
    }

    #[test]
    fn total_cost_integrates_relative_cost() {
        let effort = RelativeCostOfEffort::default();
        let p: Vec<f64> = (0..=200).map(|i| f64::from(i) / 200.0).collect();
        let c: Vec<f64> = p.iter().map(|&p| effort.relative_cost(p)).collect();
        assert_relative_eq!(simpson(&p, &c), effort.total_cost(1.0), max_relative = 1e-6);
    }

    #[test]
    fn breakpoint_must_lie_in_range() {
        assert_eq!(
            RelativeCostOfEffort::new(0.4),
            Err(ConstraintError::BelowMinimum)
        );
        assert_eq!(
            RelativeCostOfEffort::new(1.0),
            Err(ConstraintError::AboveMaximum)
        );
        assert!(RelativeCostOfEffort::new(f64::NAN).is_err());
        assert_eq!(
            RelativeCostOfEffort::default(),
            RelativeCostOfEffort::new(DEFAULT_BREAKPOINT).unwrap()
        );
    }
}
