use thiserror::Error;
use uom::si::{f64::Time, time::year};

/// The times, in calendar years, at which a trajectory is reported.
///
/// A grid has at least two finite, strictly increasing points.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid {
    times: Vec<f64>,
}

/// Errors raised when building a [`TimeGrid`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimeGridError {
    #[error("a time grid needs at least 2 points, got {0}")]
    TooFewPoints(usize),

    #[error("time grid value at index {0} is not finite")]
    NotFinite(usize),

    #[error("time grid is not strictly increasing at index {0}")]
    NotIncreasing(usize),
}

impl TimeGrid {
    /// Creates a grid from explicit times.
    ///
    /// # Errors
    ///
    /// Returns a [`TimeGridError`] if there are fewer than two times, or the
    /// times are not finite and strictly increasing.
    pub fn new(times: Vec<f64>) -> Result<Self, TimeGridError> {
        if times.len() < 2 {
            return Err(TimeGridError::TooFewPoints(times.len()));
        }
        if let Some(index) = times.iter().position(|t| !t.is_finite()) {
            return Err(TimeGridError::NotFinite(index));
        }
        if let Some(index) = times.windows(2).position(|pair| pair[0] >= pair[1]) {
            return Err(TimeGridError::NotIncreasing(index + 1));
        }
        Ok(Self { times })
    }

    /// Creates `points` evenly spaced times from `start` (a calendar year)
    /// over `horizon`.
    ///
    /// The last point is exactly `start + horizon`.
    ///
    /// ```
    /// use hivsim_core::TimeGrid;
    /// use uom::si::{f64::Time, time::year};
    ///
    /// let grid = TimeGrid::uniform(2015.0, Time::new::<year>(20.0), 1001).unwrap();
    /// assert_eq!(grid.len(), 1001);
    /// assert_eq!(grid.end(), 2035.0);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a [`TimeGridError`] if `points < 2` or the horizon is not a
    /// positive, finite duration.
    pub fn uniform(start: f64, horizon: Time, points: usize) -> Result<Self, TimeGridError> {
        if points < 2 {
            return Err(TimeGridError::TooFewPoints(points));
        }

        let years = horizon.get::<year>();
        let end = start + years;
        let last = points - 1;

        #[allow(clippy::cast_precision_loss)]
        let times = (0..points)
            .map(|i| {
                if i == last {
                    end
                } else {
                    start + years * (i as f64) / (last as f64)
                }
            })
            .collect();

        Self::new(times)
    }

    #[must_use]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    #[must_use]
    pub fn start(&self) -> f64 {
        self.times[0]
    }

    #[must_use]
    pub fn end(&self) -> f64 {
        self.times[self.times.len() - 1]
    }

    /// The span from first to last point.
    #[must_use]
    pub fn horizon(&self) -> Time {
        Time::new::<year>(self.end() - self.start())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Always `false`; a grid has at least two points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl AsRef<[f64]> for TimeGrid {
    fn as_ref(&self) -> &[f64] {
        &self.times
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn uniform_grid_spacing() {
        let grid = TimeGrid::uniform(2015.0, Time::new::<year>(10.0), 5).unwrap();
        assert_eq!(grid.len(), 5);
        assert_relative_eq!(grid.times()[1], 2017.5);
        assert_relative_eq!(grid.times()[2], 2020.0);
        assert_eq!(grid.end(), 2025.0);
        assert_relative_eq!(grid.horizon().get::<year>(), 10.0);
    }

    #[test]
    fn explicit_grid_must_increase() {
        assert!(TimeGrid::new(vec![2015.0, 2016.0, 2020.0]).is_ok());
        assert_eq!(
            TimeGrid::new(vec![2015.0, 2015.0]),
            Err(TimeGridError::NotIncreasing(1))
        );
        assert_eq!(
            TimeGrid::new(vec![2015.0, f64::NAN]),
            Err(TimeGridError::NotFinite(1))
        );
        assert_eq!(
            TimeGrid::new(vec![2015.0]),
            Err(TimeGridError::TooFewPoints(1))
        );
    }

    #[test]
    fn non_positive_horizon_is_rejected() {
        assert!(TimeGrid::uniform(2015.0, Time::new::<year>(0.0), 3).is_err());
        assert!(TimeGrid::uniform(2015.0, Time::new::<year>(-1.0), 3).is_err());
        assert_eq!(
            TimeGrid::uniform(2015.0, Time::new::<year>(5.0), 1),
            Err(TimeGridError::TooFewPoints(1))
        );
    }
}
