//! Integration backends for [`OdeSystem`]s.
//!
//! [`integrate`] advances a system across every point of a [`TimeGrid`] and
//! returns the state at each one.
//! The grid is shifted to start at zero before it reaches a backend; systems
//! always see absolute time.
//!
//! # Example
//!
//! ```
//! use hivsim_core::{OdeSystem, TimeGrid};
//! use hivsim_solvers::integrate::{self, Method};
//!
//! struct Decay;
//!
//! impl OdeSystem<1> for Decay {
//!     fn derivative(&self, _t: f64, y: &[f64; 1]) -> [f64; 1] {
//!         [-y[0]]
//!     }
//! }
//!
//! let grid = TimeGrid::new(vec![2000.0, 2001.0]).unwrap();
//! let output = integrate::integrate(&Decay, &grid, [1.0], Method::default()).unwrap();
//!
//! assert!((output.states[1][0] - (-1.0_f64).exp()).abs() < 1e-4);
//! ```

mod error;
mod explicit;
mod method;
mod sdirk;

pub use error::IntegrateError;
pub use method::Method;

use hivsim_core::{OdeSystem, TimeGrid};

/// States produced by [`integrate`].
#[derive(Debug, Clone, PartialEq)]
pub struct Output<const N: usize> {
    /// The state at each grid point, starting with the initial state.
    pub states: Vec<[f64; N]>,

    /// Number of times the system's derivative was evaluated.
    pub evaluations: usize,
}

/// Integrates `system` from `initial` across every point of `grid`.
///
/// # Errors
///
/// Returns an [`IntegrateError`] if the method is misconfigured, the state
/// becomes non-finite, or the backend fails to advance.
/// Error times are absolute.
pub fn integrate<S, const N: usize>(
    system: &S,
    grid: &TimeGrid,
    initial: [f64; N],
    method: Method,
) -> Result<Output<N>, IntegrateError>
where
    S: OdeSystem<N>,
{
    method.validate().map_err(IntegrateError::InvalidMethod)?;

    let offset = grid.start();
    let shifted = Shifted { system, offset };
    let times: Vec<f64> = grid.times().iter().map(|t| t - offset).collect();

    if !initial.iter().all(|y| y.is_finite()) {
        return Err(IntegrateError::NonFinite { t: offset });
    }

    let result = match method {
        Method::Rk4 { step } => explicit::rk4(&shifted, &times, initial, step),
        Method::Dopri5 { abs_tol, rel_tol } => {
            explicit::dopri5(&shifted, &times, initial, abs_tol, rel_tol)
        }
        Method::Dop853 { abs_tol, rel_tol } => {
            explicit::dop853(&shifted, &times, initial, abs_tol, rel_tol)
        }
        Method::Sdirk {
            abs_tol,
            rel_tol,
            max_steps,
        } => sdirk::Sdirk::new(&shifted, abs_tol, rel_tol, max_steps).run(&times, initial),
    };

    result.map_err(|err| err.offset_by(offset))
}

/// Presents a system on a time axis that starts at zero.
struct Shifted<'s, S> {
    system: &'s S,
    offset: f64,
}

impl<S, const N: usize> OdeSystem<N> for Shifted<'_, S>
where
    S: OdeSystem<N>,
{
    fn derivative(&self, t: f64, y: &[f64; N]) -> [f64; N] {
        self.system.derivative(t + self.offset, y)
    }
}

fn all_finite<const N: usize>(y: &[f64; N]) -> bool {
    y.iter().all(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    /// dy/dt = -k·y, with y(t0) = 1.
    struct Decay {
        k: f64,
    }

    impl OdeSystem<1> for Decay {
        fn derivative(&self, _t: f64, y: &[f64; 1]) -> [f64; 1] {
            [-self.k * y[0]]
        }
    }

    /// dy/dt = t, which only integrates correctly if absolute time is used.
    struct Clock;

    impl OdeSystem<1> for Clock {
        fn derivative(&self, t: f64, _y: &[f64; 1]) -> [f64; 1] {
            [t]
        }
    }

    /// A stiff linear pair: a fast mode decaying at rate 1e4 and a slow one at rate 1.
    struct StiffPair;

    impl OdeSystem<2> for StiffPair {
        fn derivative(&self, _t: f64, y: &[f64; 2]) -> [f64; 2] {
            [-1.0e4 * (y[0] - y[1]), -y[1]]
        }
    }

    /// The logarithm of a stock filled at a constant `rate` from almost nothing.
    struct LogFill {
        rate: f64,
    }

    impl OdeSystem<1> for LogFill {
        fn derivative(&self, _t: f64, y: &[f64; 1]) -> [f64; 1] {
            [self.rate * (-y[0]).exp()]
        }
    }

    struct Blowup;

    impl OdeSystem<1> for Blowup {
        fn derivative(&self, _t: f64, _y: &[f64; 1]) -> [f64; 1] {
            [f64::NAN]
        }
    }

    fn methods() -> [Method; 4] {
        [
            Method::Rk4 { step: 0.01 },
            Method::Dopri5 {
                abs_tol: 1e-10,
                rel_tol: 1e-8,
            },
            Method::Dop853 {
                abs_tol: 1e-10,
                rel_tol: 1e-8,
            },
            Method::Sdirk {
                abs_tol: 1e-10,
                rel_tol: 1e-8,
                max_steps: 100_000,
            },
        ]
    }

    #[test]
    fn every_method_reports_each_grid_point() {
        let grid = TimeGrid::new(vec![2015.0, 2015.3, 2016.0, 2018.5]).unwrap();

        for method in methods() {
            let output = integrate(&Decay { k: 0.7 }, &grid, [1.0], method).unwrap();

            assert_eq!(output.states.len(), grid.len());
            assert!(output.evaluations > 0);
            for (t, y) in grid.times().iter().zip(&output.states) {
                let expected = (-0.7 * (t - 2015.0)).exp();
                assert_relative_eq!(y[0], expected, max_relative = 1e-4);
            }
        }
    }

    #[test]
    fn systems_see_absolute_time() {
        let grid = TimeGrid::new(vec![2000.0, 2001.0]).unwrap();

        for method in methods() {
            let output = integrate(&Clock, &grid, [0.0], method).unwrap();
            // ∫ t dt from 2000 to 2001
            assert_relative_eq!(output.states[1][0], 2000.5, max_relative = 1e-6);
        }
    }

    #[test]
    fn sdirk_handles_stiff_systems() {
        let grid = TimeGrid::new(vec![0.0, 0.5, 1.0, 2.0]).unwrap();
        let method = Method::Sdirk {
            abs_tol: 1e-8,
            rel_tol: 1e-6,
            max_steps: 10_000,
        };

        let output = integrate(&StiffPair, &grid, [2.0, 1.0], method).unwrap();

        let [_, y] = output.states[3];
        assert_relative_eq!(y, (-2.0_f64).exp(), max_relative = 1e-3);
        assert_relative_eq!(output.states[3][0], y, max_relative = 1e-3);
    }

    #[test]
    fn sdirk_resolves_a_start_at_the_log_floor() {
        let grid = TimeGrid::new(vec![2015.0, 2015.01, 2015.5, 2016.0]).unwrap();
        let system = LogFill { rate: 1.0e4 };
        let floor = -20.0_f64;

        let output = integrate(&system, &grid, [floor], Method::default()).unwrap();

        for (t, y) in grid.times().iter().zip(&output.states) {
            let expected = (floor.exp() + system.rate * (t - 2015.0)).ln();
            assert_relative_eq!(y[0], expected, max_relative = 1e-3);
        }
    }

    #[test]
    fn non_finite_derivatives_are_errors() {
        let grid = TimeGrid::new(vec![2015.0, 2016.0]).unwrap();

        for method in methods() {
            assert!(integrate(&Blowup, &grid, [1.0], method).is_err());
        }

        let err = integrate(
            &Blowup,
            &grid,
            [1.0],
            Method::Sdirk {
                abs_tol: 1e-6,
                rel_tol: 1e-6,
                max_steps: 100,
            },
        )
        .unwrap_err();
        assert!(matches!(err, IntegrateError::NonFinite { t } if t == 2015.0));
    }

    #[test]
    fn invalid_methods_are_rejected() {
        let grid = TimeGrid::new(vec![0.0, 1.0]).unwrap();
        let err = integrate(&Decay { k: 1.0 }, &grid, [1.0], Method::Rk4 { step: 0.0 }).unwrap_err();
        assert!(matches!(err, IntegrateError::InvalidMethod(_)));
    }

    #[test]
    fn max_steps_is_enforced() {
        let grid = TimeGrid::new(vec![0.0, 10.0]).unwrap();
        let method = Method::Sdirk {
            abs_tol: 1e-12,
            rel_tol: 1e-12,
            max_steps: 5,
        };

        let err = integrate(&Decay { k: 1.0 }, &grid, [1.0], method).unwrap_err();
        assert!(matches!(err, IntegrateError::MaxSteps { max_steps: 5, .. }));
    }
}
