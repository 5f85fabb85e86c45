#[cfg(feature = "serde-derive")]
use serde::{Deserialize, Serialize};

/// Supported numerical integration methods.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-derive", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde-derive",
    serde(tag = "kind", rename_all = "snake_case")
)]
pub enum Method {
    /// Classic fixed-step 4th-order Runge–Kutta method.
    ///
    /// Each grid interval is split into the fewest equal substeps no longer
    /// than `step`. Does not adapt to local error, and the ramp-switched
    /// control rates make the model stiff enough that a small `step` is needed.
    Rk4 { step: f64 },

    /// Adaptive Dormand–Prince 5(4) Runge–Kutta method.
    ///
    /// An explicit embedded method that keeps the local error within
    /// `abs_tol` and `rel_tol`. Efficient for non-stiff problems, but may
    /// report stiffness once control rates saturate.
    Dopri5 { abs_tol: f64, rel_tol: f64 },

    /// Adaptive Dormand–Prince 8(5,3) Runge–Kutta method.
    ///
    /// A higher-order variant of `Dopri5` for tight tolerances on smooth
    /// problems.
    Dop853 { abs_tol: f64, rel_tol: f64 },

    /// Adaptive, L-stable, two-stage singly diagonally implicit Runge–Kutta method.
    ///
    /// Second order with an embedded first-order error estimate.
    /// Each stage is solved by simplified Newton iteration on a
    /// finite-difference Jacobian, which handles the stiff sliding behaviour
    /// of ramp-switched control rates.
    /// Gives up after `max_steps` attempted steps over the whole grid.
    Sdirk {
        abs_tol: f64,
        rel_tol: f64,
        max_steps: usize,
    },
}

impl Default for Method {
    fn default() -> Self {
        Method::Sdirk {
            abs_tol: 1e-6,
            rel_tol: 1e-6,
            max_steps: 500_000,
        }
    }
}

impl Method {
    /// Checks that step sizes and tolerances are positive and finite.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid setting.
    pub fn validate(&self) -> Result<(), &'static str> {
        let positive = |value: f64| value.is_finite() && value > 0.0;
        match *self {
            Method::Rk4 { step } if !positive(step) => Err("rk4 step must be positive"),
            Method::Dopri5 { abs_tol, rel_tol }
            | Method::Dop853 { abs_tol, rel_tol }
            | Method::Sdirk {
                abs_tol, rel_tol, ..
            } if !(positive(abs_tol) && positive(rel_tol)) => {
                Err("tolerances must be positive")
            }
            Method::Sdirk { max_steps: 0, .. } => Err("max_steps must be positive"),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert_eq!(Method::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_bad_settings() {
        assert!(Method::Rk4 { step: -0.1 }.validate().is_err());
        assert!(
            Method::Dopri5 {
                abs_tol: 0.0,
                rel_tol: 1e-6
            }
            .validate()
            .is_err()
        );
        assert!(
            Method::Sdirk {
                abs_tol: 1e-6,
                rel_tol: f64::NAN,
                max_steps: 10
            }
            .validate()
            .is_err()
        );
        assert!(
            Method::Sdirk {
                abs_tol: 1e-6,
                rel_tol: 1e-6,
                max_steps: 0
            }
            .validate()
            .is_err()
        );
    }
}
