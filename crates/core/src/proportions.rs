use crate::Compartments;

#[cfg(feature = "serde-derive")]
use serde::{Deserialize, Serialize};

/// Care-cascade and vaccination proportions.
///
/// Used both for the proportions achieved by a population and for the
/// proportions a [`Target`](crate::Target) calls for.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde-derive", derive(Serialize, Deserialize))]
pub struct Proportions {
    /// Living with HIV and diagnosed.
    pub diagnosed: f64,
    /// Diagnosed and on treatment.
    pub treated: f64,
    /// On treatment and virally suppressed.
    pub suppressed: f64,
    /// Uninfected and vaccinated.
    pub vaccinated: f64,
}

impl Proportions {
    /// Computes the proportions achieved by a population.
    ///
    /// ```text
    /// diagnosed  = (D + T + V + W) / (A + U + D + T + V + W)
    /// treated    = (T + V) / (D + T + V + W)
    /// suppressed = V / (T + V)
    /// vaccinated = Q / (S + Q)
    /// ```
    ///
    /// People with AIDS count as diagnosed but not treated.
    /// A ratio with a zero numerator and a zero denominator is zero.
    #[must_use]
    pub fn of(state: &Compartments) -> Self {
        let Compartments {
            susceptible: s,
            vaccinated: q,
            acute: a,
            undiagnosed: u,
            diagnosed: d,
            treated: t,
            suppressed: v,
            aids: w,
            ..
        } = *state;

        Self {
            diagnosed: ratio(d + t + v + w, a + u + d + t + v + w),
            treated: ratio(t + v, d + t + v + w),
            suppressed: ratio(v, t + v),
            vaccinated: ratio(q, s + q),
        }
    }
}

/// Divides `numerator` by `denominator`, defining `0 / 0` as `0`.
///
/// Any other division by zero follows IEEE semantics.
#[must_use]
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if numerator == 0.0 && denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}
