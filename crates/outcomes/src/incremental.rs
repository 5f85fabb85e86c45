use hivsim_core::Parameters;
use serde::{Deserialize, Serialize};

/// A policy's gains and costs relative to a baseline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IncrementalStats {
    /// Effectiveness gained over the baseline.
    pub effectiveness: f64,
    /// Extra cost over the baseline.
    pub cost: f64,
    /// Incremental cost per unit of effectiveness, in multiples of GDP per
    /// capita.
    pub icer: f64,
}

/// Compares a policy's effectiveness and cost with a baseline's.
///
/// Effectiveness must already be oriented so that larger is better, as
/// [`Outcome::effectiveness`](crate::Outcome::effectiveness) returns it.
/// A zero incremental effectiveness yields an infinite ICER, or NaN if the
/// incremental cost is zero too.
#[must_use]
pub fn get_incremental_stats(
    effectiveness: f64,
    cost: f64,
    effectiveness_base: f64,
    cost_base: f64,
    parameters: &Parameters,
) -> IncrementalStats {
    let effectiveness = effectiveness - effectiveness_base;
    let cost = cost - cost_base;
    IncrementalStats {
        effectiveness,
        cost,
        icer: cost / effectiveness / parameters.gdp_per_capita,
    }
}
