//! Intervention cost along a trajectory.

use hivsim_core::{Compartments, HivModel};
use serde::{Deserialize, Serialize};

use crate::{effort::RelativeCostOfEffort, quadrature::simpson};

/// Unit costs, in the same currency as GDP per capita.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostRates {
    /// Per test, charged on every person tested.
    pub testing: f64,
    /// Per person starting treatment.
    pub treatment_initiation: f64,
    /// Per person-year on treatment.
    pub treatment: f64,
    /// Per person-year of adherence support for people on treatment.
    pub nonadherence: f64,
    /// Per person-year with AIDS.
    pub aids: f64,
}

impl Default for CostRates {
    fn default() -> Self {
        Self {
            testing: 10.0,
            treatment_initiation: 25.0,
            treatment: 300.0,
            nonadherence: 100.0,
            aids: 1000.0,
        }
    }
}

impl CostRates {
    /// Instantaneous spending, per year, on `state` at time `t`.
    ///
    /// Testing and the recurring treatment and adherence costs scale with
    /// the relative cost of effort at the corresponding target proportion.
    #[must_use]
    pub fn cost_rate(
        &self,
        model: &HivModel<'_>,
        effort: &RelativeCostOfEffort,
        t: f64,
        state: &Compartments,
    ) -> f64 {
        let targets = model.target_proportions(t);
        let rates = model.control_rates(t, state);
        let on_treatment = state.treated + state.suppressed;

        let testing = self.testing
            * effort.relative_cost(targets.diagnosed)
            * rates.diagnosis
            * (state.susceptible + state.acute + state.undiagnosed);
        let initiation = self.treatment_initiation * rates.treatment * state.diagnosed;
        let treatment = self.treatment * effort.relative_cost(targets.treated) * on_treatment;
        let adherence = self.nonadherence * effort.relative_cost(targets.suppressed) * on_treatment;
        let aids = self.aids * state.aids;

        testing + initiation + treatment + adherence + aids
    }
}

/// Total cost accumulated along a trajectory.
///
/// # Panics
///
/// Panics if `times` and `trajectory` have different lengths.
#[must_use]
pub fn cost(
    times: &[f64],
    trajectory: &[Compartments],
    model: &HivModel<'_>,
    rates: &CostRates,
    effort: &RelativeCostOfEffort,
) -> f64 {
    assert_eq!(
        times.len(),
        trajectory.len(),
        "times and trajectory must have the same length"
    );
    let spending: Vec<f64> = times
        .iter()
        .zip(trajectory)
        .map(|(&t, state)| rates.cost_rate(model, effort, t, state))
        .collect();
    simpson(times, &spending)
}
