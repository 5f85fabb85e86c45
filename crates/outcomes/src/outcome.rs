//! Scalar outcomes of a solved trajectory.

use hivsim_core::{Compartments, HivModel, Parameters, Target};
use hivsim_solvers::solve;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    Config, OutcomeError,
    cost::cost,
    effectiveness::{dalys, qalys},
};

/// How health gains are measured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effectiveness {
    /// Disability-adjusted life years avoided.
    #[default]
    DalysAverted,
    /// Quality-adjusted life years lived.
    QalysGained,
}

/// Health and economic totals over a solved horizon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub dalys: f64,
    pub qalys: f64,
    pub cost: f64,
    /// Infections acquired over the horizon.
    pub new_infections: f64,
    /// AIDS deaths over the horizon.
    pub aids_deaths: f64,
}

impl Outcome {
    /// Effectiveness under `measure`, oriented so that larger is better.
    ///
    /// DALYs enter negated, so the difference against a baseline is the
    /// number of DALYs averted.
    #[must_use]
    pub fn effectiveness(&self, measure: Effectiveness) -> f64 {
        match measure {
            Effectiveness::DalysAverted => -self.dalys,
            Effectiveness::QalysGained => self.qalys,
        }
    }
}

/// Integrates DALYs, QALYs, and cost along a solved trajectory.
///
/// `target` and `parameters` must be the ones the trajectory was solved
/// with; the cost of testing and treatment depends on the control rates
/// they imply.
///
/// # Errors
///
/// Returns an [`OutcomeError`] if `times` and `trajectory` differ in length,
/// hold fewer than two points, or the configured breakpoint is invalid.
pub fn get_effectiveness_and_cost(
    times: &[f64],
    trajectory: &[Compartments],
    target: &Target,
    parameters: &Parameters,
    config: &Config,
) -> Result<Outcome, OutcomeError> {
    if times.len() != trajectory.len() {
        return Err(OutcomeError::LengthMismatch {
            times: times.len(),
            states: trajectory.len(),
        });
    }
    let (Some(first), Some(last)) = (trajectory.first(), trajectory.last()) else {
        return Err(OutcomeError::TooFewPoints(0));
    };
    if trajectory.len() < 2 {
        return Err(OutcomeError::TooFewPoints(trajectory.len()));
    }

    let settings = &config.outcomes;
    let effort = settings.effort().map_err(OutcomeError::Breakpoint)?;
    let model = HivModel::new(parameters, target, &config.controls);

    Ok(Outcome {
        dalys: dalys(times, trajectory, &settings.disability_weights),
        qalys: qalys(times, trajectory, &settings.disability_weights),
        cost: cost(times, trajectory, &model, &settings.costs, &effort),
        new_infections: last.new_infections - first.new_infections,
        aids_deaths: last.dead - first.dead,
    })
}

/// Solves the model for `target` and `parameters` and scores the result.
///
/// # Errors
///
/// Returns an [`OutcomeError`] if the solve fails or the outcomes cannot be
/// computed.
pub fn evaluate(
    target: &Target,
    parameters: &Parameters,
    config: &Config,
) -> Result<Outcome, OutcomeError> {
    // Reject a bad breakpoint before paying for the solve.
    config.outcomes.effort().map_err(OutcomeError::Breakpoint)?;

    let solution = solve(target, parameters, None, &config.solve_options())?;
    let outcome = get_effectiveness_and_cost(
        &solution.times,
        &solution.trajectory,
        target,
        parameters,
        config,
    )?;

    debug!(
        "{}, {}: {:.0} DALYs, {:.0} QALYs, cost {:.0}",
        parameters.country,
        target.label(),
        outcome.dalys,
        outcome.qalys,
        outcome.cost
    );
    Ok(outcome)
}
