//! Monte Carlo ensembles over targets and parameter samples.
//!
//! Every (target, sample) pair is solved and scored independently on the
//! `rayon` thread pool. A failed pair is kept as an error in its slot and
//! never aborts the rest of the ensemble.

use hivsim_core::{Parameters, Target};
use log::{info, warn};
use rayon::prelude::*;

use crate::{
    Config, OutcomeError,
    incremental::{IncrementalStats, get_incremental_stats},
    outcome::{Effectiveness, Outcome, evaluate},
};

/// Outcomes of every (target, sample) pair.
#[derive(Debug)]
pub struct Ensemble<'a> {
    samples: &'a [Parameters],
    labels: Vec<String>,
    /// Indexed by target, then by sample.
    outcomes: Vec<Vec<Result<Outcome, OutcomeError>>>,
}

/// Solves and scores every target against every parameter sample.
#[must_use]
pub fn run_ensemble<'a>(
    targets: &[Target],
    samples: &'a [Parameters],
    config: &Config,
) -> Ensemble<'a> {
    let outcomes: Vec<Vec<_>> = targets
        .par_iter()
        .map(|target| {
            samples
                .par_iter()
                .enumerate()
                .map(|(index, parameters)| {
                    let outcome = evaluate(target, parameters, config);
                    if let Err(error) = &outcome {
                        warn!(
                            "{}, {}, sample {index}: {error}",
                            parameters.country,
                            target.label()
                        );
                    }
                    outcome
                })
                .collect()
        })
        .collect();

    let ensemble = Ensemble {
        samples,
        labels: targets.iter().map(|target| target.label().to_owned()).collect(),
        outcomes,
    };
    info!(
        "ensemble finished: {} targets x {} samples, {} failed",
        targets.len(),
        samples.len(),
        ensemble.failures()
    );
    ensemble
}

impl Ensemble<'_> {
    /// Target labels, in the order the targets were given.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Per-sample outcomes for the target at `target`.
    ///
    /// # Panics
    ///
    /// Panics if `target` is out of range.
    #[must_use]
    pub fn outcomes(&self, target: usize) -> &[Result<Outcome, OutcomeError>] {
        &self.outcomes[target]
    }

    /// Number of pairs that failed.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.outcomes
            .iter()
            .flatten()
            .filter(|outcome| outcome.is_err())
            .count()
    }

    /// Extracts one value per sample for `target`, NaN where the pair failed.
    ///
    /// # Panics
    ///
    /// Panics if `target` is out of range.
    #[must_use]
    pub fn values(&self, target: usize, value: impl Fn(&Outcome) -> f64) -> Vec<f64> {
        self.outcomes[target]
            .iter()
            .map(|outcome| outcome.as_ref().map_or(f64::NAN, &value))
            .collect()
    }

    /// Incremental statistics of `target` against `baseline`, sample by sample.
    ///
    /// A sample is `None` when either pair failed.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    #[must_use]
    pub fn incremental(
        &self,
        target: usize,
        baseline: usize,
        measure: Effectiveness,
    ) -> Vec<Option<IncrementalStats>> {
        self.outcomes[target]
            .iter()
            .zip(&self.outcomes[baseline])
            .zip(self.samples)
            .map(|((outcome, base), parameters)| {
                let (outcome, base) = (outcome.as_ref().ok()?, base.as_ref().ok()?);
                Some(get_incremental_stats(
                    outcome.effectiveness(measure),
                    outcome.cost,
                    base.effectiveness(measure),
                    base.cost,
                    parameters,
                ))
            })
            .collect()
    }
}

/// Percentiles of `values` at each of `levels`, given in `[0, 100]`.
///
/// Interpolates linearly between order statistics and ignores NaNs.
/// Every percentile is NaN if no value remains.
///
/// ```
/// use hivsim_outcomes::percentiles;
///
/// let values = [3.0, f64::NAN, 1.0, 2.0, 4.0];
/// assert_eq!(percentiles(&values, &[0.0, 50.0, 100.0]), vec![1.0, 2.5, 4.0]);
/// ```
#[must_use]
pub fn percentiles(values: &[f64], levels: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    sorted.sort_by(f64::total_cmp);

    let Some(last) = sorted.len().checked_sub(1) else {
        return vec![f64::NAN; levels.len()];
    };

    levels
        .iter()
        .map(|p| {
            #[allow(clippy::cast_precision_loss)]
            let rank = (p / 100.0).clamp(0.0, 1.0) * last as f64;
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let lower = rank.floor() as usize;
            let upper = (lower + 1).min(last);
            #[allow(clippy::cast_precision_loss)]
            let weight = rank - lower as f64;
            sorted[lower] + weight * (sorted[upper] - sorted[lower])
        })
        .collect()
}
