use hivsim_core::constraint::ConstraintError;
use hivsim_solvers::SolveError;
use thiserror::Error;

/// Errors that can occur while computing outcomes.
#[derive(Debug, Error)]
pub enum OutcomeError {
    #[error(transparent)]
    Solve(#[from] SolveError),

    #[error("invalid cost-of-effort breakpoint")]
    Breakpoint(#[source] ConstraintError),

    #[error("{times} times but {states} states")]
    LengthMismatch { times: usize, states: usize },

    #[error("at least 2 time points are needed, got {0}")]
    TooFewPoints(usize),
}
