use hivsim_core::{ParametersError, TargetError, TimeGridError};
use thiserror::Error;

use crate::integrate::IntegrateError;

/// Errors that can occur while solving the model.
///
/// Every variant except [`SolveError::Diverged`] is a precondition failure
/// reported before any integration is attempted.
#[derive(Debug, Error)]
pub enum SolveError {
    #[error(transparent)]
    Parameters(#[from] ParametersError),

    #[error(transparent)]
    Target(#[from] TargetError),

    #[error(transparent)]
    TimeGrid(#[from] TimeGridError),

    #[error("invalid solve options: {0}")]
    InvalidOptions(&'static str),

    #[error("{country}, {target}: solve diverged in both log and natural domains")]
    Diverged {
        country: String,
        target: String,
        #[source]
        source: IntegrateError,
    },
}
