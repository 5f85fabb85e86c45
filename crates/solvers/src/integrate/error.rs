use ode_solvers::dop_shared::IntegrationError;
use thiserror::Error;

/// Errors that can occur while integrating an ODE system.
#[derive(Debug, Error)]
pub enum IntegrateError {
    #[error("invalid integration method: {0}")]
    InvalidMethod(&'static str),

    #[error("state became non-finite at t = {t}")]
    NonFinite { t: f64 },

    #[error("step size underflow at t = {t}")]
    StepSizeUnderflow { t: f64 },

    #[error("exceeded {max_steps} steps at t = {t}")]
    MaxSteps { t: f64, max_steps: usize },

    #[error(transparent)]
    Backend(#[from] IntegrationError),
}

impl IntegrateError {
    /// Moves a backend-local time back onto the caller's time axis.
    pub(crate) fn offset_by(self, offset: f64) -> Self {
        match self {
            Self::NonFinite { t } => Self::NonFinite { t: t + offset },
            Self::StepSizeUnderflow { t } => Self::StepSizeUnderflow { t: t + offset },
            Self::MaxSteps { t, max_steps } => Self::MaxSteps {
                t: t + offset,
                max_steps,
            },
            Self::InvalidMethod(_) | Self::Backend(_) => self,
        }
    }
}
