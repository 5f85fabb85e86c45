//! Numerical solvers for the HIV transmission model.
//!
//! - [`integrate`]: fixed-step, adaptive explicit, and implicit backends that
//!   advance any [`OdeSystem`](hivsim_core::OdeSystem) across a time grid
//! - [`solve()`]: the driver that integrates the model in the log domain and
//!   falls back to the natural domain if that diverges

pub mod integrate;
mod solve;

pub use integrate::{IntegrateError, Method};
pub use solve::{Domain, Solution, SolveError, SolveOptions, solve};
