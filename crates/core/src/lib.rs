//! Core types for a compartmental HIV transmission model.
//!
//! This crate defines the population state and the dynamics that the solver
//! and outcome crates build on:
//!
//! - [`Compartments`]: the ten-compartment state vector
//! - [`Parameters`]: country-specific rates and initial conditions, obtained
//!   through a [`ParameterSource`] or drawn by a [`ParameterSampler`]
//! - [`Proportions`]: the care-cascade proportions of a population
//! - [`Target`]: a policy scenario, evaluated into target proportions over time
//! - [`ControlRates`]: the rates that push the population toward a target
//! - [`HivModel`]: the right-hand side of the model ODE, in the natural domain
//!   and in the log domain used for stable integration
//! - [`TimeGrid`]: the calendar times at which a solution is reported

mod compartments;
mod parameters;
mod proportions;
mod target;
mod time_grid;

pub mod constraint;
pub mod control;
pub mod model;
pub mod sampling;

pub use compartments::Compartments;
pub use control::{ControlLimits, ControlRates};
pub use model::{HivModel, LogDomain, NaturalDomain, OdeSystem};
pub use parameters::{ParameterSource, ParameterTable, Parameters, ParametersError};
pub use proportions::{Proportions, ratio};
pub use sampling::{Distribution, ParameterKind, ParameterSampler, SamplingError};
pub use target::{ScaleUp, Schedule, Target, TargetError, Vaccine};
pub use time_grid::{TimeGrid, TimeGridError};
