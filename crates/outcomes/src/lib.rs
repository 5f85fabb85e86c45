//! Health and economic outcomes of HIV policy simulations.
//!
//! Turns solved trajectories into the numbers a cost-effectiveness
//! comparison needs:
//!
//! - [`get_effectiveness_and_cost`]: DALYs, QALYs, and intervention cost
//!   along a trajectory, with new infections and AIDS deaths
//! - [`get_incremental_stats`]: gains, extra cost, and ICER against a baseline
//! - [`RelativeCostOfEffort`]: the rising marginal cost of reaching the last
//!   people in a population
//! - [`run_ensemble`]: every target against every parameter sample, in parallel
//! - [`Config`]: TOML settings for all of the above

mod config;
mod cost;
mod effectiveness;
mod effort;
mod ensemble;
mod error;
mod incremental;
mod outcome;

pub mod quadrature;

pub use config::{Config, ConfigError, OutcomeConfig, SolverConfig};
pub use cost::{CostRates, cost};
pub use effectiveness::{DisabilityWeights, dalys, qalys};
pub use effort::{DEFAULT_BREAKPOINT, RelativeCostOfEffort};
pub use ensemble::{Ensemble, percentiles, run_ensemble};
pub use error::OutcomeError;
pub use incremental::{IncrementalStats, get_incremental_stats};
pub use outcome::{Effectiveness, Outcome, evaluate, get_effectiveness_and_cost};
