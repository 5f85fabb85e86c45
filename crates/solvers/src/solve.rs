//! The solve driver.
//!
//! [`solve`] integrates the model for one target and parameter set.
//! It first integrates in the log domain, where `S, U, D, T, V, W` are
//! logarithms, and maps the result back to population counts.
//! If that diverges it retries once in the natural domain; the caller gets
//! the same kind of [`Solution`] either way.
//!
//! # Example
//!
//! ```ignore
//! use hivsim_core::Target;
//! use hivsim_solvers::{SolveOptions, solve};
//!
//! let solution = solve(&Target::unaids_95_95_95(), &parameters, None, &SolveOptions::default())?;
//!
//! for (t, state) in solution.iter() {
//!     println!("{t}: {} infected", state.infected());
//! }
//! ```

mod error;
mod options;
mod solution;

pub use error::SolveError;
pub use options::SolveOptions;
pub use solution::{Domain, Solution};

use hivsim_core::{
    Compartments, HivModel, LogDomain, NaturalDomain, OdeSystem, Parameters, Target, TimeGrid,
    model::{from_log_domain, to_log_domain},
};
use log::{debug, error, warn};

use crate::integrate::{self, IntegrateError, Method};

const N: usize = Compartments::COUNT;

/// Solves the model for `target` and `parameters`.
///
/// The trajectory is reported at each point of `grid`, or of
/// [`SolveOptions::default_grid`] when `grid` is `None`.
///
/// # Errors
///
/// Returns a precondition [`SolveError`] if the parameters, target, grid, or
/// options are invalid, and [`SolveError::Diverged`] if neither the log- nor
/// the natural-domain integration succeeds.
pub fn solve(
    target: &Target,
    parameters: &Parameters,
    grid: Option<&TimeGrid>,
    options: &SolveOptions,
) -> Result<Solution, SolveError> {
    parameters.validate()?;
    target.validate()?;
    options.validate().map_err(SolveError::InvalidOptions)?;

    let default_grid;
    let grid = match grid {
        Some(grid) => grid,
        None => {
            default_grid = options.default_grid()?;
            &default_grid
        }
    };

    let model = HivModel::new(parameters, target, &options.limits);
    let problem = Problem {
        country: &parameters.country,
        target: target.label(),
        initial: &parameters.initial_conditions,
        grid,
        method: options.method,
        log_floor: options.log_floor,
    };

    problem.solve_with_fallback(
        &LogDomain::new(&model, options.log_floor),
        &NaturalDomain::new(&model),
    )
}

/// Everything about one solve except the systems being integrated.
struct Problem<'a> {
    country: &'a str,
    target: &'a str,
    initial: &'a Compartments,
    grid: &'a TimeGrid,
    method: Method,
    log_floor: f64,
}

impl Problem<'_> {
    /// Integrates `log`, falling back to `natural` if it diverges.
    fn solve_with_fallback<L, Nat>(&self, log: &L, natural: &Nat) -> Result<Solution, SolveError>
    where
        L: OdeSystem<N>,
        Nat: OdeSystem<N>,
    {
        let Self {
            country, target, ..
        } = *self;

        debug!(
            "{country}, {target}: solving over [{}, {}] with {} points",
            self.grid.start(),
            self.grid.end(),
            self.grid.len(),
        );

        match self.solve_log(log) {
            Ok(solution) => return Ok(solution),
            Err(err) => {
                warn!(
                    "{country}, {target}: log-domain solve failed ({err}); \
                     retrying in the natural domain"
                );
            }
        }

        self.solve_natural(natural).map_err(|source| {
            error!("{country}, {target}: natural-domain solve failed ({source})");
            SolveError::Diverged {
                country: country.to_owned(),
                target: target.to_owned(),
                source,
            }
        })
    }

    fn solve_log<L: OdeSystem<N>>(&self, system: &L) -> Result<Solution, IntegrateError> {
        let initial = to_log_domain(self.initial, self.log_floor);
        let output = integrate::integrate(system, self.grid, initial, self.method)?;
        let trajectory = output.states.iter().map(from_log_domain).collect();

        self.finish(trajectory, Domain::Log, output.evaluations)
    }

    fn solve_natural<Nat: OdeSystem<N>>(&self, system: &Nat) -> Result<Solution, IntegrateError> {
        let output = integrate::integrate(system, self.grid, self.initial.to_array(), self.method)?;
        let trajectory = output
            .states
            .into_iter()
            .map(Compartments::from_array)
            .collect();

        self.finish(trajectory, Domain::Natural, output.evaluations)
    }

    /// Checks the whole trajectory is finite and packages it.
    fn finish(
        &self,
        trajectory: Vec<Compartments>,
        domain: Domain,
        evaluations: usize,
    ) -> Result<Solution, IntegrateError> {
        let times = self.grid.times();

        if let Some(index) = trajectory.iter().position(|state| !state.is_finite()) {
            return Err(IntegrateError::NonFinite { t: times[index] });
        }

        debug!(
            "{}, {}: solved in the {domain:?} domain with {evaluations} evaluations",
            self.country, self.target,
        );

        Ok(Solution {
            times: times.to_vec(),
            trajectory,
            domain,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use hivsim_core::{ParametersError, ScaleUp, Vaccine};
    use uom::si::{f64::Time, time::year};

    /// A growing epidemic with a partially developed care cascade.
    fn parameters() -> Parameters {
        Parameters {
            country: "Testland".to_owned(),
            birth_rate: 0.03,
            death_rate: 0.015,
            progression_rate_acute: 4.0,
            progression_rate_unsuppressed: 0.1,
            progression_rate_suppressed: 0.01,
            suppression_rate: 2.0,
            death_rate_aids: 0.6,
            transmission_rate_acute: 3.0,
            transmission_rate_unsuppressed: 0.15,
            transmission_rate_suppressed: 0.003,
            vaccine_efficacy: 0.0,
            gdp_per_capita: 1500.0,
            initial_conditions: Compartments {
                susceptible: 1.0e7,
                vaccinated: 0.0,
                acute: 2.0e3,
                undiagnosed: 1.0e5,
                diagnosed: 5.0e4,
                treated: 1.0e4,
                suppressed: 4.0e4,
                aids: 5.0e3,
                dead: 0.0,
                new_infections: 0.0,
            },
        }
    }

    fn grid(years: f64, points: usize) -> TimeGrid {
        TimeGrid::uniform(2015.0, Time::new::<year>(years), points).unwrap()
    }

    /// Returns NaN everywhere, as a diverging log-domain system would.
    struct Diverging;

    impl OdeSystem<N> for Diverging {
        fn derivative(&self, _t: f64, _y: &[f64; N]) -> [f64; N] {
            [f64::NAN; N]
        }
    }

    fn problem<'a>(parameters: &'a Parameters, grid: &'a TimeGrid) -> Problem<'a> {
        Problem {
            country: &parameters.country,
            target: "test",
            initial: &parameters.initial_conditions,
            grid,
            method: Method::default(),
            log_floor: -20.0,
        }
    }

    #[test]
    fn log_and_natural_domains_agree() {
        let parameters = parameters();
        let target = Target::unaids_95_95_95();
        let grid = grid(10.0, 201);
        let options = SolveOptions::default();

        let log = solve(&target, &parameters, Some(&grid), &options).unwrap();
        assert_eq!(log.domain, Domain::Log);

        let model = HivModel::new(&parameters, &target, &options.limits);
        let natural = problem(&parameters, &grid)
            .solve_natural(&NaturalDomain::new(&model))
            .unwrap();

        for (a, b) in log.trajectory.iter().zip(&natural.trajectory) {
            for (x, y) in a.to_array().iter().zip(b.to_array()) {
                assert_relative_eq!(*x, y, max_relative = 1e-3, epsilon = 1.0);
            }
        }
    }

    #[test]
    fn default_grid_is_used_without_an_explicit_one() {
        let options = SolveOptions {
            horizon: Time::new::<year>(2.0),
            points: 21,
            ..SolveOptions::default()
        };

        let solution = solve(&Target::status_quo(), &parameters(), None, &options).unwrap();

        assert_eq!(solution.times.len(), 21);
        assert_eq!(solution.trajectory.len(), 21);
        assert_relative_eq!(solution.times[0], 2015.0);
        assert_relative_eq!(solution.times[20], 2017.0);
        let initial = parameters().initial_conditions.to_array();
        for (x, y) in solution.trajectory[0].to_array().iter().zip(initial) {
            assert_relative_eq!(*x, y, max_relative = 1e-12);
        }
    }

    #[test]
    fn falls_back_to_natural_domain() {
        let parameters = parameters();
        let target = Target::status_quo();
        let limits = hivsim_core::ControlLimits::default();
        let model = HivModel::new(&parameters, &target, &limits);
        let grid = grid(2.0, 21);
        let problem = problem(&parameters, &grid);

        let solution = problem
            .solve_with_fallback(&Diverging, &NaturalDomain::new(&model))
            .unwrap();
        let direct = problem.solve_natural(&NaturalDomain::new(&model)).unwrap();

        assert_eq!(solution.domain, Domain::Natural);
        assert_eq!(solution, direct);
    }

    #[test]
    fn diverging_in_both_domains_is_an_error() {
        let parameters = parameters();
        let grid = grid(1.0, 11);

        let err = problem(&parameters, &grid)
            .solve_with_fallback(&Diverging, &Diverging)
            .unwrap_err();

        assert!(matches!(
            err,
            SolveError::Diverged { ref country, ref target, .. }
                if country == "Testland" && target == "test"
        ));
    }

    #[test]
    fn cumulative_counters_never_decrease() {
        let solution = solve(
            &Target::unaids_90_90_90(),
            &parameters(),
            Some(&grid(10.0, 201)),
            &SolveOptions::default(),
        )
        .unwrap();

        for pair in solution.trajectory.windows(2) {
            assert!(pair[1].dead >= pair[0].dead);
            assert!(pair[1].new_infections >= pair[0].new_infections);
        }
        let last = solution.final_state().unwrap();
        assert!(last.dead > 0.0);
        assert!(last.new_infections > 0.0);
    }

    #[test]
    fn vaccinated_stays_empty_without_efficacy() {
        let grid = grid(5.0, 51);
        let no_efficacy = Target::unaids_90_90_90().with_vaccine(Vaccine {
            efficacy: 0.0,
            coverage: 0.7,
            roll_out: ScaleUp::new(2016.0, 3.0),
        });

        for method in [Method::Rk4 { step: 1e-3 }, Method::default()] {
            let options = SolveOptions {
                method,
                ..SolveOptions::default()
            };
            let solution = solve(&no_efficacy, &parameters(), Some(&grid), &options).unwrap();

            for state in &solution.trajectory {
                assert_abs_diff_eq!(state.vaccinated, 0.0, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn vaccinated_stays_empty_without_coverage() {
        let no_coverage = Target::unaids_90_90_90().with_vaccine(Vaccine {
            efficacy: 0.6,
            coverage: 0.0,
            roll_out: ScaleUp::new(2016.0, 3.0),
        });

        let solution = solve(
            &no_coverage,
            &parameters(),
            Some(&grid(5.0, 51)),
            &SolveOptions::default(),
        )
        .unwrap();

        assert_eq!(solution.domain, Domain::Log);
        for state in &solution.trajectory {
            assert_abs_diff_eq!(state.vaccinated, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn empty_compartments_start_at_the_log_floor() {
        let mut no_aids = parameters();
        no_aids.initial_conditions.aids = 0.0;
        let mut no_diagnosed_or_aids = no_aids.clone();
        no_diagnosed_or_aids.initial_conditions.diagnosed = 0.0;

        let grid = grid(5.0, 101);
        let options = SolveOptions::default();

        for parameters in [&no_aids, &no_diagnosed_or_aids] {
            for target in [Target::status_quo(), Target::unaids_90_90_90()] {
                let log = solve(&target, parameters, Some(&grid), &options).unwrap();
                assert_eq!(log.domain, Domain::Log, "{}", target.label());

                let model = HivModel::new(parameters, &target, &options.limits);
                let natural = problem(parameters, &grid)
                    .solve_natural(&NaturalDomain::new(&model))
                    .unwrap();

                for (a, b) in log.trajectory.iter().zip(&natural.trajectory) {
                    for (x, y) in a.to_array().iter().zip(b.to_array()) {
                        assert_relative_eq!(*x, y, max_relative = 1e-3, epsilon = 1.0);
                    }
                }
            }
        }
    }

    #[test]
    fn vaccine_fills_the_vaccinated_compartment() {
        let with_vaccine = Target::status_quo().with_vaccine(Vaccine {
            efficacy: 0.5,
            coverage: 0.5,
            roll_out: ScaleUp::new(2015.0, 2.0),
        });

        let solution = solve(
            &with_vaccine,
            &parameters(),
            Some(&grid(4.0, 41)),
            &SolveOptions::default(),
        )
        .unwrap();

        let last = solution.final_state().unwrap();
        let coverage = last.vaccinated / (last.susceptible + last.vaccinated);
        assert_relative_eq!(coverage, 0.5, max_relative = 1e-2);
    }

    #[test]
    fn preconditions_are_checked_before_solving() {
        let options = SolveOptions::default();
        let target = Target::status_quo();

        let mut zero = parameters();
        zero.initial_conditions = Compartments::default();
        assert!(matches!(
            solve(&target, &zero, None, &options),
            Err(SolveError::Parameters(
                ParametersError::ZeroInitialConditions { .. }
            ))
        ));

        let mut negative = parameters();
        negative.initial_conditions.undiagnosed = -5.0e4;
        assert!(matches!(
            solve(&target, &negative, None, &options),
            Err(SolveError::Parameters(ParametersError::Invalid {
                field: "initial_conditions.undiagnosed",
                ..
            }))
        ));

        let mut infinite_r0 = parameters();
        infinite_r0.progression_rate_acute = 0.0;
        infinite_r0.death_rate = 0.0;
        assert!(matches!(
            solve(&target, &infinite_r0, None, &options),
            Err(SolveError::Parameters(ParametersError::NonFiniteR0 { .. }))
        ));

        let bad_target = Target::cascade("bad", [1.2, 0.9, 0.9], ScaleUp::new(2015.0, 5.0));
        assert!(matches!(
            solve(&bad_target, &parameters(), None, &options),
            Err(SolveError::Target(_))
        ));

        let bad_floor = SolveOptions {
            log_floor: 0.0,
            ..SolveOptions::default()
        };
        assert!(matches!(
            solve(&target, &parameters(), None, &bad_floor),
            Err(SolveError::InvalidOptions(_))
        ));

        let bad_grid = SolveOptions {
            points: 1,
            ..SolveOptions::default()
        };
        assert!(matches!(
            solve(&target, &parameters(), None, &bad_grid),
            Err(SolveError::TimeGrid(_))
        ));
    }
}
