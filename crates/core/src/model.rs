//! The HIV transmission model as a system of ODEs.
//!
//! [`HivModel`] binds parameters, a target, and control limits for one solve.
//! It exposes the same dynamics in two coordinate systems:
//!
//! - [`NaturalDomain`]: population counts, as in [`Compartments`]
//! - [`LogDomain`]: `S, U, D, T, V, W` replaced by their natural logarithms,
//!   which keeps small compartments well conditioned
//!
//! Both implement [`OdeSystem`] so any integration backend can drive either.

use crate::{
    Compartments, ControlLimits, ControlRates, Parameters, Proportions, Target,
    proportions::ratio,
};

/// A system of first-order ODEs with `N` state variables.
///
/// Implementors describe `dy/dt = f(t, y)`.
/// The time `t` is absolute (calendar years), even if a solver works on a
/// shifted time axis internally.
pub trait OdeSystem<const N: usize> {
    /// Returns `dy/dt` at `(t, y)`.
    fn derivative(&self, t: f64, y: &[f64; N]) -> [f64; N];
}

impl<S: OdeSystem<N>, const N: usize> OdeSystem<N> for &S {
    fn derivative(&self, t: f64, y: &[f64; N]) -> [f64; N] {
        (**self).derivative(t, y)
    }
}

/// Indices of the compartments that are log-transformed in [`LogDomain`].
pub const LOG_TRANSFORMED: [usize; 6] = [
    Compartments::S,
    Compartments::U,
    Compartments::D,
    Compartments::T,
    Compartments::V,
    Compartments::W,
];

/// Default floor for log-transformed values.
///
/// Exact zeros map to this value and a variable at or below it may not decrease.
pub const DEFAULT_LOG_FLOOR: f64 = -20.0;

/// Maps compartments into log-domain coordinates.
///
/// Transformed compartments that are zero or negative map to `floor`.
#[must_use]
pub fn to_log_domain(state: &Compartments, floor: f64) -> [f64; Compartments::COUNT] {
    let mut x = state.to_array();
    for i in LOG_TRANSFORMED {
        x[i] = if x[i] > 0.0 { x[i].ln() } else { floor };
    }
    x
}

/// Maps log-domain coordinates back to compartments.
#[must_use]
pub fn from_log_domain(x: &[f64; Compartments::COUNT]) -> Compartments {
    let mut y = *x;
    for i in LOG_TRANSFORMED {
        y[i] = y[i].exp();
    }
    Compartments::from_array(y)
}

/// Flows shared by both coordinate systems.
struct Flows {
    rates: ControlRates,
    force_of_infection: f64,
    /// New infections among the susceptible, `λ S`.
    infection_susceptible: f64,
    /// New infections among the vaccinated, `(1 - efficacy) λ Q`.
    infection_vaccinated: f64,
}

/// The HIV model for one (parameters, target) pair.
#[derive(Debug, Clone)]
pub struct HivModel<'a> {
    parameters: &'a Parameters,
    target: &'a Target,
    limits: &'a ControlLimits,
    initial: Proportions,
    vaccine_efficacy: f64,
}

impl<'a> HivModel<'a> {
    #[must_use]
    pub fn new(parameters: &'a Parameters, target: &'a Target, limits: &'a ControlLimits) -> Self {
        Self {
            parameters,
            target,
            limits,
            initial: parameters.initial_proportions(),
            vaccine_efficacy: target.vaccine_efficacy(parameters),
        }
    }

    #[must_use]
    pub fn parameters(&self) -> &'a Parameters {
        self.parameters
    }

    #[must_use]
    pub fn target(&self) -> &'a Target {
        self.target
    }

    /// Target proportions at time `t`.
    #[must_use]
    pub fn target_proportions(&self, t: f64) -> Proportions {
        self.target.evaluate(t, &self.initial)
    }

    /// Control rates for `state` at time `t`.
    #[must_use]
    pub fn control_rates(&self, t: f64, state: &Compartments) -> ControlRates {
        ControlRates::compute(
            state,
            &self.target_proportions(t),
            self.vaccine_efficacy,
            self.limits,
        )
    }

    /// Force of infection on a fully susceptible person.
    ///
    /// AIDS and dead compartments neither transmit nor mix.
    #[must_use]
    pub fn force_of_infection(&self, state: &Compartments) -> f64 {
        let p = self.parameters;
        let infectious = p.transmission_rate_acute * state.acute
            + p.transmission_rate_unsuppressed
                * (state.undiagnosed + state.diagnosed + state.treated)
            + p.transmission_rate_suppressed * state.suppressed;
        ratio(infectious, state.sexually_active())
    }

    /// Expects a state whose live compartments are already non-negative.
    fn flows(&self, t: f64, state: &Compartments) -> Flows {
        let rates = self.control_rates(t, state);
        let force_of_infection = self.force_of_infection(state);
        Flows {
            rates,
            force_of_infection,
            infection_susceptible: force_of_infection * state.susceptible,
            infection_vaccinated: (1.0 - self.vaccine_efficacy)
                * force_of_infection
                * state.vaccinated,
        }
    }

    /// The time derivative of every compartment.
    ///
    /// Live compartments are clipped to be non-negative first, so solver
    /// overshoot below zero cannot feed back into the dynamics.
    #[must_use]
    pub fn derivative(&self, t: f64, state: &Compartments) -> Compartments {
        let p = self.parameters;
        let y = state.clip_live();
        let Flows {
            rates,
            infection_susceptible,
            infection_vaccinated,
            ..
        } = self.flows(t, &y);

        let mu = p.death_rate;
        let to_aids = p.progression_rate_unsuppressed;

        Compartments {
            susceptible: p.birth_rate * y.sexually_active()
                - rates.vaccination * y.susceptible
                - infection_susceptible
                - mu * y.susceptible,
            vaccinated: rates.vaccination * y.susceptible - infection_vaccinated - mu * y.vaccinated,
            acute: infection_susceptible + infection_vaccinated
                - (p.progression_rate_acute + mu) * y.acute,
            undiagnosed: p.progression_rate_acute * y.acute
                - (rates.diagnosis + mu + to_aids) * y.undiagnosed,
            diagnosed: rates.diagnosis * y.undiagnosed
                + rates.nonadherence * (y.treated + y.suppressed)
                - (rates.treatment + mu + to_aids) * y.diagnosed,
            treated: rates.treatment * y.diagnosed
                - (rates.nonadherence + p.suppression_rate + mu + to_aids) * y.treated,
            suppressed: p.suppression_rate * y.treated
                - (rates.nonadherence + mu + p.progression_rate_suppressed) * y.suppressed,
            aids: to_aids * (y.undiagnosed + y.diagnosed + y.treated)
                + p.progression_rate_suppressed * y.suppressed
                - p.death_rate_aids * y.aids,
            dead: p.death_rate_aids * y.aids,
            new_infections: infection_susceptible + infection_vaccinated,
        }
    }

    /// The time derivative in log-domain coordinates.
    ///
    /// Each transformed variable `x = ln y` evolves as `inflow / y - outflow rate`,
    /// with every population ratio written as a difference of logarithms.
    /// A transformed variable at or below `floor` is not allowed to decrease.
    #[must_use]
    pub fn log_derivative(
        &self,
        t: f64,
        x: &[f64; Compartments::COUNT],
        floor: f64,
    ) -> [f64; Compartments::COUNT] {
        use Compartments as C;

        let p = self.parameters;
        let y = from_log_domain(x).clip_live();
        let Flows {
            rates,
            force_of_infection,
            infection_susceptible,
            infection_vaccinated,
        } = self.flows(t, &y);

        // e^(x_i - x_j) = y_i / y_j without forming either population.
        let rel = |i: usize, j: usize| (x[i] - x[j]).exp();
        let per = |value: f64, j: usize| value * (-x[j]).exp();

        let mu = p.death_rate;
        let to_aids = p.progression_rate_unsuppressed;

        let mut dx = [0.0; C::COUNT];

        let active_per_s = 1.0
            + per(y.vaccinated + y.acute, C::S)
            + rel(C::U, C::S)
            + rel(C::D, C::S)
            + rel(C::T, C::S)
            + rel(C::V, C::S);
        dx[C::S] = p.birth_rate * active_per_s
            - rates.vaccination
            - force_of_infection
            - mu;

        dx[C::Q] = rates.vaccination * y.susceptible - infection_vaccinated - mu * y.vaccinated;

        dx[C::A] =
            infection_susceptible + infection_vaccinated - (p.progression_rate_acute + mu) * y.acute;

        dx[C::U] =
            per(p.progression_rate_acute * y.acute, C::U) - (rates.diagnosis + mu + to_aids);

        dx[C::D] = rates.diagnosis * rel(C::U, C::D)
            + rates.nonadherence * (rel(C::T, C::D) + rel(C::V, C::D))
            - (rates.treatment + mu + to_aids);

        dx[C::T] = rates.treatment * rel(C::D, C::T)
            - (rates.nonadherence + p.suppression_rate + mu + to_aids);

        dx[C::V] = p.suppression_rate * rel(C::T, C::V)
            - (rates.nonadherence + mu + p.progression_rate_suppressed);

        dx[C::W] = to_aids * (rel(C::U, C::W) + rel(C::D, C::W) + rel(C::T, C::W))
            + p.progression_rate_suppressed * rel(C::V, C::W)
            - p.death_rate_aids;

        dx[C::Z] = p.death_rate_aids * y.aids;
        dx[C::R] = infection_susceptible + infection_vaccinated;

        for i in LOG_TRANSFORMED {
            if x[i] <= floor && dx[i] < 0.0 {
                dx[i] = 0.0;
            }
        }

        dx
    }
}

/// [`HivModel`] in population counts.
#[derive(Debug, Clone, Copy)]
pub struct NaturalDomain<'m, 'a> {
    model: &'m HivModel<'a>,
}

impl<'m, 'a> NaturalDomain<'m, 'a> {
    #[must_use]
    pub fn new(model: &'m HivModel<'a>) -> Self {
        Self { model }
    }
}

impl OdeSystem<{ Compartments::COUNT }> for NaturalDomain<'_, '_> {
    fn derivative(&self, t: f64, y: &[f64; Compartments::COUNT]) -> [f64; Compartments::COUNT] {
        self.model
            .derivative(t, &Compartments::from_array(*y))
            .to_array()
    }
}

/// [`HivModel`] with `S, U, D, T, V, W` in log coordinates.
#[derive(Debug, Clone, Copy)]
pub struct LogDomain<'m, 'a> {
    model: &'m HivModel<'a>,
    floor: f64,
}

impl<'m, 'a> LogDomain<'m, 'a> {
    #[must_use]
    pub fn new(model: &'m HivModel<'a>, floor: f64) -> Self {
        Self { model, floor }
    }

    #[must_use]
    pub fn floor(&self) -> f64 {
        self.floor
    }
}

impl OdeSystem<{ Compartments::COUNT }> for LogDomain<'_, '_> {
    fn derivative(&self, t: f64, x: &[f64; Compartments::COUNT]) -> [f64; Compartments::COUNT] {
        self.model.log_derivative(t, x, self.floor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    use crate::{ScaleUp, Vaccine, parameters::tests::example_parameters};

    #[test]
    fn log_transform_round_trips_positive_states() {
        let state = example_parameters().initial_conditions;
        let x = to_log_domain(&state, DEFAULT_LOG_FLOOR);

        assert_relative_eq!(x[Compartments::S], 1.0e7_f64.ln());
        assert_eq!(x[Compartments::Q], 0.0);

        let back = from_log_domain(&x);
        for (a, b) in back.to_array().iter().zip(state.to_array()) {
            assert_relative_eq!(*a, b, max_relative = 1e-12);
        }
    }

    #[test]
    fn zeros_map_to_the_floor() {
        let mut state = example_parameters().initial_conditions;
        state.suppressed = 0.0;
        let x = to_log_domain(&state, DEFAULT_LOG_FLOOR);
        assert_eq!(x[Compartments::V], DEFAULT_LOG_FLOOR);
        assert_relative_eq!(from_log_domain(&x).suppressed, (-20.0_f64).exp());
    }

    #[test]
    fn log_derivative_is_scaled_natural_derivative() {
        let parameters = example_parameters();
        let target = Target::unaids_90_90_90();
        let limits = ControlLimits::default();
        let model = HivModel::new(&parameters, &target, &limits);

        let state = parameters.initial_conditions;
        let t = 2016.0;
        let natural = model.derivative(t, &state).to_array();
        let log = model.log_derivative(t, &to_log_domain(&state, DEFAULT_LOG_FLOOR), -20.0);
        let y = state.to_array();

        for i in 0..Compartments::COUNT {
            let expected = if LOG_TRANSFORMED.contains(&i) {
                natural[i] / y[i]
            } else {
                natural[i]
            };
            assert_relative_eq!(log[i], expected, max_relative = 1e-9, epsilon = 1e-9);
        }
    }

    #[test]
    fn flows_conserve_people_apart_from_births_and_deaths() {
        let parameters = example_parameters();
        let target = Target::unaids_95_95_95();
        let limits = ControlLimits::default();
        let model = HivModel::new(&parameters, &target, &limits);
        let state = parameters.initial_conditions;

        let d = model.derivative(2020.0, &state);
        let live_change = d.alive();
        let births = parameters.birth_rate * state.sexually_active();
        let deaths = parameters.death_rate * state.sexually_active() + d.dead;

        assert_relative_eq!(live_change, births - deaths, max_relative = 1e-9);
    }

    #[test]
    fn negative_overshoot_is_clipped() {
        let parameters = example_parameters();
        let target = Target::status_quo();
        let limits = ControlLimits::default();
        let model = HivModel::new(&parameters, &target, &limits);

        let mut state = parameters.initial_conditions;
        state.acute = -10.0;
        let mut clipped = state;
        clipped.acute = 0.0;

        assert_eq!(
            model.derivative(2015.0, &state),
            model.derivative(2015.0, &clipped)
        );
    }

    #[test]
    fn vaccine_reduces_infection_of_vaccinated() {
        let parameters = example_parameters();
        let target = Target::status_quo().with_vaccine(Vaccine {
            efficacy: 0.75,
            coverage: 0.5,
            roll_out: ScaleUp::new(2015.0, 1.0),
        });
        let limits = ControlLimits::default();
        let model = HivModel::new(&parameters, &target, &limits);

        let mut state = parameters.initial_conditions;
        state.vaccinated = 1.0e6;
        let lambda = model.force_of_infection(&state);
        let d = model.derivative(2016.0, &state);

        let expected = lambda * state.susceptible + 0.25 * lambda * state.vaccinated;
        assert_relative_eq!(d.new_infections, expected, max_relative = 1e-12);
    }

    #[test]
    fn floored_variables_cannot_decrease() {
        let parameters = example_parameters();
        let target = Target::status_quo();
        let limits = ControlLimits::default();
        let model = HivModel::new(&parameters, &target, &limits);

        let mut state = parameters.initial_conditions;
        state.undiagnosed = 0.0;
        state.acute = 0.0;
        let x = to_log_domain(&state, DEFAULT_LOG_FLOOR);
        let dx = model.log_derivative(2015.0, &x, DEFAULT_LOG_FLOOR);

        // No inflow to U when A is empty, so its decline is suppressed.
        assert_eq!(dx[Compartments::U], 0.0);
    }

    #[test]
    fn counters_never_decrease() {
        let parameters = example_parameters();
        let target = Target::unaids_90_90_90();
        let limits = ControlLimits::default();
        let model = HivModel::new(&parameters, &target, &limits);

        let mut state = parameters.initial_conditions;
        state.aids = -5.0;
        let d = model.derivative(2017.0, &state);
        assert!(d.dead >= 0.0);
        assert!(d.new_infections >= 0.0);
    }
}
