//! Explicit Runge–Kutta backends from `ode_solvers`.
//!
//! Each grid interval is integrated separately so the state is reported
//! exactly at every grid point.

use hivsim_core::OdeSystem;
use ode_solvers::{SVector, System};

use super::{IntegrateError, Output, all_finite};

pub(super) fn rk4<S, const N: usize>(
    system: &S,
    times: &[f64],
    initial: [f64; N],
    max_step: f64,
) -> Result<Output<N>, IntegrateError>
where
    S: OdeSystem<N>,
{
    let mut evaluations = times.len() - 1;
    let states = march(system, times, initial, |t0, t1, y| {
        let span = t1 - t0;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let substeps = (span / max_step).ceil().max(1.0) as usize;
        #[allow(clippy::cast_precision_loss)]
        let h = span / substeps as f64;

        let mut x = t0;
        let mut y = y;
        for i in 1..=substeps {
            #[allow(clippy::cast_precision_loss)]
            let x_next = if i == substeps { t1 } else { t0 + h * i as f64 };

            // One stepper per substep so each lands exactly on `x_next`.
            let mut stepper = ode_solvers::Rk4::new(Adapter { system }, x, y, x_next, x_next - x);
            let stats = stepper.integrate()?;
            evaluations += stats.num_eval as usize;

            y = last_state(stepper.y_out(), x)?;
            if !y.iter().all(|value| value.is_finite()) {
                return Err(IntegrateError::NonFinite { t: x });
            }
            x = x_next;
        }
        Ok(y)
    })?;

    Ok(Output {
        states,
        evaluations,
    })
}

pub(super) fn dopri5<S, const N: usize>(
    system: &S,
    times: &[f64],
    initial: [f64; N],
    abs_tol: f64,
    rel_tol: f64,
) -> Result<Output<N>, IntegrateError>
where
    S: OdeSystem<N>,
{
    let mut evaluations = times.len() - 1;
    let states = march(system, times, initial, |t0, t1, y| {
        let mut stepper =
            ode_solvers::Dopri5::new(Adapter { system }, t0, t1, 0.0, y, rel_tol, abs_tol);
        let stats = stepper.integrate()?;
        evaluations += stats.num_eval as usize;
        last_state(stepper.y_out(), t0)
    })?;

    Ok(Output {
        states,
        evaluations,
    })
}

pub(super) fn dop853<S, const N: usize>(
    system: &S,
    times: &[f64],
    initial: [f64; N],
    abs_tol: f64,
    rel_tol: f64,
) -> Result<Output<N>, IntegrateError>
where
    S: OdeSystem<N>,
{
    let mut evaluations = times.len() - 1;
    let states = march(system, times, initial, |t0, t1, y| {
        let mut stepper =
            ode_solvers::Dop853::new(Adapter { system }, t0, t1, 0.0, y, rel_tol, abs_tol);
        let stats = stepper.integrate()?;
        evaluations += stats.num_eval as usize;
        last_state(stepper.y_out(), t0)
    })?;

    Ok(Output {
        states,
        evaluations,
    })
}

/// Advances across consecutive grid intervals with `step_interval`.
///
/// The derivative is evaluated once at the start of every interval so a
/// non-finite system fails fast instead of stalling the step controller.
fn march<S, F, const N: usize>(
    system: &S,
    times: &[f64],
    initial: [f64; N],
    mut step_interval: F,
) -> Result<Vec<[f64; N]>, IntegrateError>
where
    S: OdeSystem<N>,
    F: FnMut(f64, f64, SVector<f64, N>) -> Result<SVector<f64, N>, IntegrateError>,
{
    let mut states = Vec::with_capacity(times.len());
    states.push(initial);

    let mut y = initial;
    for pair in times.windows(2) {
        let (t0, t1) = (pair[0], pair[1]);

        if !all_finite(&system.derivative(t0, &y)) {
            return Err(IntegrateError::NonFinite { t: t0 });
        }

        y = step_interval(t0, t1, y.into())?.into();
        if !all_finite(&y) {
            return Err(IntegrateError::NonFinite { t: t1 });
        }
        states.push(y);
    }

    Ok(states)
}

fn last_state<const N: usize>(
    y_out: &[SVector<f64, N>],
    t: f64,
) -> Result<SVector<f64, N>, IntegrateError> {
    y_out
        .last()
        .copied()
        .ok_or(IntegrateError::NonFinite { t })
}

/// Adapts an [`OdeSystem`] to the `ode_solvers` interface.
struct Adapter<'s, S> {
    system: &'s S,
}

impl<S, const N: usize> System<f64, SVector<f64, N>> for Adapter<'_, S>
where
    S: OdeSystem<N>,
{
    fn system(&self, x: f64, y: &SVector<f64, N>, dy: &mut SVector<f64, N>) {
        *dy = SVector::from(self.system.derivative(x, &(*y).into()));
    }

    fn solout(&mut self, _x: f64, y: &SVector<f64, N>, _dy: &SVector<f64, N>) -> bool {
        // Stop integration early once the state is no longer finite.
        !y.iter().all(|value| value.is_finite())
    }
}
