//! Two-stage, L-stable SDIRK integrator.
//!
//! Butcher tableau, with `γ = 1 − 1/√2`:
//!
//! ```text
//!   γ | γ      0
//!   1 | 1 − γ  γ
//!  ---+-----------
//!     | 1 − γ  γ      (2nd order)
//!     | 1      0      (1st order, error estimate)
//! ```
//!
//! Stages are solved by simplified Newton iteration against an LU-factored
//! `I − hγJ`, with `J` a forward-difference Jacobian.
//! The factorization is reused while `hγ` stays within 20% of the value it
//! was built for and refreshed after any rejected step.
//!
//! The first step comes from the derivative-based estimate of Hairer,
//! Nørsett and Wanner. The only lower bound on the step is the spacing of
//! floating-point times, so starts far from equilibrium (a compartment at
//! the log floor with inflow) are resolved instead of rejected.

use hivsim_core::OdeSystem;
use nalgebra::{DMatrix, DVector, Dyn, LU};

use super::{IntegrateError, Output, all_finite};

const GAMMA: f64 = 1.0 - std::f64::consts::FRAC_1_SQRT_2;
const MAX_NEWTON_ITERATIONS: usize = 10;
const NEWTON_TOLERANCE: f64 = 0.01;
const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 4.0;

/// A factored iteration matrix and the `hγ` it was built for.
struct Iteration {
    hg: f64,
    lu: LU<f64, Dyn, Dyn>,
}

pub(super) struct Sdirk<'s, S, const N: usize> {
    system: &'s S,
    abs_tol: f64,
    rel_tol: f64,
    max_steps: usize,
    steps: usize,
    evaluations: usize,
    /// Step size carried from one grid interval into the next.
    h: f64,
}

impl<'s, S, const N: usize> Sdirk<'s, S, N>
where
    S: OdeSystem<N>,
{
    pub(super) fn new(system: &'s S, abs_tol: f64, rel_tol: f64, max_steps: usize) -> Self {
        Self {
            system,
            abs_tol,
            rel_tol,
            max_steps,
            steps: 0,
            evaluations: 0,
            h: 0.0,
        }
    }

    pub(super) fn run(
        mut self,
        times: &[f64],
        initial: [f64; N],
    ) -> Result<Output<N>, IntegrateError> {
        let span = times[times.len() - 1] - times[0];
        self.h = self.initial_step(times[0], &initial, span);

        let mut states = Vec::with_capacity(times.len());
        states.push(initial);

        let mut y = initial;
        for pair in times.windows(2) {
            y = self.advance(pair[0], pair[1], y)?;
            states.push(y);
        }

        Ok(Output {
            states,
            evaluations: self.evaluations,
        })
    }

    /// Estimates a starting step for a second-order method.
    fn initial_step(&mut self, t: f64, y: &[f64; N], span: f64) -> f64 {
        let scale: [f64; N] = std::array::from_fn(|i| self.abs_tol + self.rel_tol * y[i].abs());

        let f0 = self.eval(t, y);
        let d0 = weighted_rms(y, &scale);
        let d1 = weighted_rms(&f0, &scale);
        let h0 = if d0 < 1e-5 || d1 < 1e-5 {
            1e-6
        } else {
            0.01 * d0 / d1
        }
        .min(span);

        let f1 = self.eval(t + h0, &combine(y, &f0, h0));
        let change: [f64; N] = std::array::from_fn(|i| f1[i] - f0[i]);
        let d2 = weighted_rms(&change, &scale) / h0;

        let d = d1.max(d2);
        let h1 = if d <= 1e-15 {
            (h0 * 1e-3).max(1e-6)
        } else {
            (0.01 / d).cbrt()
        };

        (100.0 * h0).min(h1).min(span)
    }

    /// Integrates from `t0` to exactly `t1`.
    fn advance(&mut self, t0: f64, t1: f64, y0: [f64; N]) -> Result<[f64; N], IntegrateError> {
        let mut t = t0;
        let mut y = y0;
        let mut iteration: Option<Iteration> = None;

        while t < t1 {
            if self.steps >= self.max_steps {
                return Err(IntegrateError::MaxSteps {
                    t,
                    max_steps: self.max_steps,
                });
            }
            self.steps += 1;

            // Below this, `t + h` rounds back to `t`.
            let h_min = 16.0 * f64::EPSILON * t.abs();
            if self.h.is_nan() || self.h <= h_min {
                return Err(IntegrateError::StepSizeUnderflow { t });
            }

            let remaining = t1 - t;
            let truncated = self.h >= remaining;
            let h = if truncated { remaining } else { self.h };
            let hg = h * GAMMA;

            let stale = iteration
                .as_ref()
                .is_none_or(|it| (hg - it.hg).abs() > 0.2 * it.hg);
            if stale {
                iteration = Some(self.factor(t, &y, hg)?);
            }
            let Some(it) = iteration.as_ref() else {
                continue;
            };

            // Stage 1 at t + γh, stage 2 at t + h.
            let stages = self.stage(t + GAMMA * h, &y, None, it).and_then(|k1| {
                let base = combine(&y, &k1, h * (1.0 - GAMMA));
                let k2 = self.stage(t + h, &base, Some(&k1), it)?;
                Some((k1, base, k2))
            });

            let Some((k1, base, k2)) = stages else {
                // Newton failed to converge; retry smaller with a fresh Jacobian.
                self.h = h * 0.5;
                iteration = None;
                continue;
            };

            let y_new = combine(&base, &k2, hg);
            let error = self.error_norm(&y, &y_new, &k1, &k2, hg);

            if !error.is_finite() || !all_finite(&y_new) {
                self.h = h * MIN_FACTOR;
                iteration = None;
                continue;
            }

            let factor = if error == 0.0 {
                MAX_FACTOR
            } else {
                (SAFETY * error.powf(-0.5)).clamp(MIN_FACTOR, MAX_FACTOR)
            };

            if error <= 1.0 {
                t = if truncated { t1 } else { t + h };
                y = y_new;
                // A truncated final step says little about the natural step size.
                self.h = if truncated {
                    self.h.max(h * factor)
                } else {
                    h * factor
                };
            } else {
                self.h = h * factor;
                iteration = None;
            }
        }

        Ok(y)
    }

    /// Builds and factors `I − hγJ` at `(t, y)`.
    fn factor(&mut self, t: f64, y: &[f64; N], hg: f64) -> Result<Iteration, IntegrateError> {
        let f0 = self.eval(t, y);
        if !all_finite(&f0) {
            return Err(IntegrateError::NonFinite { t });
        }

        let mut jacobian = DMatrix::<f64>::zeros(N, N);
        let mut perturbed = *y;
        for j in 0..N {
            let delta = f64::EPSILON.sqrt() * y[j].abs().max(1.0);
            perturbed[j] = y[j] + delta;
            let f = self.eval(t, &perturbed);
            perturbed[j] = y[j];
            for i in 0..N {
                jacobian[(i, j)] = (f[i] - f0[i]) / delta;
            }
        }

        let matrix = DMatrix::<f64>::identity(N, N) - jacobian * hg;
        Ok(Iteration { hg, lu: matrix.lu() })
    }

    /// Solves `k = f(t, base + hγ·k)` for one stage.
    ///
    /// Returns `f` evaluated at the converged stage value, or `None` if the
    /// iteration diverges or the iteration matrix is singular.
    fn stage(
        &mut self,
        t: f64,
        base: &[f64; N],
        guess: Option<&[f64; N]>,
        iteration: &Iteration,
    ) -> Option<[f64; N]> {
        let hg = iteration.hg;
        let mut k = match guess {
            Some(k) => *k,
            None => self.eval(t, base),
        };

        for _ in 0..MAX_NEWTON_ITERATIONS {
            let stage = combine(base, &k, hg);
            let f = self.eval(t, &stage);
            let residual = DVector::from_iterator(N, f.iter().zip(&k).map(|(f, k)| f - k));
            let delta = iteration.lu.solve(&residual)?;

            let mut norm = 0.0;
            for i in 0..N {
                k[i] += delta[i];
                let scale = self.abs_tol + self.rel_tol * base[i].abs();
                norm += (hg * delta[i] / scale).powi(2);
            }
            #[allow(clippy::cast_precision_loss)]
            let norm = (norm / N as f64).sqrt();

            if !norm.is_finite() {
                return None;
            }
            if norm < NEWTON_TOLERANCE {
                return Some(self.eval(t, &combine(base, &k, hg)));
            }
        }

        None
    }

    /// Weighted RMS of the embedded error estimate `hγ(k2 − k1)`.
    fn error_norm(
        &self,
        y: &[f64; N],
        y_new: &[f64; N],
        k1: &[f64; N],
        k2: &[f64; N],
        hg: f64,
    ) -> f64 {
        let estimate: [f64; N] = std::array::from_fn(|i| hg * (k2[i] - k1[i]));
        let scale: [f64; N] = std::array::from_fn(|i| {
            self.abs_tol + self.rel_tol * y[i].abs().max(y_new[i].abs())
        });
        weighted_rms(&estimate, &scale)
    }

    fn eval(&mut self, t: f64, y: &[f64; N]) -> [f64; N] {
        self.evaluations += 1;
        self.system.derivative(t, y)
    }
}

/// Returns `y + c·k`.
fn combine<const N: usize>(y: &[f64; N], k: &[f64; N], c: f64) -> [f64; N] {
    std::array::from_fn(|i| y[i] + c * k[i])
}

/// Root mean square of `v / scale`.
fn weighted_rms<const N: usize>(v: &[f64; N], scale: &[f64; N]) -> f64 {
    let sum: f64 = v.iter().zip(scale).map(|(v, s)| (v / s).powi(2)).sum();
    #[allow(clippy::cast_precision_loss)]
    let mean = sum / N as f64;
    mean.sqrt()
}
