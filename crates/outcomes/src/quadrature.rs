//! Numerical quadrature over a time grid.

/// Integrates sampled values with Simpson's rule, allowing uneven spacing.
///
/// Consecutive pairs of intervals are integrated with the non-uniform
/// Simpson formula. With an odd number of intervals the last one is
/// integrated with a three-point correction.
/// Quadratics are integrated exactly whatever the spacing, and cubics too on
/// an evenly spaced grid with an even number of intervals.
/// Returns 0 for fewer than two points.
///
/// ```
/// use hivsim_outcomes::quadrature::simpson;
///
/// let x = [0.0, 0.5, 2.0, 3.0];
/// let y: Vec<f64> = x.iter().map(|x| x * x).collect();
/// assert!((simpson(&x, &y) - 9.0).abs() < 1e-12);
/// ```
///
/// # Panics
///
/// Panics if `x` and `y` have different lengths.
#[must_use]
pub fn simpson(x: &[f64], y: &[f64]) -> f64 {
    assert_eq!(x.len(), y.len(), "simpson: x and y lengths differ");

    let n = x.len();
    match n {
        0 | 1 => return 0.0,
        2 => return 0.5 * (x[1] - x[0]) * (y[0] + y[1]),
        _ => {}
    }

    let intervals = n - 1;
    let paired = intervals - intervals % 2;

    let mut total = 0.0;
    for i in (0..paired).step_by(2) {
        let h0 = x[i + 1] - x[i];
        let h1 = x[i + 2] - x[i + 1];
        let hs = h0 + h1;
        total += hs / 6.0
            * ((2.0 - h1 / h0) * y[i] + hs * hs / (h0 * h1) * y[i + 1] + (2.0 - h0 / h1) * y[i + 2]);
    }

    if paired < intervals {
        // Fit a parabola through the last three points and integrate only
        // over the final interval.
        let h0 = x[n - 2] - x[n - 3];
        let h1 = x[n - 1] - x[n - 2];
        let alpha = (2.0 * h1 * h1 + 3.0 * h0 * h1) / (6.0 * (h0 + h1));
        let beta = (h1 * h1 + 3.0 * h0 * h1) / (6.0 * h0);
        let eta = h1 * h1 * h1 / (6.0 * h0 * (h0 + h1));
        total += alpha * y[n - 1] + beta * y[n - 2] - eta * y[n - 3];
    }

    total
}
