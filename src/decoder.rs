//! Least-squares decoder solve.
//!
//! Given a population's tuning-curve activities sampled at evaluation points
//! and the target function values at those points, solve for the per-neuron
//! readout weights that reconstruct the function from filtered spike
//! activity. Ridge regularization keeps the solve robust to the noise of
//! spiking readout.

use nalgebra::DMatrix;
use thiserror::Error;

/// Regularization as a fraction of the peak activity. The ridge term added
/// to the Gram matrix is `(reg * max_activity)^2`.
pub const DEFAULT_REG: f64 = 0.1;

#[derive(Debug, Error)]
pub enum SolveError {
    /// The regularized Gram matrix failed its Cholesky factorization. In
    /// practice this means the population is silent over the evaluation
    /// points, so there is nothing to decode from.
    #[error("gram matrix is not positive definite (population may be silent)")]
    NotPositiveDefinite,
}

/// Solve decoders for one readout.
///
/// - `activities`: `n x m` matrix, one row per neuron, one column per
///   evaluation point, entries in Hz.
/// - `targets`: `m x d` matrix of target function values at the same points.
/// - `reg`: regularization fraction, normally [`DEFAULT_REG`].
///
/// Returns the `n x d` decoder matrix `phi` minimizing
/// `|A' * phi - targets|^2` plus the ridge penalty.
pub fn solve_decoders(
    activities: &DMatrix<f64>,
    targets: &DMatrix<f64>,
    reg: f64,
) -> Result<DMatrix<f64>, SolveError> {
    let n = activities.nrows();
    let m = activities.ncols();
    assert_eq!(
        targets.nrows(),
        m,
        "targets must have one row per evaluation point"
    );

    let sigma = reg * activities.max();
    let lambda = sigma * sigma;

    // Normal equations: (A A^T / m + lambda I) phi = A F / m
    let mut gram = activities * activities.transpose() / m as f64;
    for i in 0..n {
        gram[(i, i)] += lambda;
    }
    let projection = activities * targets / m as f64;

    let chol = gram.cholesky().ok_or(SolveError::NotPositiveDefinite)?;
    let phi = chol.solve(&projection);

    if log::log_enabled!(log::Level::Debug) {
        let residual = activities.transpose() * &phi - targets;
        let rmse = (residual.norm_squared() / residual.len() as f64).sqrt();
        log::debug!(
            "[SOLVE] {n} neurons, {m} eval points, {} dims: rmse {rmse:.4}",
            targets.ncols()
        );
    }

    Ok(phi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neuron::LifConfig;

    /// Hand-built 1-D population: alternating +/- encoders, intercepts
    /// spread across the range.
    fn tuning_setup(n: usize) -> (DMatrix<f64>, Vec<f64>) {
        let cfg = LifConfig::default();
        let mut gains = Vec::with_capacity(n);
        let mut biases = Vec::with_capacity(n);
        let mut encoders = Vec::with_capacity(n);
        for i in 0..n {
            let intercept = -0.9 + 1.7 * (i as f64 / (n - 1) as f64);
            let max_rate = 250.0 + (i % 5) as f64 * 25.0;
            let (g, b) = cfg.gain_bias(max_rate, intercept);
            gains.push(g);
            biases.push(b);
            encoders.push(if i % 2 == 0 { 1.0 } else { -1.0 });
        }

        let points: Vec<f64> = (0..41).map(|k| -1.0 + k as f64 * 0.05).collect();
        let activities = DMatrix::from_fn(n, points.len(), |i, k| {
            cfg.rate(gains[i] * encoders[i] * points[k] + biases[i])
        });
        (activities, points)
    }

    #[test]
    fn identity_decode_accuracy() {
        let (activities, points) = tuning_setup(40);
        let targets = DMatrix::from_fn(points.len(), 1, |k, _| points[k]);
        let phi = solve_decoders(&activities, &targets, DEFAULT_REG).unwrap();

        let estimate = activities.transpose() * phi;
        let mut err_sum = 0.0;
        let mut count = 0usize;
        for (k, &x) in points.iter().enumerate() {
            // Interior of the range; edges are always the worst-decoded.
            if x.abs() <= 0.8 {
                err_sum += (estimate[(k, 0)] - x).abs();
                count += 1;
            }
        }
        let mean_err = err_sum / count as f64;
        assert!(mean_err < 0.1, "mean identity decode error {mean_err}");
    }

    #[test]
    fn nonlinear_decode_accuracy() {
        let (activities, points) = tuning_setup(60);
        let targets = DMatrix::from_fn(points.len(), 1, |k, _| points[k] * points[k]);
        let phi = solve_decoders(&activities, &targets, DEFAULT_REG).unwrap();

        let estimate = activities.transpose() * phi;
        let mut worst = 0.0f64;
        for (k, &x) in points.iter().enumerate() {
            if x.abs() <= 0.8 {
                worst = worst.max((estimate[(k, 0)] - x * x).abs());
            }
        }
        assert!(worst < 0.25, "worst square decode error {worst}");
    }

    #[test]
    fn silent_population_fails() {
        // All-zero activities: nothing to decode from.
        let activities = DMatrix::zeros(10, 20);
        let targets = DMatrix::from_element(20, 1, 1.0);
        assert!(matches!(
            solve_decoders(&activities, &targets, DEFAULT_REG),
            Err(SolveError::NotPositiveDefinite)
        ));
    }

    #[test]
    fn decoder_shape() {
        let (activities, points) = tuning_setup(20);
        let targets = DMatrix::from_fn(points.len(), 2, |k, d| {
            if d == 0 { points[k] } else { -points[k] }
        });
        let phi = solve_decoders(&activities, &targets, DEFAULT_REG).unwrap();
        assert_eq!(phi.nrows(), 20);
        assert_eq!(phi.ncols(), 2);
    }
}
