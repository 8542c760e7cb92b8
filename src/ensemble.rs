//! Neuron ensembles — populations collectively encoding a vector signal.
//!
//! Each neuron gets a unit encoder, a gain, and a bias, sampled from the
//! ensemble's parameter distributions with a deterministic seed: same seed +
//! same params = identical population. The represented value lives in a ball
//! of the configured radius; encoding divides by the radius so the neuron
//! response curves are solved over the normalized [-1, 1] projection.

use nalgebra::DMatrix;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::neuron::LifConfig;

/// Ensemble construction parameters.
#[derive(Clone, Debug)]
pub struct EnsembleParams {
    /// Number of LIF neurons in the population.
    pub n_neurons: usize,
    /// Dimensionality of the represented vector.
    pub dimensions: usize,
    /// Radius of the represented ball. Values beyond it saturate.
    pub radius: f64,
    /// Uniform range of per-neuron peak firing rates (Hz). Default: 200-400
    pub max_rates: (f64, f64),
    /// Uniform range of per-neuron intercepts on the normalized projection.
    /// Default: -1.0 to 0.9
    pub intercepts: (f64, f64),
    /// LIF time constants.
    pub lif: LifConfig,
}

impl Default for EnsembleParams {
    fn default() -> Self {
        Self {
            n_neurons: 50,
            dimensions: 1,
            radius: 1.0,
            max_rates: (200.0, 400.0),
            intercepts: (-1.0, 0.9),
            lif: LifConfig::default(),
        }
    }
}

/// A population of LIF neurons encoding a `dimensions`-vector.
///
/// Encoders are stored flat, row-major: neuron `i` owns
/// `encoders[i * dimensions .. (i + 1) * dimensions]`.
pub struct Ensemble {
    pub n_neurons: usize,
    pub dimensions: usize,
    pub radius: f64,
    pub lif: LifConfig,
    pub encoders: Vec<f64>,
    pub gain: Vec<f64>,
    pub bias: Vec<f64>,
}

impl Ensemble {
    /// Build a population from `params`, drawing every per-neuron parameter
    /// from `seed`.
    pub fn new(params: &EnsembleParams, seed: u64) -> Self {
        assert!(params.n_neurons > 0, "ensemble needs at least one neuron");
        assert!(params.dimensions > 0, "ensemble needs at least one dimension");
        assert!(params.radius > 0.0, "radius must be positive, got {}", params.radius);

        let n = params.n_neurons;
        let d = params.dimensions;
        let mut rng = StdRng::seed_from_u64(seed);

        let rate_dist = Uniform::new(params.max_rates.0, params.max_rates.1);
        let intercept_dist = Uniform::new(params.intercepts.0, params.intercepts.1);

        let mut gain = Vec::with_capacity(n);
        let mut bias = Vec::with_capacity(n);
        for _ in 0..n {
            let max_rate = rate_dist.sample(&mut rng);
            let intercept = intercept_dist.sample(&mut rng);
            let (g, b) = params.lif.gain_bias(max_rate, intercept);
            gain.push(g);
            bias.push(b);
        }

        let mut encoders = Vec::with_capacity(n * d);
        for _ in 0..n {
            if d == 1 {
                encoders.push(if rng.gen::<bool>() { 1.0 } else { -1.0 });
            } else {
                // Normalized Gaussian draw: uniform direction on the sphere.
                let start = encoders.len();
                let mut norm_sq = 0.0;
                for _ in 0..d {
                    let g: f64 = rng.sample(StandardNormal);
                    norm_sq += g * g;
                    encoders.push(g);
                }
                let norm = norm_sq.sqrt().max(f64::MIN_POSITIVE);
                for e in &mut encoders[start..] {
                    *e /= norm;
                }
            }
        }

        Self {
            n_neurons: n,
            dimensions: d,
            radius: params.radius,
            lif: params.lif,
            encoders,
            gain,
            bias,
        }
    }

    /// Encoder of neuron `i`.
    #[inline]
    pub fn encoder(&self, i: usize) -> &[f64] {
        &self.encoders[i * self.dimensions..(i + 1) * self.dimensions]
    }

    /// Input currents for a point `x` in represented space, written into
    /// `out` (length `n_neurons`).
    pub fn input_current(&self, x: &[f64], out: &mut [f64]) {
        debug_assert_eq!(x.len(), self.dimensions);
        debug_assert_eq!(out.len(), self.n_neurons);
        for i in 0..self.n_neurons {
            let e = self.encoder(i);
            let mut proj = 0.0;
            for k in 0..self.dimensions {
                proj += e[k] * x[k];
            }
            out[i] = self.gain[i] * proj / self.radius + self.bias[i];
        }
    }

    /// Steady-state activities over a set of evaluation points: an
    /// `n_neurons x points` matrix of rates in Hz. Input to the decoder
    /// solver.
    pub fn tuning_curves(&self, points: &[Vec<f64>]) -> DMatrix<f64> {
        let mut current = vec![0.0; self.n_neurons];
        let mut activities = DMatrix::zeros(self.n_neurons, points.len());
        for (k, x) in points.iter().enumerate() {
            self.input_current(x, &mut current);
            for i in 0..self.n_neurons {
                activities[(i, k)] = self.lif.rate(current[i]);
            }
        }
        activities
    }

    /// Sample `m` evaluation points uniformly from the represented ball.
    pub fn eval_points(&self, m: usize, seed: u64) -> Vec<Vec<f64>> {
        let d = self.dimensions;
        let mut rng = StdRng::seed_from_u64(seed);
        let mut points = Vec::with_capacity(m);
        for _ in 0..m {
            // Gaussian direction, radius scaled by u^(1/d) for volume
            // uniformity.
            let mut x: Vec<f64> = (0..d).map(|_| rng.sample::<f64, _>(StandardNormal)).collect();
            let norm = x.iter().map(|v| v * v).sum::<f64>().sqrt().max(f64::MIN_POSITIVE);
            let r = self.radius * rng.gen::<f64>().powf(1.0 / d as f64);
            for v in &mut x {
                *v *= r / norm;
            }
            points.push(x);
        }
        points
    }
}
