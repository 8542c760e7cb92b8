//! Synapse filters — exponential smoothing applied to decoded signals.
//!
//! A connection or probe carries a `Filter`; the simulator holds one
//! `FilterState` per edge, sized to the signal's dimensionality. The lowpass
//! step is the discrete form of `tau * dy/dt = u - y`, so a filtered spike
//! train converges on the underlying firing rate.

/// Smoothing applied to a decoded signal during readout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Filter {
    /// First-order lowpass with the given time constant in seconds.
    Lowpass(f64),
    /// Pass the raw signal through unchanged.
    None,
}

impl Filter {
    /// Default filter on connections between populations: 5 ms lowpass.
    pub fn default_connection() -> Self {
        Filter::Lowpass(0.005)
    }
}

/// Per-edge filter state — one value per signal dimension.
pub struct FilterState {
    filter: Filter,
    /// Smoothing coefficient, precomputed as `1 - exp(-dt / tau)`.
    alpha: f64,
    value: Vec<f64>,
}

impl FilterState {
    /// Allocate state for a `dims`-dimensional signal stepped at `dt`.
    pub fn new(filter: Filter, dims: usize, dt: f64) -> Self {
        let alpha = match filter {
            Filter::Lowpass(tau) => {
                assert!(tau > 0.0, "lowpass time constant must be positive, got {tau}");
                1.0 - (-dt / tau).exp()
            }
            Filter::None => 1.0,
        };
        Self {
            filter,
            alpha,
            value: vec![0.0; dims],
        }
    }

    /// Feed one step of input, returning the filtered signal.
    pub fn step(&mut self, input: &[f64]) -> &[f64] {
        debug_assert_eq!(input.len(), self.value.len());
        match self.filter {
            Filter::Lowpass(_) => {
                for (y, &u) in self.value.iter_mut().zip(input) {
                    *y += self.alpha * (u - *y);
                }
            }
            Filter::None => self.value.copy_from_slice(input),
        }
        &self.value
    }

    /// The most recently emitted signal.
    #[inline]
    pub fn value(&self) -> &[f64] {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowpass_step_response() {
        // Constant input: y(k) = 1 - exp(-k * dt / tau).
        let dt = 0.001;
        let tau = 0.01;
        let mut f = FilterState::new(Filter::Lowpass(tau), 1, dt);

        for _ in 0..10 {
            f.step(&[1.0]);
        }
        let expected = 1.0 - (-10.0 * dt / tau).exp();
        assert!((f.value()[0] - expected).abs() < 1e-9);

        // After five time constants the output has effectively settled.
        for _ in 0..40 {
            f.step(&[1.0]);
        }
        assert!(f.value()[0] > 0.99, "settled at {}", f.value()[0]);
    }

    #[test]
    fn lowpass_smooths_impulses() {
        // A periodic impulse train of area rate*dt converges near the rate.
        let dt = 0.001;
        let mut f = FilterState::new(Filter::Lowpass(0.05), 1, dt);
        let impulse = 1.0 / dt;

        let mut last = 0.0;
        for step in 0..2000 {
            // 100 Hz train: impulse every 10th step.
            let u = if step % 10 == 0 { impulse } else { 0.0 };
            last = f.step(&[u])[0];
        }
        assert!(
            (last - 100.0).abs() < 15.0,
            "filtered 100 Hz train reads {last}"
        );
    }

    #[test]
    fn none_passes_through() {
        let mut f = FilterState::new(Filter::None, 2, 0.001);
        let out = f.step(&[3.0, -1.5]);
        assert_eq!(out, &[3.0, -1.5]);
    }

    #[test]
    fn multidimensional_state() {
        let mut f = FilterState::new(Filter::Lowpass(0.005), 3, 0.001);
        f.step(&[1.0, 0.0, -1.0]);
        let v = f.value();
        assert!(v[0] > 0.0 && v[1] == 0.0 && v[2] < 0.0);
        assert!((v[0] + v[2]).abs() < 1e-12, "symmetric inputs stay symmetric");
    }
}
