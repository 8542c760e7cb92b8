//! Probe recordings — decoded output logged per simulation step.
//!
//! Storage is a single flat array (`steps * dims`) appended row-by-row; the
//! accessors slice it back into rows or per-dimension columns for plotting.

/// Recorded data for one probe.
pub struct ProbeData {
    dims: usize,
    samples: Vec<f64>,
}

impl ProbeData {
    pub(crate) fn new(dims: usize) -> Self {
        assert!(dims > 0, "probe must record at least one dimension");
        Self {
            dims,
            samples: Vec::new(),
        }
    }

    pub(crate) fn push_row(&mut self, row: &[f64]) {
        debug_assert_eq!(row.len(), self.dims);
        self.samples.extend_from_slice(row);
    }

    /// Number of recorded steps.
    pub fn len(&self) -> usize {
        self.samples.len() / self.dims
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Dimensionality of each recorded row.
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// The decoded vector recorded at step `k`.
    pub fn row(&self, k: usize) -> &[f64] {
        &self.samples[k * self.dims..(k + 1) * self.dims]
    }

    /// One dimension of the recording as a contiguous series.
    pub fn column(&self, d: usize) -> Vec<f64> {
        assert!(d < self.dims, "probe has {} dims, asked for {d}", self.dims);
        self.samples.iter().skip(d).step_by(self.dims).copied().collect()
    }

    /// Mean of one dimension over the final `steps` rows. Handy for checking
    /// what a decoded signal settled to.
    pub fn tail_mean(&self, d: usize, steps: usize) -> f64 {
        let col = self.column(d);
        let take = steps.min(col.len()).max(1);
        let tail = &col[col.len() - take..];
        tail.iter().sum::<f64>() / tail.len() as f64
    }
}
