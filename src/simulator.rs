//! Fixed-step simulation engine.
//!
//! `Simulator::new` compiles a declared `Network`: it solves every decoder
//! the wiring needs up front, then allocates per-ensemble neuron state and
//! per-edge filter state. `run`/`step` advance the whole model with a
//! numbered-phase update: propagate connections from last step's activity,
//! integrate every population, record probes.

use nalgebra::DMatrix;

use crate::decoder::{self, SolveError};
use crate::network::{Network, ProbeId, Source};
use crate::neuron::NeuronArrays;
use crate::probe::ProbeData;
use crate::synapse::FilterState;

/// How population activity is produced each step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NeuronMode {
    /// Integrate membranes and emit spike impulses.
    Spiking,
    /// Emit the steady-state rate curve directly — deterministic and smooth.
    Rate,
}

/// Simulator configuration.
#[derive(Clone, Copy, Debug)]
pub struct SimConfig {
    /// Step size in seconds. Default: 1 ms
    pub dt: f64,
    /// Spiking or rate-based activity. Default: spiking
    pub mode: NeuronMode,
    /// Evaluation points sampled per ensemble for the decoder solves.
    /// Default: 1000
    pub eval_points: usize,
    /// Decoder regularization fraction. Default: `decoder::DEFAULT_REG`
    pub reg: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dt: 0.001,
            mode: NeuronMode::Spiking,
            eval_points: 1000,
            reg: decoder::DEFAULT_REG,
        }
    }
}

/// Compiled, steppable model. Borrows the network it was built from.
pub struct Simulator<'net> {
    network: &'net Network,
    config: SimConfig,
    step_count: u64,

    /// Per-ensemble dynamic neuron state.
    neurons: Vec<NeuronArrays>,
    /// Per-ensemble represented-space input accumulator.
    inputs: Vec<Vec<f64>>,
    /// Per-ensemble input-current scratch (avoids allocation in step).
    currents: Vec<Vec<f64>>,

    /// Per-connection decoders (`None` for node sources).
    conn_decoders: Vec<Option<DMatrix<f64>>>,
    conn_filters: Vec<FilterState>,
    conn_scratch: Vec<Vec<f64>>,

    /// Per-probe identity decoders and recordings.
    probe_decoders: Vec<DMatrix<f64>>,
    probe_filters: Vec<FilterState>,
    probe_scratch: Vec<Vec<f64>>,
    probe_data: Vec<ProbeData>,
}

/// Decode a represented value from raw activity: `out = phi^T * activity`.
/// Spiking activity is mostly zeros, so silent neurons are skipped.
fn decode_into(phi: &DMatrix<f64>, activity: &[f64], out: &mut [f64]) {
    debug_assert_eq!(phi.nrows(), activity.len());
    debug_assert_eq!(phi.ncols(), out.len());
    out.fill(0.0);
    for (i, &a) in activity.iter().enumerate() {
        if a != 0.0 {
            for (d, o) in out.iter_mut().enumerate() {
                *o += phi[(i, d)] * a;
            }
        }
    }
}

impl<'net> Simulator<'net> {
    /// Compile `network`: solve decoders, allocate state.
    ///
    /// Fails only if a decoder solve fails (see [`SolveError`]).
    pub fn new(network: &'net Network, config: SimConfig) -> Result<Self, SolveError> {
        assert!(config.dt > 0.0, "dt must be positive, got {}", config.dt);
        assert!(config.eval_points > 0, "need at least one evaluation point");

        let n_ens = network.ensembles.len();

        // Eval points + tuning-curve activities, computed once per ensemble
        // that feeds any decoder solve.
        let mut samples: Vec<Option<(Vec<Vec<f64>>, DMatrix<f64>)>> =
            (0..n_ens).map(|_| None).collect();
        // Identity decoders shared by plain connections and probes.
        let mut identity: Vec<Option<DMatrix<f64>>> = vec![None; n_ens];

        let ensure_samples = |samples: &mut Vec<Option<(Vec<Vec<f64>>, DMatrix<f64>)>>,
                              idx: usize| {
            if samples[idx].is_none() {
                let ens = &network.ensembles[idx];
                let points = ens.eval_points(config.eval_points, network.eval_seed(idx));
                let acts = ens.tuning_curves(&points);
                samples[idx] = Some((points, acts));
            }
        };

        let solve_identity = |samples: &mut Vec<Option<(Vec<Vec<f64>>, DMatrix<f64>)>>,
                              identity: &mut Vec<Option<DMatrix<f64>>>,
                              idx: usize|
         -> Result<DMatrix<f64>, SolveError> {
            if identity[idx].is_none() {
                ensure_samples(samples, idx);
                let (points, acts) = samples[idx].as_ref().expect("samples just built");
                let dims = network.ensembles[idx].dimensions;
                let targets = DMatrix::from_fn(points.len(), dims, |k, d| points[k][d]);
                identity[idx] = Some(decoder::solve_decoders(acts, &targets, config.reg)?);
            }
            Ok(identity[idx].clone().expect("identity just solved"))
        };

        let mut conn_decoders = Vec::with_capacity(network.connections.len());
        let mut conn_filters = Vec::with_capacity(network.connections.len());
        let mut conn_scratch = Vec::with_capacity(network.connections.len());
        for conn in &network.connections {
            let phi = match conn.pre {
                Source::Node(_) => None,
                Source::Ensemble(pre) => match &conn.function {
                    None => Some(solve_identity(&mut samples, &mut identity, pre.0)?),
                    Some(f) => {
                        ensure_samples(&mut samples, pre.0);
                        let (points, acts) = samples[pre.0].as_ref().expect("samples just built");
                        let values: Vec<Vec<f64>> = points.iter().map(|x| f(x)).collect();
                        let targets =
                            DMatrix::from_fn(points.len(), conn.dims, |k, d| values[k][d]);
                        Some(decoder::solve_decoders(acts, &targets, config.reg)?)
                    }
                },
            };
            conn_decoders.push(phi);
            conn_filters.push(FilterState::new(conn.filter, conn.dims, config.dt));
            conn_scratch.push(vec![0.0; conn.dims]);
        }

        let mut probe_decoders = Vec::with_capacity(network.probes.len());
        let mut probe_filters = Vec::with_capacity(network.probes.len());
        let mut probe_scratch = Vec::with_capacity(network.probes.len());
        let mut probe_data = Vec::with_capacity(network.probes.len());
        for probe in &network.probes {
            let dims = network.ensembles[probe.target.0].dimensions;
            probe_decoders.push(solve_identity(&mut samples, &mut identity, probe.target.0)?);
            probe_filters.push(FilterState::new(probe.filter, dims, config.dt));
            probe_scratch.push(vec![0.0; dims]);
            probe_data.push(ProbeData::new(dims));
        }

        log::debug!(
            "[BUILD] '{}': {} ensembles, {} connections, {} probes, dt {} s",
            network.label,
            n_ens,
            network.connections.len(),
            network.probes.len(),
            config.dt
        );

        Ok(Self {
            network,
            config,
            step_count: 0,
            neurons: network.ensembles.iter().map(|e| NeuronArrays::new(e.n_neurons)).collect(),
            inputs: network.ensembles.iter().map(|e| vec![0.0; e.dimensions]).collect(),
            currents: network.ensembles.iter().map(|e| vec![0.0; e.n_neurons]).collect(),
            conn_decoders,
            conn_filters,
            conn_scratch,
            probe_decoders,
            probe_filters,
            probe_scratch,
            probe_data,
        })
    }

    /// Advance the model one step of `dt` seconds.
    pub fn step(&mut self) {
        let net = self.network;
        let dt = self.config.dt;

        // 1. Propagate connections from last step's activity into each
        //    ensemble's represented-space input.
        for inp in &mut self.inputs {
            inp.fill(0.0);
        }
        for (ci, conn) in net.connections.iter().enumerate() {
            match conn.pre {
                Source::Node(id) => {
                    self.conn_filters[ci].step(&net.nodes[id.0]);
                }
                Source::Ensemble(id) => {
                    let phi = self.conn_decoders[ci].as_ref().expect("solved at build");
                    decode_into(phi, &self.neurons[id.0].activity, &mut self.conn_scratch[ci]);
                    self.conn_filters[ci].step(&self.conn_scratch[ci]);
                }
            }
            let filtered = self.conn_filters[ci].value();
            for (x, &v) in self.inputs[conn.post.0].iter_mut().zip(filtered) {
                *x += v;
            }
        }

        // 2. Integrate every population.
        for (ei, ens) in net.ensembles.iter().enumerate() {
            ens.input_current(&self.inputs[ei], &mut self.currents[ei]);
            match self.config.mode {
                NeuronMode::Spiking => {
                    self.neurons[ei].step_spiking(&self.currents[ei], dt, &ens.lif)
                }
                NeuronMode::Rate => self.neurons[ei].step_rate(&self.currents[ei], &ens.lif),
            }
        }

        // 3. Record probes.
        for (pi, probe) in net.probes.iter().enumerate() {
            decode_into(
                &self.probe_decoders[pi],
                &self.neurons[probe.target.0].activity,
                &mut self.probe_scratch[pi],
            );
            self.probe_filters[pi].step(&self.probe_scratch[pi]);
            self.probe_data[pi].push_row(self.probe_filters[pi].value());
        }

        self.step_count += 1;
    }

    /// Run for `duration` seconds of simulated time (rounded to whole steps).
    pub fn run(&mut self, duration: f64) {
        let steps = (duration / self.config.dt).round() as u64;
        log::debug!(
            "[RUN] '{}': {steps} steps of {} s",
            self.network.label,
            self.config.dt
        );
        for _ in 0..steps {
            self.step();
        }
    }

    /// Simulated time elapsed so far.
    pub fn time(&self) -> f64 {
        self.step_count as f64 * self.config.dt
    }

    /// Time axis for recorded data: one entry per completed step, ending at
    /// [`Self::time`].
    pub fn trange(&self) -> Vec<f64> {
        (1..=self.step_count).map(|k| k as f64 * self.config.dt).collect()
    }

    /// Recorded data for `probe`.
    pub fn probe_data(&self, probe: ProbeId) -> &ProbeData {
        &self.probe_data[probe.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ensemble::EnsembleParams;
    use crate::synapse::Filter;

    fn scalar_params(n: usize, radius: f64) -> EnsembleParams {
        EnsembleParams {
            n_neurons: n,
            dimensions: 1,
            radius,
            ..Default::default()
        }
    }

    /// Node -> ensemble -> probe, the smallest closed loop.
    fn scalar_model(value: f64) -> (Network, ProbeId) {
        let mut net = Network::with_seed("scalar", 21);
        let node = net.add_node(vec![value]);
        let ens = net.add_ensemble(scalar_params(100, 1.0));
        net.connect(node, ens);
        let probe = net.probe(ens, Filter::Lowpass(0.01));
        (net, probe)
    }

    #[test]
    fn rate_mode_represents_constant() {
        let (net, probe) = scalar_model(0.5);
        let mut sim = Simulator::new(
            &net,
            SimConfig {
                mode: NeuronMode::Rate,
                ..Default::default()
            },
        )
        .unwrap();
        sim.run(0.3);

        let settled = sim.probe_data(probe).tail_mean(0, 100);
        assert!(
            (settled - 0.5).abs() < 0.1,
            "rate-mode decode settled at {settled}, expected 0.5"
        );
    }

    #[test]
    fn spiking_mode_represents_constant() {
        let (net, probe) = scalar_model(0.5);
        let mut sim = Simulator::new(&net, SimConfig::default()).unwrap();
        sim.run(0.5);

        let settled = sim.probe_data(probe).tail_mean(0, 200);
        assert!(
            (settled - 0.5).abs() < 0.15,
            "spiking decode settled at {settled}, expected 0.5"
        );
    }

    #[test]
    fn decoded_function_connection() {
        // Two-stage pipeline decoding the componentwise extrema of a
        // 2-vector, the shape of the compare demo.
        let mut net = Network::with_seed("extrema", 33);
        let node = net.add_node(vec![2.0, 5.0]);
        let input = net.add_ensemble(EnsembleParams {
            n_neurons: 500,
            dimensions: 2,
            radius: 10.0,
            ..Default::default()
        });
        let hi = net.add_ensemble(scalar_params(100, 15.0));
        let lo = net.add_ensemble(scalar_params(100, 15.0));
        net.connect(node, input);
        net.connect_fn(input, hi, |x| vec![if x[0] > x[1] { x[0] } else { x[1] }]);
        net.connect_fn(input, lo, |x| vec![if x[0] < x[1] { x[0] } else { x[1] }]);
        let probe_hi = net.probe(hi, Filter::Lowpass(0.01));
        let probe_lo = net.probe(lo, Filter::Lowpass(0.01));

        let mut sim = Simulator::new(
            &net,
            SimConfig {
                mode: NeuronMode::Rate,
                eval_points: 500,
                ..Default::default()
            },
        )
        .unwrap();
        sim.run(0.5);

        let hi_val = sim.probe_data(probe_hi).tail_mean(0, 100);
        let lo_val = sim.probe_data(probe_lo).tail_mean(0, 100);
        assert!((hi_val - 5.0).abs() < 1.2, "larger decoded as {hi_val}");
        assert!((lo_val - 2.0).abs() < 1.2, "smaller decoded as {lo_val}");
        assert!(hi_val > lo_val, "ordering must survive decoding");
    }

    #[test]
    fn spiking_runs_are_deterministic() {
        let build = || {
            let mut net = Network::with_seed("det", 5);
            let node = net.add_node(vec![0.3]);
            let ens = net.add_ensemble(scalar_params(50, 1.0));
            net.connect(node, ens);
            let probe = net.probe(ens, Filter::Lowpass(0.02));
            (net, probe)
        };
        let (net_a, probe_a) = build();
        let (net_b, probe_b) = build();

        let mut sim_a = Simulator::new(&net_a, SimConfig::default()).unwrap();
        let mut sim_b = Simulator::new(&net_b, SimConfig::default()).unwrap();
        sim_a.run(0.1);
        sim_b.run(0.1);

        let a = sim_a.probe_data(probe_a);
        let b = sim_b.probe_data(probe_b);
        assert_eq!(a.len(), b.len());
        for k in 0..a.len() {
            assert_eq!(a.row(k), b.row(k), "divergence at step {k}");
        }
    }

    #[test]
    fn trange_matches_recordings() {
        let (net, probe) = scalar_model(0.1);
        let mut sim = Simulator::new(&net, SimConfig::default()).unwrap();
        sim.run(0.05);

        let t = sim.trange();
        assert_eq!(t.len(), 50);
        assert_eq!(sim.probe_data(probe).len(), 50);
        assert!((t[0] - 0.001).abs() < 1e-12);
        assert!((t[49] - 0.05).abs() < 1e-12);

        // Runs accumulate.
        sim.run(0.05);
        assert_eq!(sim.trange().len(), 100);
        assert_eq!(sim.probe_data(probe).len(), 100);
        assert!((sim.time() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn unfiltered_probe_records_raw_rows() {
        let mut net = Network::with_seed("raw", 2);
        let node = net.add_node(vec![0.4, -0.2]);
        let ens = net.add_ensemble(EnsembleParams {
            n_neurons: 80,
            dimensions: 2,
            ..Default::default()
        });
        net.connect(node, ens);
        let probe = net.probe(ens, Filter::None);

        let mut sim = Simulator::new(&net, SimConfig::default()).unwrap();
        sim.run(0.05);

        let data = sim.probe_data(probe);
        assert_eq!(data.dims(), 2);
        assert_eq!(data.len(), 50);
    }
}
