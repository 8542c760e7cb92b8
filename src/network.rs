//! Model graph — nodes, ensembles, connections, probes.
//!
//! A `Network` is pure declaration: it owns the populations and the wiring
//! but no simulation state. Handles returned by the builder methods
//! (`NodeId`, `EnsembleId`, `ProbeId`) index into the network and are what
//! the simulator hands back data for.
//!
//! Misuse (dimension mismatches, dangling handles) is a construction-time
//! panic, not a runtime error: a model that builds is a model that runs.

use crate::ensemble::{Ensemble, EnsembleParams};
use crate::synapse::Filter;

/// Handle to a constant-output node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeId(pub(crate) usize);

/// Handle to an ensemble.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnsembleId(pub(crate) usize);

/// Handle to a probe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProbeId(pub(crate) usize);

/// Either end a connection can read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Source {
    Node(NodeId),
    Ensemble(EnsembleId),
}

impl From<NodeId> for Source {
    fn from(id: NodeId) -> Self {
        Source::Node(id)
    }
}

impl From<EnsembleId> for Source {
    fn from(id: EnsembleId) -> Self {
        Source::Ensemble(id)
    }
}

/// Readout function decoded along a connection.
pub type DecodedFn = Box<dyn Fn(&[f64]) -> Vec<f64>>;

/// A directed edge carrying a (possibly function-transformed) signal into an
/// ensemble.
pub struct Connection {
    pub pre: Source,
    pub post: EnsembleId,
    /// `None` decodes the represented value itself.
    pub function: Option<DecodedFn>,
    pub filter: Filter,
    /// Dimensionality of the carried signal (= post dimensions).
    pub dims: usize,
}

/// A recording tap on an ensemble's decoded output.
pub struct Probe {
    pub target: EnsembleId,
    pub filter: Filter,
}

/// Seed used by `Network::new`; `with_seed` overrides it.
pub const DEFAULT_SEED: u64 = 0xCAFE_F00D_5EED_0001;

/// A declared model: populations plus wiring.
pub struct Network {
    pub label: String,
    pub seed: u64,
    pub nodes: Vec<Vec<f64>>,
    pub ensembles: Vec<Ensemble>,
    pub connections: Vec<Connection>,
    pub probes: Vec<Probe>,
}

impl Network {
    /// Create an empty network with the default seed.
    pub fn new(label: &str) -> Self {
        Self::with_seed(label, DEFAULT_SEED)
    }

    /// Create an empty network. `seed` drives every population draw — same
    /// seed + same declarations = identical model.
    pub fn with_seed(label: &str, seed: u64) -> Self {
        Self {
            label: label.to_string(),
            seed,
            nodes: Vec::new(),
            ensembles: Vec::new(),
            connections: Vec::new(),
            probes: Vec::new(),
        }
    }

    /// Add a node emitting a constant vector.
    pub fn add_node(&mut self, values: Vec<f64>) -> NodeId {
        assert!(!values.is_empty(), "node must emit at least one value");
        self.nodes.push(values);
        NodeId(self.nodes.len() - 1)
    }

    /// Add an ensemble built from `params`. The population draw is seeded
    /// from the network seed mixed with the ensemble's index.
    pub fn add_ensemble(&mut self, params: EnsembleParams) -> EnsembleId {
        let idx = self.ensembles.len();
        let ens = Ensemble::new(&params, self.ensemble_seed(idx));
        self.ensembles.push(ens);
        EnsembleId(idx)
    }

    /// Connect `pre` to `post`, carrying the represented value unchanged.
    /// Uses the default 5 ms connection filter.
    pub fn connect(&mut self, pre: impl Into<Source>, post: EnsembleId) {
        let pre = pre.into();
        let dims = self.ensembles[post.0].dimensions;
        let pre_dims = self.source_dims(pre);
        assert_eq!(
            pre_dims, dims,
            "connection dimension mismatch: pre emits {pre_dims}, post represents {dims}"
        );
        self.connections.push(Connection {
            pre,
            post,
            function: None,
            filter: Filter::default_connection(),
            dims,
        });
    }

    /// Connect `pre` to `post` through a decoded function of the represented
    /// value. The function's output length must match the post ensemble's
    /// dimensionality (checked by probing it at the origin).
    pub fn connect_fn<F>(&mut self, pre: EnsembleId, post: EnsembleId, function: F)
    where
        F: Fn(&[f64]) -> Vec<f64> + 'static,
    {
        let pre_dims = self.ensembles[pre.0].dimensions;
        let dims = self.ensembles[post.0].dimensions;
        let probe_out = function(&vec![0.0; pre_dims]);
        assert_eq!(
            probe_out.len(),
            dims,
            "function output has {} dims, post ensemble represents {dims}",
            probe_out.len()
        );
        self.connections.push(Connection {
            pre: Source::Ensemble(pre),
            post,
            function: Some(Box::new(function)),
            filter: Filter::default_connection(),
            dims,
        });
    }

    /// Record an ensemble's decoded output each step, smoothed by `filter`.
    pub fn probe(&mut self, target: EnsembleId, filter: Filter) -> ProbeId {
        assert!(target.0 < self.ensembles.len(), "probe target does not exist");
        self.probes.push(Probe { target, filter });
        ProbeId(self.probes.len() - 1)
    }

    /// Output dimensionality of a connection source.
    pub fn source_dims(&self, source: Source) -> usize {
        match source {
            Source::Node(id) => self.nodes[id.0].len(),
            Source::Ensemble(id) => self.ensembles[id.0].dimensions,
        }
    }

    /// Per-ensemble population seed.
    pub(crate) fn ensemble_seed(&self, idx: usize) -> u64 {
        self.seed ^ (idx as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
    }

    /// Per-ensemble evaluation-point seed, kept distinct from the population
    /// seed so decoders are not solved on the points the parameters were
    /// drawn from.
    pub(crate) fn eval_seed(&self, idx: usize) -> u64 {
        self.ensemble_seed(idx).rotate_left(17) ^ 0xE7A1
    }
}
