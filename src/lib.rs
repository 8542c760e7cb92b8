//! # nefsim
//!
//! Spiking neural ensemble simulator.
//!
//! Provides LIF (Leaky Integrate-and-Fire) neuron populations that
//! collectively encode vector signals, least-squares decoders that read
//! arbitrary functions of the represented value back out of spike activity,
//! exponential synapse filters, a fixed-step simulator with probes, and PNG
//! plot output for decoded traces.
//!
//! Declare a model with [`Network`], compile and run it with [`Simulator`],
//! then pull recorded data per probe and hand it to [`plot::render_traces`].

pub mod decoder;
pub mod ensemble;
pub mod network;
pub mod neuron;
pub mod plot;
pub mod probe;
pub mod simulator;
pub mod synapse;

pub use decoder::{solve_decoders, SolveError, DEFAULT_REG};
pub use ensemble::{Ensemble, EnsembleParams};
pub use network::{Connection, EnsembleId, Network, NodeId, Probe, ProbeId, Source};
pub use neuron::{LifConfig, NeuronArrays};
pub use plot::{render_traces, TraceSeries};
pub use probe::ProbeData;
pub use simulator::{NeuronMode, SimConfig, Simulator};
pub use synapse::{Filter, FilterState};
