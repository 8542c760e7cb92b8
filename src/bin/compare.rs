//! Compare demo: which of two dice rolls is larger?
//!
//! Rolls two integers in 1-6, feeds them as a constant 2-vector into a
//! spiking ensemble, and decodes the larger and smaller value through two
//! function connections. The decoded outputs are plotted against the known
//! answers, plus a third figure showing the decoded inputs themselves.
//!
//! Figures land in target/plots/.
//!
//! Run: cargo run --bin compare

use std::error::Error;
use std::fs::create_dir_all;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use nefsim::{
    render_traces, EnsembleParams, Filter, Network, SimConfig, Simulator, TraceSeries,
};

const INPUT_NEURONS: usize = 500;
const OUTPUT_NEURONS: usize = 100;
const INPUT_RADIUS: f64 = 10.0;
const OUTPUT_RADIUS: f64 = 15.0;
const PROBE_TAU: f64 = 0.01;
const RUN_SECONDS: f64 = 2.0;
/// Steps averaged when reporting what a decoded signal settled to.
const SETTLE_WINDOW: usize = 500;

/// Roll two independent dice.
fn roll_pair(rng: &mut StdRng) -> (u32, u32) {
    (rng.gen_range(1..=6), rng.gen_range(1..=6))
}

/// The larger component of a 2-vector. Ties fall to the second component.
fn larger_of(x: &[f64]) -> Vec<f64> {
    if x[0] > x[1] {
        vec![x[0]]
    } else {
        vec![x[1]]
    }
}

/// The smaller component of a 2-vector. Ties fall to the second component.
fn smaller_of(x: &[f64]) -> Vec<f64> {
    if x[0] < x[1] {
        vec![x[0]]
    } else {
        vec![x[1]]
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut rng = StdRng::from_entropy();
    let (a, b) = roll_pair(&mut rng);
    let larger = a.max(b) as f64;
    let smaller = a.min(b) as f64;

    let mut net = Network::new("compare");
    let input_values = net.add_node(vec![a as f64, b as f64]);
    let input = net.add_ensemble(EnsembleParams {
        n_neurons: INPUT_NEURONS,
        dimensions: 2,
        radius: INPUT_RADIUS,
        ..Default::default()
    });
    let greater = net.add_ensemble(EnsembleParams {
        n_neurons: OUTPUT_NEURONS,
        dimensions: 1,
        radius: OUTPUT_RADIUS,
        ..Default::default()
    });
    let lesser = net.add_ensemble(EnsembleParams {
        n_neurons: OUTPUT_NEURONS,
        dimensions: 1,
        radius: OUTPUT_RADIUS,
        ..Default::default()
    });

    net.connect(input_values, input);
    net.connect_fn(input, greater, larger_of);
    net.connect_fn(input, lesser, smaller_of);

    let input_probe = net.probe(input, Filter::None);
    let greater_probe = net.probe(greater, Filter::Lowpass(PROBE_TAU));
    let lesser_probe = net.probe(lesser, Filter::Lowpass(PROBE_TAU));

    let mut sim = Simulator::new(&net, SimConfig::default())?;
    sim.run(RUN_SECONDS);

    let t = sim.trange();
    let greater_trace = sim.probe_data(greater_probe).column(0);
    let lesser_trace = sim.probe_data(lesser_probe).column(0);
    let input_a = sim.probe_data(input_probe).column(0);
    let input_b = sim.probe_data(input_probe).column(1);

    println!("rolled ({a}, {b}) -> larger {larger}, smaller {smaller}");
    println!(
        "decoded larger  {:.2}  (answer {larger})",
        sim.probe_data(greater_probe).tail_mean(0, SETTLE_WINDOW)
    );
    println!(
        "decoded smaller {:.2}  (answer {smaller})",
        sim.probe_data(lesser_probe).tail_mean(0, SETTLE_WINDOW)
    );

    let out_dir = Path::new("target/plots");
    create_dir_all(out_dir)?;

    let larger_ref = vec![larger; t.len()];
    render_traces(
        &out_dir.join("larger.png"),
        "Return Larger Value",
        &t,
        &[
            TraceSeries { label: "Neuron Output", values: &greater_trace },
            TraceSeries { label: "Right Answer", values: &larger_ref },
        ],
        (0.0, 8.0),
    )?;

    let smaller_ref = vec![smaller; t.len()];
    render_traces(
        &out_dir.join("smaller.png"),
        "Return Smaller Value",
        &t,
        &[
            TraceSeries { label: "Neuron Output", values: &lesser_trace },
            TraceSeries { label: "Right Answer", values: &smaller_ref },
        ],
        (0.0, 8.0),
    )?;

    let ref_a = vec![a as f64; t.len()];
    let ref_b = vec![b as f64; t.len()];
    render_traces(
        &out_dir.join("inputs.png"),
        "Inputs",
        &t,
        &[
            TraceSeries { label: "Decoded Input 1", values: &input_a },
            TraceSeries { label: "Decoded Input 2", values: &input_b },
            TraceSeries { label: "Input 1", values: &ref_a },
            TraceSeries { label: "Input 2", values: &ref_b },
        ],
        (0.0, 15.0),
    )?;

    println!("figures written to {}", out_dir.display());
    Ok(())
}
