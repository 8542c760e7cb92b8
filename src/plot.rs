//! Figure rendering — decoded traces plotted against reference lines.
//!
//! One chart per call: a shared time axis, any number of labeled series, a
//! fixed y-range so figures from the same run are visually comparable. PNG
//! output via the bitmap backend.

use std::error::Error;
use std::path::Path;

use plotters::prelude::*;

/// One labeled line on a chart.
pub struct TraceSeries<'a> {
    pub label: &'a str,
    pub values: &'a [f64],
}

/// Render `series` over the time axis `t` into a PNG at `out_path`.
///
/// Every series must have one value per time point. `y_range` fixes the
/// vertical extent.
pub fn render_traces(
    out_path: &Path,
    title: &str,
    t: &[f64],
    series: &[TraceSeries<'_>],
    y_range: (f64, f64),
) -> Result<(), Box<dyn Error>> {
    assert!(!t.is_empty(), "cannot plot an empty time axis");
    for s in series {
        assert_eq!(
            s.values.len(),
            t.len(),
            "series '{}' has {} values for {} time points",
            s.label,
            s.values.len(),
            t.len()
        );
    }

    let t_max = *t.last().expect("non-empty time axis");

    let root = BitMapBackend::new(out_path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0..t_max, y_range.0..y_range.1)?;

    chart
        .configure_mesh()
        .x_desc("time [s]")
        .draw()?;

    for (i, s) in series.iter().enumerate() {
        let color = Palette99::pick(i).mix(0.9);
        let points = t
            .iter()
            .copied()
            .zip(s.values.iter().copied())
            .collect::<Vec<(f64, f64)>>();
        chart
            .draw_series(LineSeries::new(points, &color))?
            .label(s.label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}
