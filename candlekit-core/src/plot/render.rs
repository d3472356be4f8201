//! Image rendering via plotters.

use super::{DistributionPlot, PlotError, PLOT_TITLE, X_LABEL, Y_LABEL};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

const SIZE: (u32, u32) = (1000, 600);

fn render_err(e: impl std::fmt::Display) -> PlotError {
    PlotError::Render(e.to_string())
}

pub(super) fn to_file(plot: &DistributionPlot, path: &Path) -> Result<(), PlotError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(render_err)?;
    }

    let is_svg = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"));

    if is_svg {
        draw(plot, SVGBackend::new(path, SIZE).into_drawing_area())
    } else {
        draw(plot, BitMapBackend::new(path, SIZE).into_drawing_area())
    }
}

fn draw<DB: DrawingBackend>(
    plot: &DistributionPlot,
    root: DrawingArea<DB, Shift>,
) -> Result<(), PlotError> {
    root.fill(&WHITE).map_err(render_err)?;

    let (x_lo, x_hi) = plot.x_range();
    let y_hi = plot.y_max() * 1.1;

    let mut chart = ChartBuilder::on(&root)
        .caption(PLOT_TITLE, ("sans-serif", 28))
        .margin(10u32)
        .x_label_area_size(40u32)
        .y_label_area_size(60u32)
        .build_cartesian_2d(x_lo..x_hi, 0.0..y_hi)
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .x_desc(X_LABEL)
        .y_desc(Y_LABEL)
        .draw()
        .map_err(render_err)?;

    chart
        .draw_series(plot.bins().iter().map(|bin| {
            Rectangle::new(
                [(bin.lower, 0.0), (bin.upper, bin.density)],
                BLUE.mix(0.4).filled(),
            )
        }))
        .map_err(render_err)?;

    if plot.has_density_curve() {
        chart
            .draw_series(LineSeries::new(
                plot.density().iter().copied(),
                RED.stroke_width(2),
            ))
            .map_err(render_err)?;
    }

    root.present().map_err(render_err)?;
    Ok(())
}
