//! Distribution plots: a density-normalized histogram with a Gaussian kernel
//! density estimate laid over it.
//!
//! [`DistributionPlot`] holds only computed geometry (bins and curve points),
//! so the same value can be rendered to an image file here or drawn in a
//! terminal by the TUI crate.

mod kde;
mod render;

use statrs::statistics::Statistics;
use std::path::Path;
use thiserror::Error;

pub use kde::{scott_bandwidth, GaussianKde};

/// Histogram bin count used when the caller has no preference.
pub const DEFAULT_BINS: usize = 30;

/// Upper bound on the histogram bin count.
pub const MAX_BINS: usize = 10_000;

/// Number of points the density curve is evaluated at.
pub const KDE_GRID_POINTS: usize = 200;

pub const PLOT_TITLE: &str = "Distribution with KDE";
pub const X_LABEL: &str = "Value";
pub const Y_LABEL: &str = "Density";

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("no finite values to plot")]
    EmptyData,

    #[error("bin count must be between 1 and {}", MAX_BINS)]
    InvalidBins,

    #[error("render error: {0}")]
    Render(String),
}

/// One histogram bin. `density` is `count / (n * width)`, so the bar areas
/// sum to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
    pub density: f64,
}

impl Bin {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistributionPlot {
    samples: usize,
    mean: f64,
    std_dev: f64,
    bins: Vec<Bin>,
    density: Vec<(f64, f64)>,
}

impl DistributionPlot {
    /// Build the plot model from raw values.
    ///
    /// NaN and infinite values are dropped before anything is computed.
    pub fn new(values: &[f64], bins: usize) -> Result<Self, PlotError> {
        if bins == 0 || bins > MAX_BINS {
            return Err(PlotError::InvalidBins);
        }
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            return Err(PlotError::EmptyData);
        }

        let mean = finite.iter().mean();
        let std_dev = if finite.len() > 1 {
            finite.iter().std_dev()
        } else {
            0.0
        };

        let bins = histogram(&finite, bins);
        let density = match GaussianKde::fit(&finite) {
            Some(kde) => {
                let lo = bins.first().map_or(0.0, |b| b.lower);
                let hi = bins.last().map_or(0.0, |b| b.upper);
                kde.evaluate_grid(lo, hi, KDE_GRID_POINTS)
            }
            None => Vec::new(),
        };

        Ok(Self {
            samples: finite.len(),
            mean,
            std_dev,
            bins,
            density,
        })
    }

    /// Number of finite values the plot was built from.
    pub fn samples(&self) -> usize {
        self.samples
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample standard deviation; zero for a single value.
    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }

    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    /// KDE curve as `(x, density)` points. Empty for degenerate input.
    pub fn density(&self) -> &[(f64, f64)] {
        &self.density
    }

    pub fn has_density_curve(&self) -> bool {
        !self.density.is_empty()
    }

    /// Horizontal extent covered by the bins.
    pub fn x_range(&self) -> (f64, f64) {
        let lo = self.bins.first().map_or(0.0, |b| b.lower);
        let hi = self.bins.last().map_or(1.0, |b| b.upper);
        (lo, hi)
    }

    /// Tallest bar or curve point, never zero.
    pub fn y_max(&self) -> f64 {
        let bars = self.bins.iter().map(|b| b.density);
        let curve = self.density.iter().map(|&(_, y)| y);
        let max = bars.chain(curve).fold(0.0_f64, f64::max);
        if max > 0.0 {
            max
        } else {
            1.0
        }
    }

    /// Render to an image file. `.svg` paths produce SVG; anything else is
    /// rasterized (PNG for `.png`).
    pub fn render_to_file(&self, path: impl AsRef<Path>) -> Result<(), PlotError> {
        let path = path.as_ref();
        render::to_file(self, path)?;
        tracing::info!("Plot saved to {}.", path.display());
        Ok(())
    }
}

/// Equal-width bins over `[min, max]`; the last bin is closed on the right.
///
/// A zero-width range is widened to `[v - 0.5, v + 0.5]`.
fn histogram(values: &[f64], bins: usize) -> Vec<Bin> {
    let (mut lo, mut hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / bins as f64;
    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    let n = values.len() as f64;
    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            let lower = lo + width * i as f64;
            let upper = if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 };
            Bin {
                lower,
                upper,
                count,
                density: count as f64 / (n * width),
            }
        })
        .collect()
}
