//! Gaussian kernel density estimation.

use statrs::distribution::{Continuous, Normal};
use statrs::statistics::Statistics;

/// Scott's rule: `sigma * n^(-1/5)`.
pub fn scott_bandwidth(std_dev: f64, n: usize) -> f64 {
    std_dev * (n as f64).powf(-0.2)
}

#[derive(Debug, Clone)]
pub struct GaussianKde {
    samples: Vec<f64>,
    bandwidth: f64,
    kernel: Normal,
}

impl GaussianKde {
    /// Fit to `samples`. Returns `None` when fewer than two samples are given
    /// or they have no spread.
    pub fn fit(samples: &[f64]) -> Option<Self> {
        if samples.len() < 2 {
            return None;
        }
        let std_dev = samples.iter().std_dev();
        let bandwidth = scott_bandwidth(std_dev, samples.len());
        if !bandwidth.is_finite() || bandwidth <= 0.0 {
            return None;
        }
        let kernel = Normal::new(0.0, 1.0).ok()?;
        Some(Self {
            samples: samples.to_vec(),
            bandwidth,
            kernel,
        })
    }

    /// Estimated density at `x`.
    pub fn evaluate(&self, x: f64) -> f64 {
        let h = self.bandwidth;
        let sum: f64 = self
            .samples
            .iter()
            .map(|&s| self.kernel.pdf((x - s) / h))
            .sum();
        sum / (self.samples.len() as f64 * h)
    }

    /// Evaluate at `points` evenly spaced positions covering `[lo, hi]`.
    pub fn evaluate_grid(&self, lo: f64, hi: f64, points: usize) -> Vec<(f64, f64)> {
        match points {
            0 => Vec::new(),
            1 => vec![(lo, self.evaluate(lo))],
            _ => {
                let step = (hi - lo) / (points - 1) as f64;
                (0..points)
                    .map(|i| {
                        let x = if i + 1 == points { hi } else { lo + step * i as f64 };
                        (x, self.evaluate(x))
                    })
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scott_rule() {
        assert!((scott_bandwidth(1.0, 32) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn degenerate_inputs_do_not_fit() {
        assert!(GaussianKde::fit(&[]).is_none());
        assert!(GaussianKde::fit(&[1.0]).is_none());
        assert!(GaussianKde::fit(&[2.0, 2.0, 2.0]).is_none());
    }

    #[test]
    fn density_integrates_to_about_one() {
        let samples = [-1.0, -0.5, 0.0, 0.2, 0.9, 1.4];
        let kde = GaussianKde::fit(&samples).unwrap();
        let grid = kde.evaluate_grid(-10.0, 10.0, 2001);
        let step = 20.0 / 2000.0;
        let area: f64 = grid.iter().map(|&(_, y)| y * step).sum();
        assert!((area - 1.0).abs() < 1e-3, "area = {area}");
    }

    #[test]
    fn density_peaks_near_the_data() {
        let kde = GaussianKde::fit(&[0.0, 0.1, -0.1, 0.05]).unwrap();
        assert!(kde.evaluate(0.0) > kde.evaluate(3.0));
    }

    #[test]
    fn grid_endpoints() {
        let kde = GaussianKde::fit(&[0.0, 1.0]).unwrap();
        let grid = kde.evaluate_grid(0.0, 1.0, 5);
        assert_eq!(grid.len(), 5);
        assert_eq!(grid[0].0, 0.0);
        assert_eq!(grid[4].0, 1.0);
        assert!(kde.evaluate_grid(0.0, 1.0, 0).is_empty());
    }
}
