//! Gaussian kernel density estimation.
//!
//! A KDE gives a smooth, continuous approximation of a sample population's
//! distribution. It stands in for a discrete histogram when the data lacks
//! natural noise (synthetic waveforms) or when the histogram would be too
//! coarse, as in symbol-rate estimation.

use crate::error::{DecodeError, Result};

/// Gaussian KDE with a scalar bandwidth factor.
///
/// The kernel bandwidth is `bw_factor` times the Bessel-corrected standard
/// deviation of the sample set, so the factor directly controls how much
/// smoothing is applied relative to the data spread.
#[derive(Clone, Debug)]
pub struct GaussianKde {
    samples: Vec<f64>,
    bandwidth: f64,
    norm: f64,
}

impl GaussianKde {
    /// Fit a KDE to `samples`.
    ///
    /// Fails with [`DecodeError::NoVariance`] if the sample set has fewer
    /// than two elements or zero variance; no bandwidth can be fitted to a
    /// constant population.
    pub fn new(samples: &[f64], bw_factor: f64) -> Result<Self> {
        let n = samples.len();
        if n < 2 {
            return Err(DecodeError::NoVariance);
        }

        let mean = samples.iter().sum::<f64>() / n as f64;
        let var = samples
            .iter()
            .map(|s| {
                let d = s - mean;
                d * d
            })
            .sum::<f64>()
            / (n - 1) as f64;
        if var <= 0.0 {
            return Err(DecodeError::NoVariance);
        }

        let bandwidth = bw_factor * var.sqrt();
        let norm = 1.0 / (n as f64 * bandwidth * (2.0 * std::f64::consts::PI).sqrt());

        Ok(Self {
            samples: samples.to_vec(),
            bandwidth,
            norm,
        })
    }

    /// Density estimate at `x`.
    #[must_use]
    pub fn evaluate(&self, x: f64) -> f64 {
        let h = self.bandwidth;
        self.norm
            * self
                .samples
                .iter()
                .map(|s| {
                    let z = (x - s) / h;
                    (-0.5 * z * z).exp()
                })
                .sum::<f64>()
    }

    /// Density estimate at every point of `grid`.
    #[must_use]
    pub fn evaluate_grid(&self, grid: &[f64]) -> Vec<f64> {
        grid.iter().map(|&x| self.evaluate(x)).collect()
    }

    #[must_use]
    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_samples_fail() {
        assert_eq!(
            GaussianKde::new(&[1.0; 20], 0.05).unwrap_err(),
            DecodeError::NoVariance
        );
        assert_eq!(
            GaussianKde::new(&[3.0], 0.05).unwrap_err(),
            DecodeError::NoVariance
        );
        assert_eq!(GaussianKde::new(&[], 0.05).unwrap_err(), DecodeError::NoVariance);
    }

    #[test]
    fn test_density_integrates_to_one() {
        let samples = [0.0, 0.5, 1.0, 1.5, 2.0, 2.5];
        let kde = GaussianKde::new(&samples, 0.5).unwrap();

        let step = 0.01;
        let mut integral = 0.0;
        let mut x = -10.0;
        while x < 12.0 {
            integral += kde.evaluate(x) * step;
            x += step;
        }
        assert!((integral - 1.0).abs() < 1e-3, "integral was {integral}");
    }

    #[test]
    fn test_density_peaks_at_cluster() {
        let samples = [1.0, 1.01, 0.99, 1.0, 5.0];
        let kde = GaussianKde::new(&samples, 0.1).unwrap();

        assert!(kde.evaluate(1.0) > kde.evaluate(5.0));
        assert!(kde.evaluate(5.0) > kde.evaluate(3.0));
    }

    #[test]
    fn test_grid_matches_pointwise() {
        let samples = [0.0, 1.0, 2.0];
        let kde = GaussianKde::new(&samples, 0.3).unwrap();
        let grid = [0.0, 0.5, 1.0];
        let values = kde.evaluate_grid(&grid);
        for (x, v) in grid.iter().zip(&values) {
            assert_eq!(kde.evaluate(*x), *v);
        }
    }
}
