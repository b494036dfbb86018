//! Running mean/variance accumulator (Welford's recurrence).

/// Online mean and variance over a stream of samples.
///
/// Used by the peak detector to derive its thresholds and by the buffered
/// level finder to spot the first statistically significant edge. The
/// recurrence is numerically stable for long streams; no sample history is
/// kept.
#[derive(Clone, Copy, Debug, Default)]
pub struct OnlineStats {
    count: u64,
    mean: f64,
    m2: f64,
}

impl OnlineStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accumulate(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    #[must_use]
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Variance with `ddof` delta degrees of freedom (0 = population,
    /// 1 = Bessel-corrected sample variance). Returns 0.0 while fewer than
    /// `ddof + 1` samples have been accumulated.
    #[must_use]
    pub fn variance(&self, ddof: u64) -> f64 {
        if self.count <= ddof {
            0.0
        } else {
            self.m2 / (self.count - ddof) as f64
        }
    }

    #[must_use]
    pub fn std(&self, ddof: u64) -> f64 {
        self.variance(ddof).sqrt()
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_std() {
        let mut os = OnlineStats::new();
        for v in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            os.accumulate(v);
        }

        assert_eq!(os.count(), 8);
        assert!((os.mean() - 5.0).abs() < 1e-12);
        // Population std of this classic data set is exactly 2.
        assert!((os.std(0) - 2.0).abs() < 1e-12);
        // Bessel-corrected variance is 32/7.
        assert!((os.variance(1) - 32.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_too_few_samples() {
        let mut os = OnlineStats::new();
        assert_eq!(os.std(0), 0.0);
        os.accumulate(3.0);
        assert_eq!(os.variance(1), 0.0);
        assert_eq!(os.mean(), 3.0);
    }

    #[test]
    fn test_reset() {
        let mut os = OnlineStats::new();
        os.accumulate(1.0);
        os.accumulate(2.0);
        os.reset();
        assert_eq!(os.count(), 0);
        assert_eq!(os.mean(), 0.0);
        assert_eq!(os.std(0), 0.0);
    }
}
