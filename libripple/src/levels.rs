//! Automatic logic-level estimation.
//!
//! Builds a histogram (or KDE) over a bounded sample buffer and takes the
//! two outermost peaks as the low and high logic levels. The buffered
//! variant streams samples until a statistically significant edge is seen,
//! so the analyzed buffer contains both logic states with margin on each
//! side.

use std::collections::VecDeque;

use derive_more::Display;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::kde::GaussianKde;
use crate::peaks::find_hist_peaks;
use crate::stats::OnlineStats;

/// Estimated logic levels of a digital signal, `low < high`.
#[derive(Clone, Copy, Debug, Deserialize, Display, PartialEq, Serialize)]
#[display("({low}, {high})")]
pub struct LogicLevels {
    pub low: f64,
    pub high: f64,
}

impl LogicLevels {
    /// Build levels from two estimates in either order.
    #[must_use]
    pub fn sorted(a: f64, b: f64) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }
}

/// Find the bottom and top peaks in a histogram of sample magnitudes.
///
/// These are the leftmost and rightmost of the detected peaks. For each, the
/// reported level is the center of the bin holding that peak's population
/// midpoint.
///
/// When `use_kde` is set the bin sequence is sampled from a Gaussian KDE
/// over the sample range expanded by 10% on each side, scaled so the values
/// are comparable to histogram counts. This is the right choice for
/// synthetic data lacking noise, where the raw histogram's peak threshold is
/// not statistically meaningful.
///
/// Returns `None` when fewer than two peaks are found; that is an
/// absence-of-signal indicator, not an error. Fails only when a KDE cannot
/// be constructed.
pub fn find_bot_top_hist_peaks(
    samples: &[f64],
    bins: usize,
    use_kde: bool,
) -> Result<Option<LogicLevels>> {
    if samples.is_empty() || bins == 0 {
        return Ok(None);
    }

    let (hist, bin_centers) = if use_kde {
        kde_histogram(samples, bins)?
    } else {
        histogram(samples, bins)
    };

    let peaks = find_hist_peaks(&hist);
    if peaks.len() < 2 {
        return Ok(None);
    }

    // Population midpoint of the leftmost and rightmost peaks.
    let mut bot_top = [0.0f64; 2];
    for (slot, p) in [peaks[0], peaks[peaks.len() - 1]].into_iter().enumerate() {
        let hslice = &hist[p.start..=p.end];
        let total: f64 = hslice.iter().sum();
        let mid_pop = (total / 2.0).floor();

        let mut cum = 0.0;
        let mut mid_ix = 0;
        for (i, &b) in hslice.iter().enumerate() {
            cum += b;
            if cum >= mid_pop {
                mid_ix = i;
                break;
            }
        }

        bot_top[slot] = bin_centers[p.start + mid_ix];
    }

    Ok(Some(LogicLevels::sorted(bot_top[0], bot_top[1])))
}

/// Fixed-width histogram over the sample range. Returns bin counts and bin
/// centers.
fn histogram(samples: &[f64], bins: usize) -> (Vec<f64>, Vec<f64>) {
    let mn = samples.iter().copied().fold(f64::INFINITY, f64::min);
    let mx = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    // A constant population still gets a non-degenerate bin range.
    let (lo, hi) = if mx > mn { (mn, mx) } else { (mn - 0.5, mx + 0.5) };
    let width = (hi - lo) / bins as f64;

    let mut counts = vec![0.0; bins];
    for &s in samples {
        let ix = (((s - lo) / width) as usize).min(bins - 1);
        counts[ix] += 1.0;
    }

    let centers = (0..bins).map(|i| lo + (i as f64 + 0.5) * width).collect();
    (counts, centers)
}

/// KDE-sampled histogram approximation over the expanded sample range.
fn kde_histogram(samples: &[f64], bins: usize) -> Result<(Vec<f64>, Vec<f64>)> {
    let kde = GaussianKde::new(samples, 0.05)?;

    let mut mnv = samples.iter().copied().fold(f64::INFINITY, f64::min);
    let mut mxv = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    // Expand the bounds by 10% to leave room for gaussian tails at the
    // extremes.
    let r = mxv - mnv;
    mnv -= r * 0.1;
    mxv += r * 0.1;

    let step = (mxv - mnv) / bins as f64;
    let centers: Vec<f64> = (0..bins).map(|i| mnv + i as f64 * step).collect();
    // Scaled for numeric parity with histogram counts.
    let hist = centers.iter().map(|&x| 1000.0 * kde.evaluate(x)).collect();

    Ok((hist, centers))
}

/// Automatically determine the logic levels of a digital signal.
///
/// Consumes up to `max_samples` from `samples` while maintaining a bounded
/// ring buffer of `buf_size` values and running statistics. A sample more
/// than 3 standard deviations from the running mean is taken as the first
/// edge event; buffering then continues until the edge sits near the middle
/// of the buffer, so both logic levels are represented.
///
/// Returns `None` when the input ends before any edge is seen, or when the
/// buffered samples do not produce two histogram peaks.
pub fn find_logic_levels<I>(
    samples: I,
    max_samples: usize,
    buf_size: usize,
) -> Result<Option<LogicLevels>>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let mut samples = samples.into_iter();
    let mut buf: VecDeque<f64> = VecDeque::with_capacity(buf_size);
    let mut os = OnlineStats::new();

    let mut found_edge = false;
    let mut buf_remaining = 0usize;
    let mut consumed = 0usize;

    while consumed < max_samples {
        let Some((_time, value)) = samples.next() else {
            break;
        };
        if buf.len() == buf_size {
            buf.pop_front();
        }
        buf.push_back(value);
        consumed += 1;

        if !found_edge {
            os.accumulate(value);
            if os.count() > 3 && (value - os.mean()).abs() > 3.0 * os.std(0) {
                // More than 3 std. devs. from the mean: likely an edge event.
                found_edge = true;
                buf_remaining = if buf.len() < buf_size / 2 {
                    buf_size - buf.len()
                } else {
                    buf_size / 2
                };
            }
        } else {
            // Keep filling until the edge is centered or the buffer is full.
            buf_remaining = buf_remaining.saturating_sub(1);
            if buf_remaining == 0 && buf.len() >= buf_size {
                break;
            }
        }
    }

    // No edge in the buffered data: abort the histogram analysis.
    if !found_edge {
        return Ok(None);
    }

    debug!("logic level search: analyzing {} buffered samples", buf.len());
    let buf: Vec<f64> = buf.into();
    find_bot_top_hist_peaks(&buf, 100, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;

    fn gauss(rng: &mut fastrand::Rng) -> f64 {
        let u1 = rng.f64().max(f64::MIN_POSITIVE);
        let u2 = rng.f64();
        (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
    }

    #[test]
    fn test_bot_top_from_noisy_clusters() {
        let mut rng = fastrand::Rng::with_seed(42);
        let mut samples = Vec::with_capacity(2000);
        for _ in 0..1000 {
            samples.push(0.03 * gauss(&mut rng));
            samples.push(1.0 + 0.03 * gauss(&mut rng));
        }

        let bins = 50;
        let levels = find_bot_top_hist_peaks(&samples, bins, false)
            .unwrap()
            .expect("two peaks expected");

        let mn = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let mx = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let bin_width = (mx - mn) / bins as f64;
        assert!(levels.low.abs() < bin_width, "low level {levels}");
        assert!((levels.high - 1.0).abs() < bin_width, "high level {levels}");
    }

    #[test]
    fn test_constant_samples_kde_error() {
        let flat = vec![1.0; 50];
        assert_eq!(
            find_bot_top_hist_peaks(&flat, 100, true).unwrap_err(),
            DecodeError::NoVariance
        );
    }

    #[test]
    fn test_single_cluster_is_no_result() {
        let mut rng = fastrand::Rng::with_seed(3);
        let samples: Vec<f64> = (0..5000).map(|_| 2.0 + 0.01 * gauss(&mut rng)).collect();
        assert_eq!(find_bot_top_hist_peaks(&samples, 50, false).unwrap(), None);
    }

    /// Clean square wave alternating 0.0/3.3 every 100 samples.
    fn square_wave(len: usize) -> impl Iterator<Item = (f64, f64)> {
        (0..len).map(|i| {
            let value = if (i / 100) % 2 == 0 { 0.0 } else { 3.3 };
            (i as f64 * 1e-6, value)
        })
    }

    #[test]
    fn test_find_logic_levels_square_wave() {
        let levels = find_logic_levels(square_wave(4000), 5000, 2000)
            .unwrap()
            .expect("levels expected");
        assert!(levels.low.abs() < 0.1, "levels {levels}");
        assert!((levels.high - 3.3).abs() < 0.1, "levels {levels}");
    }

    #[test]
    fn test_find_logic_levels_no_edge() {
        // Constant input never triggers the edge detector: no result, not an
        // error.
        let flat = (0..1000).map(|i| (i as f64, 1.5));
        assert_eq!(find_logic_levels(flat, 5000, 2000).unwrap(), None);
    }

    #[test]
    fn test_find_logic_levels_respects_max_samples() {
        // The only edge lies beyond max_samples.
        let late_edge = (0..10_000).map(|i| {
            let value = if i < 6000 { 0.0 } else { 3.3 };
            (i as f64, value)
        });
        assert_eq!(find_logic_levels(late_edge, 5000, 2000).unwrap(), None);
    }
}
