//! Histogram peak detection.
//!
//! Finds contiguous above-threshold runs in a sequence of bin counts using
//! a variation of the "peaks" measurement implemented by LeCroy digital
//! oscilloscopes: the peak threshold is derived from the statistics of the
//! populated bins, with extreme outlier bins excluded from the spread
//! estimate so they cannot inflate it.
//!
//! The method assumes roughly normally distributed peaks, i.e. some noise in
//! the underlying data. For synthetic noise-free data the caller should build
//! the bin sequence from a KDE instead of a raw histogram (see
//! [`crate::levels::find_bot_top_hist_peaks`]).

use log::debug;
use serde::{Deserialize, Serialize};

use crate::stats::OnlineStats;

/// A contiguous above-threshold run of histogram bins.
///
/// `start` is the first bin at or above the peak threshold; `end` is the bin
/// where the run was closed.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Peak {
    pub start: usize,
    pub end: usize,
}

/// Find all peaks in a histogram.
///
/// `hist` holds the bin counts (raw counts or scaled KDE values). Returns
/// the detected peaks in bin order, after merging peaks separated by less
/// than 1% of the bin count and suppressing peaks within 2%.
#[must_use]
pub fn find_hist_peaks(hist: &[f64]) -> Vec<Peak> {
    if hist.is_empty() {
        return Vec::new();
    }

    // Mean of all populated bins.
    let mut os = OnlineStats::new();
    for &b in hist {
        if b > 0.0 {
            os.accumulate(b);
        }
    }
    let pop_mean = os.mean();

    let t1 = pop_mean + 2.0 * pop_mean.sqrt();

    // Std. dev. of the populated bins below t1. Bins above t1 are extreme
    // outliers that would otherwise skew the spread estimate.
    os.reset();
    for &b in hist {
        if b > 0.0 && b < t1 {
            os.accumulate(b);
        }
    }

    // t2 classifies a bin as part of a peak.
    let t2 = pop_mean + 1.5 * os.std(1);
    debug!("peak thresholds: pop_mean={pop_mean:.4} t1={t1:.4} t2={t2:.4}");

    let mut peaks: Vec<Peak> = Vec::new();
    let mut peak_start: Option<usize> = None;
    let mut in_peak = false;

    for (i, &b) in hist.iter().enumerate() {
        if !in_peak {
            if b >= t2 {
                peak_start = Some(i);
                in_peak = true;
            }
        } else if b < t2 {
            if let Some(start) = peak_start {
                peaks.push(Peak { start, end: i });
            }
            in_peak = false;
        }
    }

    // A peak opened on the final bin never closes; record it as a
    // single-bin peak.
    if peak_start == Some(hist.len() - 1) {
        let last = hist.len() - 1;
        peaks.push(Peak { start: last, end: last });
    }

    filter_peaks(peaks, hist.len())
}

/// Merge peaks separated by tiny gaps and suppress peaks that are close to a
/// neighbor but not close enough to merge; those are noise.
fn filter_peaks(mut peaks: Vec<Peak>, bins: usize) -> Vec<Peak> {
    let merge_gap = bins as f64 / 100.0;
    let suppress_gap = bins as f64 / 50.0;

    let mut prev_end = 0usize;
    let mut merged = vec![false; peaks.len()];
    let mut suppressed = vec![false; peaks.len()];

    for i in 0..peaks.len() {
        let Peak { start, end } = peaks[i];

        let gap = if i == 0 {
            // Large enough that the first peak is always preserved.
            2.0 * suppress_gap
        } else {
            start as f64 - prev_end as f64
        };

        if gap < merge_gap {
            // Merge this peak into the previous one.
            peaks[i].start = peaks[i - 1].start;
            merged[i - 1] = true;
        }

        if gap >= merge_gap && gap < suppress_gap {
            suppressed[i] = true;
        }

        prev_end = end;
    }

    peaks
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !merged[*i] && !suppressed[*i])
        .map(|(_, p)| p)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 200 bins with a low baseline so thresholds are deterministic, plus
    /// tall bins at the given indices.
    fn hist_with_spikes(spikes: &[usize]) -> Vec<f64> {
        let mut hist = vec![1.0; 200];
        for &s in spikes {
            hist[s] = 50.0;
        }
        hist
    }

    #[test]
    fn test_two_isolated_peaks() {
        let hist = hist_with_spikes(&[20, 100]);
        let peaks = find_hist_peaks(&hist);
        assert_eq!(
            peaks,
            vec![Peak { start: 20, end: 21 }, Peak { start: 100, end: 101 }]
        );
    }

    #[test]
    fn test_close_peaks_merge() {
        // Gap of 1 bin (< 200/100) between the runs: merged into one peak.
        let hist = hist_with_spikes(&[20, 22]);
        let peaks = find_hist_peaks(&hist);
        assert_eq!(peaks, vec![Peak { start: 20, end: 23 }]);
    }

    #[test]
    fn test_nearby_peak_suppressed() {
        // Gap of 3 bins: too far to merge, too close to be significant.
        let hist = hist_with_spikes(&[20, 24]);
        let peaks = find_hist_peaks(&hist);
        assert_eq!(peaks, vec![Peak { start: 20, end: 21 }]);
    }

    #[test]
    fn test_peak_on_final_bin() {
        let hist = hist_with_spikes(&[20, 199]);
        let peaks = find_hist_peaks(&hist);
        assert_eq!(
            peaks,
            vec![Peak { start: 20, end: 21 }, Peak { start: 199, end: 199 }]
        );
    }

    #[test]
    fn test_flat_histogram_has_no_peaks() {
        assert!(find_hist_peaks(&vec![1.0; 100]).is_empty());
        assert!(find_hist_peaks(&vec![0.0; 100]).is_empty());
        assert!(find_hist_peaks(&[]).is_empty());
    }

    #[test]
    fn test_gaussian_clusters() {
        // Two well separated noisy clusters over 50 bins.
        let mut rng = fastrand::Rng::with_seed(7);
        let mut hist = vec![0.0; 50];
        for _ in 0..10_000 {
            let lo = (5.0 + 2.0 * gauss(&mut rng)).clamp(0.0, 49.0) as usize;
            let hi = (40.0 + 2.0 * gauss(&mut rng)).clamp(0.0, 49.0) as usize;
            hist[lo] += 1.0;
            hist[hi] += 1.0;
        }

        let peaks = find_hist_peaks(&hist);
        assert_eq!(peaks.len(), 2);
        assert!(peaks[0].start <= 5 && peaks[0].end >= 5);
        assert!(peaks[1].start <= 40 && peaks[1].end >= 40);
    }

    fn gauss(rng: &mut fastrand::Rng) -> f64 {
        // Box-Muller transform.
        let u1 = rng.f64().max(f64::MIN_POSITIVE);
        let u2 = rng.f64();
        (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
    }
}
