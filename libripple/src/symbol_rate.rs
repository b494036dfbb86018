//! Blind symbol-rate recovery.
//!
//! Estimates the fundamental symbol period of an edge stream from the
//! distribution of inter-edge time spans. A harmonic product spectrum (HPS)
//! over a KDE of the spans reinforces the fundamental period while
//! suppressing its harmonics: multi-symbol runs produce spans at integer
//! multiples of the symbol period, and multiplying the spectrum by copies of
//! itself evaluated at those multiples concentrates the product at the
//! fundamental.
//!
//! This will not work on an edge set with a single distinct span (a bare
//! clock) unless `spectra` is 1, which effectively disables the HPS.

use itertools::Itertools;
use log::debug;

use crate::edges::Edge;
use crate::error::{DecodeError, Result};
use crate::kde::GaussianKde;
use crate::peaks::find_hist_peaks;

/// Number of points in the span spectrum grid.
const HPS_BINS: usize = 1000;

/// Wide KDE bandwidth used to smear small peaks together when hunting for
/// the span limit.
const AUTO_LIMIT_BW: f64 = 0.8;

/// Narrow KDE bandwidth for the spectrum itself.
const SPECTRUM_BW: f64 = 0.02;

/// Determine the base symbol rate from a set of edges.
///
/// `edges` must be the complete, finite edge sequence; every span between
/// successive edges feeds the spectrum. `sample_rate` converts the dominant
/// span into a rate: leave it at 1.0 when edge times are absolute, or pass
/// the capture's sample rate when they are sample indices.
///
/// With `auto_span_limit`, unusually long spans (idle periods that would
/// dilute the spectrum's resolution) are discarded by limiting spans to
/// twice the width of the first peak of a heavily smoothed span KDE.
/// `max_span_limit` is a manual override, effective only when the automatic
/// limit is disabled.
///
/// Returns the estimated symbol rate, or `0` when no spectral peak is found
/// or the dominant span is zero; both mean "undetermined", not failure.
/// Fails when no usable spans remain or the spans carry no variation.
pub fn find_symbol_rate(
    edges: &[Edge],
    sample_rate: f64,
    spectra: usize,
    auto_span_limit: bool,
    max_span_limit: Option<f64>,
) -> Result<u64> {
    // Time spans between successive edges.
    let mut spans: Vec<f64> = edges
        .iter()
        .map(|e| e.time)
        .tuple_windows()
        .map(|(a, b)| b - a)
        .collect();
    if spans.is_empty() {
        return Err(DecodeError::InsufficientSpans);
    }

    let mut max_span_limit = max_span_limit;
    if auto_span_limit {
        let (grid, _) = span_grid(&spans);
        let kde = GaussianKde::new(&spans, AUTO_LIMIT_BW)?;
        let smeared = kde.evaluate_grid(&grid);

        // Limit to 2x the right edge of the first peak; everything beyond
        // is idle time.
        if let Some(first) = find_hist_peaks(&smeared).first() {
            let limit = grid[first.end] * 2.0;
            debug!("automatic span limit: {limit:.6}");
            max_span_limit = Some(limit);
        }
    }

    if let Some(limit) = max_span_limit {
        spans.retain(|&s| s < limit);
    }
    if spans.is_empty() {
        return Err(DecodeError::InsufficientSpans);
    }

    let (grid, _) = span_grid(&spans);
    let kde = GaussianKde::new(&spans, SPECTRUM_BW)?;

    // Fundamental spectrum, then the product with downscaled copies.
    let mut hps = kde.evaluate_grid(&grid);
    for harmonic in 2..=spectra {
        for (x, h) in grid.iter().zip(hps.iter_mut()) {
            *h *= kde.evaluate(x * harmonic as f64);
        }
    }

    let peaks = find_hist_peaks(&hps);
    let Some(first) = peaks.first() else {
        debug!("no peak in harmonic product spectrum");
        return Ok(0);
    };

    // The leftmost peak is the fundamental; within it take the strongest
    // bin. This is approximately one symbol period.
    let mut peak_ix = first.start;
    for i in first.start..=first.end.min(hps.len() - 1) {
        if hps[i] > hps[peak_ix] {
            peak_ix = i;
        }
    }
    let peak_span = grid[peak_ix];
    debug!("fundamental span: {peak_span:.6}");

    if peak_span != 0.0 {
        Ok((sample_rate / peak_span) as u64)
    } else {
        Ok(0)
    }
}

/// Evaluation grid covering `[0, 1.1 * max_span)`, leaving room for the
/// rightmost peak of the KDE.
fn span_grid(spans: &[f64]) -> (Vec<f64>, f64) {
    let mv = spans.iter().copied().fold(f64::NEG_INFINITY, f64::max) * 1.1;
    let step = mv / HPS_BINS as f64;
    let grid = (0..HPS_BINS).map(|i| i as f64 * step).collect();
    (grid, step)
}
