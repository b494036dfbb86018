//! Differential glitch filtering.
//!
//! A differential edge stream reports every excursion through the 0 state,
//! including the brief ones that occur while the pair slews between +1 and
//! -1. Those spurious 0 intervals have to be removed before the stream is
//! usable: a short "+1, 0, -1" run is really a single direct transition and
//! a short "+1, 0, +1" run is no transition at all.

use crate::edges::Edge;
use crate::error::{DecodeError, Result};

/// Lazy filtered edge stream, created by [`remove_short_diff_0s`].
pub struct FilterShortZeros<I> {
    edges: I,
    min_zero_time: f64,
    /// Most recently consumed input edge, not yet emitted.
    last: Edge,
    /// Start time of a pending differential 0 run.
    zero_start: Option<f64>,
    /// A merge replaced the pending edge; suppresses re-emission across
    /// cascading short runs.
    merged: bool,
    done: bool,
}

/// Filter unwanted differential 0 states out of an edge stream.
///
/// A 0 interval shorter than `min_diff_0_time` is collapsed into one
/// synthetic edge at the interval's time midpoint, carrying the level that
/// follows the interval. Runs at or above the threshold pass through
/// unmodified, and the final edge of the input is always emitted.
///
/// Fails if the edge stream is empty.
pub fn remove_short_diff_0s<I>(
    diff_edges: I,
    min_diff_0_time: f64,
) -> Result<FilterShortZeros<I::IntoIter>>
where
    I: IntoIterator<Item = Edge>,
{
    let mut edges = diff_edges.into_iter();
    let first = edges
        .next()
        .ok_or(DecodeError::EmptyStream { what: "edge stream" })?;

    Ok(FilterShortZeros {
        edges,
        min_zero_time: min_diff_0_time,
        last: first,
        zero_start: None,
        merged: false,
        done: false,
    })
}

impl<I> Iterator for FilterShortZeros<I>
where
    I: Iterator<Item = Edge>,
{
    type Item = Edge;

    fn next(&mut self) -> Option<Edge> {
        if self.done {
            return None;
        }

        loop {
            let Some(edge) = self.edges.next() else {
                self.done = true;
                return Some(self.last);
            };

            let pending = self.last;
            self.last = edge;

            if edge.state != 0 {
                self.merged = false;
            }

            let mut merged_now = None;
            if let Some(zero_start) = self.zero_start.take() {
                // The pending edge opened a differential 0 run; the run ends
                // at this edge.
                let zero_len = edge.time - zero_start;
                if zero_len < self.min_zero_time {
                    merged_now = Some(Edge::new((zero_start + edge.time) / 2.0, edge.state));
                    self.merged = true;
                } else {
                    self.merged = false;
                }
            }

            if edge.state == 0 {
                self.zero_start = Some(edge.time);
            }

            if let Some(merged) = merged_now {
                return Some(merged);
            }
            if !self.merged {
                return Some(pending);
            }
            // Pending edge swallowed by a cascading short run: keep pulling.
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_zero_collapses_to_midpoint() {
        let edges = [
            Edge::new(0.0, 1),
            Edge::new(10.0, 0),
            Edge::new(10.5, 1),
            Edge::new(20.0, -1),
        ];
        let filtered: Vec<Edge> = remove_short_diff_0s(edges, 2.0).unwrap().collect();
        // The 0 entry edge is replaced by a synthetic edge at the run's
        // midpoint carrying the post-run level; the run exit edge remains.
        assert_eq!(
            filtered,
            vec![
                Edge::new(0.0, 1),
                Edge::new(10.25, 1),
                Edge::new(10.5, 1),
                Edge::new(20.0, -1),
            ]
        );
    }

    #[test]
    fn test_short_zero_between_opposite_levels() {
        let edges = [
            Edge::new(0.0, 1),
            Edge::new(10.0, 0),
            Edge::new(10.5, -1),
            Edge::new(20.0, 1),
        ];
        let filtered: Vec<Edge> = remove_short_diff_0s(edges, 2.0).unwrap().collect();
        assert_eq!(
            filtered,
            vec![
                Edge::new(0.0, 1),
                Edge::new(10.25, -1),
                Edge::new(10.5, -1),
                Edge::new(20.0, 1),
            ]
        );
    }

    #[test]
    fn test_long_zero_preserved() {
        let edges = [Edge::new(0.0, 1), Edge::new(10.0, 0), Edge::new(15.0, 1)];
        let filtered: Vec<Edge> = remove_short_diff_0s(edges, 2.0).unwrap().collect();
        assert_eq!(
            filtered,
            vec![Edge::new(0.0, 1), Edge::new(10.0, 0), Edge::new(15.0, 1)]
        );
    }

    #[test]
    fn test_adjacent_short_runs() {
        // Two short 0 runs in close succession: each collapses to its own
        // midpoint edge and the intermediate stable edge is swallowed by the
        // merge flag.
        let edges = [
            Edge::new(0.0, 1),
            Edge::new(10.0, 0),
            Edge::new(10.5, -1),
            Edge::new(20.0, 0),
            Edge::new(20.5, 1),
        ];
        let filtered: Vec<Edge> = remove_short_diff_0s(edges, 2.0).unwrap().collect();
        assert_eq!(
            filtered,
            vec![
                Edge::new(0.0, 1),
                Edge::new(10.25, -1),
                Edge::new(20.25, 1),
                Edge::new(20.5, 1),
            ]
        );
    }

    #[test]
    fn test_single_edge_passes_through() {
        let filtered: Vec<Edge> = remove_short_diff_0s([Edge::new(5.0, 1)], 2.0)
            .unwrap()
            .collect();
        assert_eq!(filtered, vec![Edge::new(5.0, 1)]);
    }

    #[test]
    fn test_empty_stream_errors() {
        assert_eq!(
            remove_short_diff_0s(std::iter::empty::<Edge>(), 2.0)
                .map(|_| ())
                .unwrap_err(),
            DecodeError::EmptyStream { what: "edge stream" }
        );
    }
}
