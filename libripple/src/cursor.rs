//! Time-indexed traversal of edge streams.
//!
//! An [`EdgeSequence`] is a forward-only cursor over one edge stream: it
//! answers "what is the logic state at time T" and "how far until the next
//! state change" while lazily pulling edges from the underlying stream. A
//! [`MultiEdgeSequence`] walks a group of channels in lock-step, keeping
//! every channel at the same current time. Protocol decoders drive their
//! framing logic with these.
//!
//! A cursor takes exclusive ownership of its stream; the stream is consumed
//! once and never restarted.

use indexmap::IndexMap;

use crate::edges::Edge;
use crate::error::{DecodeError, Result};

/// Edge stream type accepted by the multi-channel cursor, where channels of
/// differing origin must coexist.
pub type BoxedEdges = Box<dyn Iterator<Item = Edge>>;

/// Cursor over a single edge stream, advancing in arbitrary time steps.
pub struct EdgeSequence<I: Iterator<Item = Edge>> {
    edges: I,
    time_step: f64,
    cur: Edge,
    next: Edge,
    cur_time: f64,
    ended: bool,
}

impl<I: Iterator<Item = Edge>> EdgeSequence<I> {
    /// Create a cursor positioned at the stream's first edge.
    ///
    /// The first two elements are consumed eagerly; fails if fewer are
    /// available. `time_step` is the default step for [`advance`]. When
    /// `start_time` is given and lies ahead of the first edge, the cursor
    /// fast-forwards to it.
    ///
    /// [`advance`]: EdgeSequence::advance
    pub fn new(edges: I, time_step: f64, start_time: Option<f64>) -> Result<Self> {
        let mut edges = edges;
        let cur = edges
            .next()
            .ok_or(DecodeError::EmptyStream { what: "edge sequence" })?;
        let next = edges
            .next()
            .ok_or(DecodeError::EmptyStream { what: "edge sequence" })?;

        let mut seq = Self {
            edges,
            time_step,
            cur_time: cur.time,
            cur,
            next,
            ended: false,
        };

        if let Some(start_time) = start_time {
            let init_step = start_time - seq.cur_time;
            if init_step > 0.0 {
                seq.advance_by(init_step);
            }
        }

        Ok(seq)
    }

    /// Move forward by the default time step.
    pub fn advance(&mut self) {
        self.advance_by(self.time_step);
    }

    /// Move forward through the edges by `time_step`.
    pub fn advance_by(&mut self, time_step: f64) {
        self.cur_time += time_step;
        while self.cur_time > self.next.time {
            self.cur = self.next;
            match self.edges.next() {
                Some(edge) => self.next = edge,
                None => {
                    self.ended = true;
                    break;
                }
            }
        }
    }

    /// Advance to the next state change after the current time.
    ///
    /// Returns the amount of time advanced, which is 0.0 once the sequence
    /// has ended. If the stream runs out without a further state change the
    /// cursor is marked ended and the return value reflects the movement up
    /// to the last available edge.
    pub fn advance_to_edge(&mut self) -> f64 {
        if self.ended {
            return 0.0;
        }

        let mut time_step = 0.0;
        let start_state = self.cur.state;

        while self.cur.state == start_state {
            time_step += self.next.time - self.cur_time;
            self.cur_time = self.next.time;
            self.cur = self.next;

            match self.edges.next() {
                Some(edge) => self.next = edge,
                None => {
                    // End of sequence only if the state never changed (no
                    // final edge remains to report).
                    if self.cur.state == start_state {
                        self.ended = true;
                    }
                    break;
                }
            }
        }

        time_step
    }

    /// Logic state at the current time.
    #[must_use]
    pub fn current_state(&self) -> i8 {
        self.cur.state
    }

    #[must_use]
    pub fn current_time(&self) -> f64 {
        self.cur_time
    }

    /// True once the underlying stream has terminated.
    #[must_use]
    pub fn at_end(&self) -> bool {
        self.ended
    }

    /// Time of the upcoming edge, used for nearest-edge selection across
    /// channels.
    fn next_edge_time(&self) -> f64 {
        self.next.time
    }
}

/// Cursor over a group of named edge streams walked in lock-step.
///
/// All channel cursors share the same step and start time, and every
/// advance operation leaves them at identical current times.
pub struct MultiEdgeSequence {
    channels: IndexMap<String, EdgeSequence<BoxedEdges>>,
}

impl MultiEdgeSequence {
    /// Build cursors for every `(name, stream)` pair. Channel order is the
    /// given order; names must be unique. Fails if any stream holds fewer
    /// than two edges.
    pub fn new(
        edge_sets: Vec<(String, BoxedEdges)>,
        time_step: f64,
        start_time: Option<f64>,
    ) -> Result<Self> {
        let mut channels = IndexMap::with_capacity(edge_sets.len());
        for (name, edges) in edge_sets {
            channels.insert(name, EdgeSequence::new(edges, time_step, start_time)?);
        }
        Ok(Self { channels })
    }

    /// Move every channel forward by the default time step.
    pub fn advance(&mut self) {
        for seq in self.channels.values_mut() {
            seq.advance();
        }
    }

    /// Move every channel forward by `time_step`.
    pub fn advance_by(&mut self, time_step: f64) {
        for seq in self.channels.values_mut() {
            seq.advance_by(time_step);
        }
    }

    /// Advance to the next edge on `channel`, or, when no channel is named,
    /// to the nearest upcoming edge across all unterminated channels. Every
    /// other channel is then advanced by the same elapsed time.
    ///
    /// Returns the elapsed time and the name of the channel containing the
    /// edge, or `(0.0, "")` when no channel remains active.
    pub fn advance_to_edge(&mut self, channel: Option<&str>) -> Result<(f64, String)> {
        let name = match channel {
            Some(name) => {
                if !self.channels.contains_key(name) {
                    return Err(DecodeError::UnknownChannel(name.to_string()));
                }
                name.to_string()
            }
            None => {
                // Nearest upcoming edge among channels that haven't ended.
                // Ties go to the earliest-inserted channel, keeping the
                // choice deterministic.
                let mut nearest: Option<(&String, f64)> = None;
                for (name, seq) in &self.channels {
                    if seq.at_end() {
                        continue;
                    }
                    let t = seq.next_edge_time();
                    if nearest.is_none_or(|(_, best)| t < best) {
                        nearest = Some((name, t));
                    }
                }
                match nearest {
                    Some((name, _)) => name.clone(),
                    None => return Ok((0.0, String::new())),
                }
            }
        };

        let seq = self
            .channels
            .get_mut(&name)
            .ok_or_else(|| DecodeError::UnknownChannel(name.clone()))?;
        let time_step = seq.advance_to_edge();

        // Bring the other channels to the same time.
        if time_step > 0.0 {
            for (other, seq) in &mut self.channels {
                if *other != name {
                    seq.advance_by(time_step);
                }
            }
        }

        Ok((time_step, name))
    }

    /// Logic state of the named channel at the current time.
    pub fn current_state(&self, channel: &str) -> Result<i8> {
        Ok(self.seq(channel)?.current_state())
    }

    /// Logic state of every channel, in channel order.
    #[must_use]
    pub fn current_states(&self) -> Vec<i8> {
        self.channels.values().map(EdgeSequence::current_state).collect()
    }

    /// Shared current time of the channel group.
    #[must_use]
    pub fn current_time(&self) -> f64 {
        self.channels
            .first()
            .map(|(_, seq)| seq.current_time())
            .unwrap_or(0.0)
    }

    /// True once the named channel's stream has terminated.
    pub fn at_end(&self, channel: &str) -> Result<bool> {
        Ok(self.seq(channel)?.at_end())
    }

    /// True once every channel has terminated.
    #[must_use]
    pub fn all_at_end(&self) -> bool {
        self.channels.values().all(EdgeSequence::at_end)
    }

    fn seq(&self, channel: &str) -> Result<&EdgeSequence<BoxedEdges>> {
        self.channels
            .get(channel)
            .ok_or_else(|| DecodeError::UnknownChannel(channel.to_string()))
    }
}
