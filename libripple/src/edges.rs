//! Hysteresis-based edge extraction.
//!
//! Converts a continuous sample stream into a lazy stream of discrete logic
//! transitions. Samples are classified into zones separated by hysteresis
//! boundaries; a new stable state is only recognized once the transition
//! band has been exited on the opposite side, which suppresses chatter from
//! in-band noise.
//!
//! The first element of every edge stream is the *initial state* of the
//! waveform, judged by the plain midpoint threshold(s) without hysteresis.
//! All subsequent elements are genuine transitions.

use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, Result};
use crate::levels::LogicLevels;

/// A timestamped logic-level transition.
///
/// `state` is 0/1 for single-ended streams and -1/0/1 for differential
/// streams.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct Edge {
    pub time: f64,
    pub state: i8,
}

impl Edge {
    #[must_use]
    pub fn new(time: f64, state: i8) -> Self {
        Self { time, state }
    }
}

/// Classification zone of a sample relative to the hysteresis boundaries.
trait SignalZone: Copy + PartialEq {
    fn is_stable(self) -> bool;
    /// Logic state of a stable zone. Only meaningful when `is_stable()`.
    fn logic_state(self) -> i8;
}

/// Zones of a single-ended signal: two logic states and one transition band.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum SingleZone {
    High,
    Transition,
    Low,
}

impl SignalZone for SingleZone {
    fn is_stable(self) -> bool {
        self != Self::Transition
    }

    fn logic_state(self) -> i8 {
        debug_assert!(self.is_stable());
        match self {
            Self::High => 1,
            Self::Low | Self::Transition => 0,
        }
    }
}

/// Zones of a differential signal: three logic states and two transition
/// bands.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum DiffZone {
    DiffPlus,
    HighTransition,
    DiffZero,
    LowTransition,
    DiffMinus,
}

impl SignalZone for DiffZone {
    fn is_stable(self) -> bool {
        matches!(self, Self::DiffPlus | Self::DiffZero | Self::DiffMinus)
    }

    fn logic_state(self) -> i8 {
        debug_assert!(self.is_stable());
        match self {
            Self::DiffPlus => 1,
            Self::DiffMinus => -1,
            _ => 0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum MachineState<Z> {
    /// No stable zone seen yet.
    Start,
    Stable(Z),
    /// Inside a transition band. `last_stable` is the stable zone that was
    /// left to enter the band; `None` can only occur if the stream opened
    /// inside a band, in which case the first stable arrival always emits.
    Transition { last_stable: Option<Z> },
}

/// Shared hysteresis state machine for both extractors.
///
/// `step` is the whole transition relation: feed it the zone of the next
/// sample and it returns the logic state to emit, if any.
#[derive(Clone, Copy, Debug)]
struct ZoneMachine<Z: SignalZone> {
    state: MachineState<Z>,
}

impl<Z: SignalZone> ZoneMachine<Z> {
    fn new() -> Self {
        Self {
            state: MachineState::Start,
        }
    }

    fn step(&mut self, zone: Z) -> Option<i8> {
        match self.state {
            MachineState::Start => {
                // Stay in start until the first stable zone; adopting it
                // seeds the current state without emitting.
                if zone.is_stable() {
                    self.state = MachineState::Stable(zone);
                }
                None
            }
            MachineState::Stable(current) => {
                if zone.is_stable() {
                    if zone != current {
                        self.state = MachineState::Stable(zone);
                        return Some(zone.logic_state());
                    }
                    None
                } else {
                    self.state = MachineState::Transition {
                        last_stable: Some(current),
                    };
                    None
                }
            }
            MachineState::Transition { last_stable } => {
                if zone.is_stable() {
                    self.state = MachineState::Stable(zone);
                    // Re-entering the zone we left is in-band noise; only a
                    // genuine level change emits.
                    if last_stable != Some(zone) {
                        return Some(zone.logic_state());
                    }
                }
                None
            }
        }
    }
}

/// Lazy single-ended edge stream, created by [`find_edges`].
pub struct Edges<I> {
    samples: I,
    hyst_top: f64,
    hyst_bot: f64,
    machine: ZoneMachine<SingleZone>,
    initial: Option<Edge>,
}

/// Find the edges in a sampled digital waveform.
///
/// `logic` gives the mean low/high levels; `hysteresis` (0.0..=1.0) is the
/// fraction of the logic span covered by the transition band straddling the
/// midpoint threshold.
///
/// The returned iterator yields the initial state first, then one [`Edge`]
/// per detected transition. Fails if the sample stream is empty.
pub fn find_edges<I>(samples: I, logic: LogicLevels, hysteresis: f64) -> Result<Edges<I::IntoIter>>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let mut samples = samples.into_iter();
    let span = logic.high - logic.low;
    let threshold = (logic.high + logic.low) / 2.0;

    let (start_time, first) = samples
        .next()
        .ok_or(DecodeError::EmptyStream { what: "sample stream" })?;

    Ok(Edges {
        samples,
        hyst_top: span * (0.5 + hysteresis / 2.0) + logic.low,
        hyst_bot: span * (0.5 - hysteresis / 2.0) + logic.low,
        machine: ZoneMachine::new(),
        initial: Some(Edge::new(start_time, i8::from(first > threshold))),
    })
}

impl<I> Iterator for Edges<I>
where
    I: Iterator<Item = (f64, f64)>,
{
    type Item = Edge;

    fn next(&mut self) -> Option<Edge> {
        if let Some(initial) = self.initial.take() {
            return Some(initial);
        }

        for (time, value) in self.samples.by_ref() {
            let zone = if value > self.hyst_top {
                SingleZone::High
            } else if value > self.hyst_bot {
                SingleZone::Transition
            } else {
                SingleZone::Low
            };
            if let Some(state) = self.machine.step(zone) {
                return Some(Edge::new(time, state));
            }
        }
        None
    }
}

/// Lazy differential edge stream, created by [`find_differential_edges`].
pub struct DifferentialEdges<I> {
    samples: I,
    hyst_high_top: f64,
    hyst_high_bot: f64,
    hyst_low_top: f64,
    hyst_low_bot: f64,
    machine: ZoneMachine<DiffZone>,
    initial: Option<Edge>,
}

/// Find the edges in a sampled differential digital waveform.
///
/// `logic` gives the mean levels for the -1 and +1 states; the 0 state is
/// assumed midway between them. The two hysteresis bands straddle the
/// high/0 and 0/low thresholds, each sized from its own half-span.
///
/// The output cannot be used directly: transitions between -1 and +1 are
/// indistinguishable from transitions passing briefly through 0. Remove
/// short 0 periods with [`crate::glitch::remove_short_diff_0s`] first.
///
/// Fails if the sample stream is empty.
pub fn find_differential_edges<I>(
    samples: I,
    logic: LogicLevels,
    hysteresis: f64,
) -> Result<DifferentialEdges<I::IntoIter>>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let mut samples = samples.into_iter();
    let center = (logic.high + logic.low) / 2.0;
    let span_high = logic.high - center;
    let span_low = center - logic.low;
    let thresh_high = (logic.high + center) / 2.0;
    let thresh_low = (center + logic.low) / 2.0;

    let (start_time, first) = samples
        .next()
        .ok_or(DecodeError::EmptyStream { what: "sample stream" })?;

    let initial_state = if first > thresh_high {
        1
    } else if first > thresh_low {
        0
    } else {
        -1
    };

    Ok(DifferentialEdges {
        samples,
        hyst_high_top: span_high * (0.5 + hysteresis / 2.0) + center,
        hyst_high_bot: span_high * (0.5 - hysteresis / 2.0) + center,
        hyst_low_top: span_low * (0.5 + hysteresis / 2.0) + logic.low,
        hyst_low_bot: span_low * (0.5 - hysteresis / 2.0) + logic.low,
        machine: ZoneMachine::new(),
        initial: Some(Edge::new(start_time, initial_state)),
    })
}

impl<I> Iterator for DifferentialEdges<I>
where
    I: Iterator<Item = (f64, f64)>,
{
    type Item = Edge;

    fn next(&mut self) -> Option<Edge> {
        if let Some(initial) = self.initial.take() {
            return Some(initial);
        }

        for (time, value) in self.samples.by_ref() {
            let zone = if value > self.hyst_high_top {
                DiffZone::DiffPlus
            } else if value > self.hyst_high_bot {
                DiffZone::HighTransition
            } else if value > self.hyst_low_top {
                DiffZone::DiffZero
            } else if value > self.hyst_low_bot {
                DiffZone::LowTransition
            } else {
                DiffZone::DiffMinus
            };
            if let Some(state) = self.machine.step(zone) {
                return Some(Edge::new(time, state));
            }
        }
        None
    }
}
