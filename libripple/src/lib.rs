//! Shared signal-processing core for protocol decoders.
//!
//! Turns raw digitized waveform samples, as captured by an oscilloscope or
//! logic analyzer, into a time-ordered stream of discrete logic transitions,
//! together with the primitives every protocol decoder builds on:
//!
//! - automatic logic-level detection over a bounded sample buffer
//!   ([`levels::find_logic_levels`]),
//! - hysteresis-based edge extraction for single-ended and differential
//!   signals ([`edges::find_edges`], [`edges::find_differential_edges`]),
//! - glitch filtering of short differential-0 intervals
//!   ([`glitch::remove_short_diff_0s`]),
//! - blind symbol-rate recovery via a harmonic product spectrum
//!   ([`symbol_rate::find_symbol_rate`]),
//! - time-synchronized cursors over one or more edge streams
//!   ([`cursor::EdgeSequence`], [`cursor::MultiEdgeSequence`]).
//!
//! The typical pipeline is samples → [`levels::find_logic_levels`] →
//! [`edges::find_edges`] → [`cursor::EdgeSequence`], with decoders pulling
//! lazily from the cursor. This is an offline/batch engine: streams are
//! single-pass, pull-based, and owned by exactly one consumer.

#![deny(unused_crate_dependencies)]

pub mod config;
pub mod cursor;
pub mod edges;
pub mod error;
pub mod glitch;
pub mod kde;
pub mod levels;
pub mod peaks;
pub mod stats;
pub mod symbol_rate;

pub use config::RippleConfig;
pub use cursor::{BoxedEdges, EdgeSequence, MultiEdgeSequence};
pub use edges::{Edge, find_differential_edges, find_edges};
pub use error::{DecodeError, Result};
pub use glitch::remove_short_diff_0s;
pub use kde::GaussianKde;
pub use levels::{LogicLevels, find_bot_top_hist_peaks, find_logic_levels};
pub use peaks::{Peak, find_hist_peaks};
pub use stats::OnlineStats;
pub use symbol_rate::find_symbol_rate;
