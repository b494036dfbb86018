//! Error taxonomy for the decode core.
//!
//! Genuine faults are surfaced through [`DecodeError`]. "No clear signal"
//! outcomes (too few histogram peaks, no spectral peak) are *not* errors;
//! they are reported in-band as `None` or a `0` symbol rate so callers can
//! re-run with adjusted parameters.

use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// A stream-consuming constructor was handed fewer elements than it
    /// needs to get started.
    #[error("not enough elements to initialize {what}")]
    EmptyStream { what: &'static str },

    /// A KDE bandwidth cannot be fitted to a sample set without variation.
    #[error("cannot construct KDE for histogram approximation: no sample variation present")]
    NoVariance,

    /// No usable inter-edge spans remain for the harmonic product spectrum.
    #[error("insufficient spans in edge set")]
    InsufficientSpans,

    /// A multi-channel cursor operation named a channel that does not exist.
    #[error("invalid channel name '{0}'")]
    UnknownChannel(String),
}

pub type Result<T> = std::result::Result<T, DecodeError>;
