use snafu::Snafu;

pub use crate::errors::Error::*;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Runtime error: Are you sure your code runs inside #[orrery::runtime]?
    RuntimeError,
    /// Configuration error: {source}.
    ConfigurationError { source: ConfigurationError },
    /// Invariant violation: {source}.
    InvariantViolation { source: InvariantViolation },
    /// Unknown error: {info}.
    Unknown { info: String },
}

impl From<ConfigurationError> for Error {
    fn from(value: ConfigurationError) -> Self {
        Self::ConfigurationError { source: value }
    }
}

impl From<InvariantViolation> for Error {
    fn from(value: InvariantViolation) -> Self {
        Self::InvariantViolation { source: value }
    }
}

/// Construction-time validation failures: reported when an animation is built,
/// never propagated as a non-finite interpolation rate.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConfigurationError {
    /// Animation duration must be a strictly positive number of milliseconds (got {duration})
    InstantaneousAnimation { duration: f64 },
    /// Animation bound '{bound}' is not a finite number
    NonFiniteBound { bound: &'static str },
    /// Zoom and filter animations require an image node
    NotAnImageNode,
}

/// Programmer errors on the sequencing state machines: reported immediately
/// rather than silently tolerated.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum InvariantViolation {
    /// Sequence animations cannot change once prepare_to_start() has been called
    SequenceSealed,
    /// Sequence is not registered in this sequencer
    UnknownSequence,
}
