//! Error taxonomy for metric construction, label validation, and registration.
//!
//! Validation errors are loud everywhere except the collector middleware's
//! own recording path, which logs and discards them so instrumentation can
//! never break the request flow it observes.

use thiserror::Error;

/// Errors raised while validating label names or resolved label sets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelError {
    /// Label name is not a valid token (`[a-zA-Z_][a-zA-Z0-9_]*`)
    #[error("invalid label name {0:?}: must match [a-zA-Z_][a-zA-Z0-9_]*")]
    InvalidName(String),

    /// Label name is reserved by this metric kind (e.g. `le` for histograms)
    #[error("label name {0:?} is reserved for this metric kind")]
    Reserved(String),

    /// Label supplied both as a preset value and at the call site
    #[error("label {0:?} is already preset and cannot be supplied again")]
    Duplicate(String),

    /// Resolved label set does not exactly match the declared schema
    #[error("labels {got:?} do not match declared labels {expected:?}")]
    Mismatch {
        /// Declared label names, sorted
        expected: Vec<String>,
        /// Label names that were actually supplied, sorted
        got: Vec<String>,
    },
}

/// Errors raised by metric construction and read/write operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricError {
    /// Metric name fails the name-token contract
    #[error("invalid metric name {0:?}: must match [a-zA-Z_:][a-zA-Z0-9_:]*")]
    InvalidName(String),

    /// Docstring is missing or empty
    #[error("metric docstring must not be empty")]
    InvalidDocstring,

    /// Histogram bucket bounds are empty or not sorted ascending
    #[error("histogram buckets must be non-empty and sorted in ascending order")]
    InvalidBuckets,

    /// Counter increment with a negative amount
    #[error("counters are monotonic: increment by {0} is negative")]
    InvalidIncrement(f64),

    /// Write operation dispatched to a metric kind that does not support it
    #[error("operation {op:?} is not supported by a {kind} metric")]
    KindMismatch {
        /// The attempted operation
        op: &'static str,
        /// The metric's actual kind
        kind: &'static str,
    },

    /// A label validation failure
    #[error(transparent)]
    Label(#[from] LabelError),
}

/// Errors raised by the metric registry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    /// Explicit registration under a name that is already taken
    #[error("a metric named {0:?} is already registered")]
    Duplicate(String),

    /// Get-or-create found an existing metric of a different kind
    #[error("metric {name:?} is already registered as a {existing}, not a {requested}")]
    KindMismatch {
        /// The contested metric name
        name: String,
        /// Kind of the metric already registered
        existing: &'static str,
        /// Kind the caller asked for
        requested: &'static str,
    },

    /// Construction of the new metric failed
    #[error(transparent)]
    Metric(#[from] MetricError),
}
