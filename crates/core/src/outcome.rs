//! Outcome of an analytics computation.

use serde::Serialize;

/// Result of a computation over a goal's history.
///
/// Lets callers tell "not yet computable" apart from "computed and
/// legitimately zero". Insufficiency is never an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Outcome<T> {
    /// The computation produced a value
    Computed(T),

    /// Not enough snapshots for the computation
    InsufficientData {
        /// Points (or periods) the computation needs
        required: usize,
        /// Points (or periods) available
        available: usize,
    },

    /// The input made the computation meaningless (zero velocity, zero variance)
    Degenerate(String),
}

impl<T> Outcome<T> {
    /// Shorthand for an insufficient-data outcome.
    pub fn insufficient(required: usize, available: usize) -> Self {
        Outcome::InsufficientData { required, available }
    }

    /// Shorthand for a degenerate outcome.
    pub fn degenerate(reason: impl Into<String>) -> Self {
        Outcome::Degenerate(reason.into())
    }

    /// Whether a value was computed.
    pub fn is_computed(&self) -> bool {
        matches!(self, Outcome::Computed(_))
    }

    /// Borrow the computed value.
    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Computed(v) => Some(v),
            _ => None,
        }
    }

    /// Take the computed value.
    pub fn into_value(self) -> Option<T> {
        match self {
            Outcome::Computed(v) => Some(v),
            _ => None,
        }
    }

    /// Map the computed value, keeping the failure reason.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Computed(v) => Outcome::Computed(f(v)),
            Outcome::InsufficientData { required, available } => {
                Outcome::InsufficientData { required, available }
            }
            Outcome::Degenerate(reason) => Outcome::Degenerate(reason),
        }
    }

    /// Chain a computation that may itself not produce a value.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Outcome<U>) -> Outcome<U> {
        match self {
            Outcome::Computed(v) => f(v),
            Outcome::InsufficientData { required, available } => {
                Outcome::InsufficientData { required, available }
            }
            Outcome::Degenerate(reason) => Outcome::Degenerate(reason),
        }
    }

    /// Human-readable reason when nothing was computed.
    pub fn reason(&self) -> Option<String> {
        match self {
            Outcome::Computed(_) => None,
            Outcome::InsufficientData { required, available } => Some(format!(
                "Insufficient data: need {}, have {}",
                required, available
            )),
            Outcome::Degenerate(reason) => Some(reason.clone()),
        }
    }
}
