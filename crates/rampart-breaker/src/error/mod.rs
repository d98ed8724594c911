//! Errors surfaced by guarded calls.
//!
//! A breaker only ever adds one failure mode of its own: refusing to run the
//! wrapped operation while open. Every other failure belongs to the wrapped
//! operation and is carried through [`BreakerError::Operation`] untouched.

use thiserror::Error;

/// Raised when a breaker refuses a call and no fallback was supplied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("circuit '{name}' is open; dependency unavailable")]
pub struct CircuitOpenError {
    name: String,
}

impl CircuitOpenError {
    /// Creates an error for the named dependency.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns the name of the dependency whose circuit is open.
    #[must_use]
    pub const fn name(&self) -> &str {
        self.name.as_str()
    }
}

/// Outcome of a guarded call that was not rescued by a fallback.
#[derive(Debug, Error)]
pub enum BreakerError<E> {
    /// The breaker was open and the operation was not attempted.
    #[error(transparent)]
    Open(CircuitOpenError),

    /// The operation ran and failed; the original error is preserved.
    #[error(transparent)]
    Operation(E),
}

impl<E> BreakerError<E> {
    /// Returns `true` when the call was shunted by an open circuit.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Open(_))
    }

    /// Returns the wrapped operation's error, if the operation ran.
    #[must_use]
    pub fn into_operation(self) -> Option<E> {
        match self {
            Self::Operation(error) => Some(error),
            Self::Open(_) => None,
        }
    }
}
