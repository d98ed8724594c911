//! Failure-aware call wrappers for unreliable external dependencies.
//!
//! The `rampart-breaker` crate implements the classic three-state circuit
//! breaker. One [`CircuitBreaker`] guards one named dependency (an inference
//! backend, an embeddings service, the persistence layer). Once a dependency
//! has failed often enough the breaker opens and subsequent calls fail fast,
//! either through a caller-supplied fallback or with a [`CircuitOpenError`],
//! instead of queueing behind the failing dependency's timeouts.
//!
//! # State machine
//!
//! ```text
//! Closed --(failures >= failure_threshold)--> Open
//! Open --(cooldown elapsed, probe admitted)--> HalfOpen
//! HalfOpen --(successes >= success_threshold)--> Closed
//! HalfOpen --(any failure)--> Open
//! ```
//!
//! The breaker never retries: retry policy belongs to the caller or to the
//! wrapped operation. The wrapped operation's own error is surfaced verbatim
//! unless a fallback result was substituted for it.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use rampart_breaker::{BreakerSettings, BreakerState, CircuitBreaker};
//!
//! let settings = BreakerSettings::new(2, Duration::from_secs(30), 1);
//! let breaker = CircuitBreaker::new("embeddings", settings);
//!
//! for _ in 0..2 {
//!     let outcome: Result<u32, _> = breaker.call(|| Err::<u32, _>("timed out"));
//!     assert!(outcome.is_err());
//! }
//! assert_eq!(breaker.state(), BreakerState::Open);
//!
//! let degraded = breaker.call_with_fallback(|| Ok::<_, &str>(7), || 0);
//! assert_eq!(degraded, Ok(0));
//! ```

pub mod breaker;
pub mod clock;
pub mod error;
pub mod listener;
pub mod registry;

#[cfg(test)]
mod tests;

pub use self::breaker::{BreakerSettings, BreakerState, BreakerStatus, CircuitBreaker};
pub use self::clock::{Clock, ManualClock, SystemClock};
pub use self::error::{BreakerError, CircuitOpenError};
pub use self::listener::{LoggingStateListener, StateListener};
pub use self::registry::{BreakerRegistry, DependencyClass};
