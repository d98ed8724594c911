//! Breaker protection for macro handlers.

use std::fmt;
use std::sync::Arc;

use rampart_breaker::{BreakerError, CircuitBreaker};
use rampart_dispatch::{MacroContext, MacroError, MacroHandler};
use serde_json::Value;

/// A [`MacroHandler`] whose calls pass through a [`CircuitBreaker`].
///
/// Without a fallback an open circuit surfaces as a
/// [`CircuitOpenError`](rampart_breaker::CircuitOpenError) boxed into the
/// macro error. With a fallback the fixed JSON value answers instead.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// use rampart_breaker::{BreakerSettings, CircuitBreaker};
/// use rampart_dispatch::{MacroContext, MacroHandler, handler};
/// use rampart_host::BreakerGuarded;
/// use serde_json::json;
///
/// let breaker = Arc::new(CircuitBreaker::new(
///     "inference",
///     BreakerSettings::new(1, Duration::from_secs(60), 1),
/// ));
/// let flaky = handler::from_fn(|_ctx, _input| Err("model offline".into()));
/// let guarded = BreakerGuarded::new(breaker, Arc::new(flaky))
///     .with_fallback(json!({"answer": null}));
///
/// let ctx = MacroContext::new();
/// assert_eq!(guarded.call(&ctx, json!({})).expect("fallback"), json!({"answer": null}));
/// ```
pub struct BreakerGuarded {
    breaker: Arc<CircuitBreaker>,
    inner: Arc<dyn MacroHandler>,
    fallback: Option<Value>,
}

impl fmt::Debug for BreakerGuarded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BreakerGuarded")
            .field("breaker", &self.breaker.name())
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}

impl BreakerGuarded {
    /// Wraps `inner` so every call is counted by `breaker`.
    #[must_use]
    pub fn new(breaker: Arc<CircuitBreaker>, inner: Arc<dyn MacroHandler>) -> Self {
        Self {
            breaker,
            inner,
            fallback: None,
        }
    }

    /// Serves `fallback` whenever the breaker refuses or trips.
    #[must_use]
    pub fn with_fallback(mut self, fallback: Value) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Returns the breaker guarding this handler.
    #[must_use]
    pub const fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }
}

impl MacroHandler for BreakerGuarded {
    fn call(&self, ctx: &MacroContext, input: Value) -> Result<Value, MacroError> {
        let op = || self.inner.call(ctx, input);
        match &self.fallback {
            Some(fallback) => self.breaker.call_with_fallback(op, || fallback.clone()),
            None => self.breaker.call(op).map_err(|error| match error {
                BreakerError::Open(open) => Box::new(open) as MacroError,
                BreakerError::Operation(failure) => failure,
            }),
        }
    }
}
