//! State-change notification for breakers.

use crate::breaker::BreakerState;

/// Tracing target for breaker transitions.
pub(crate) const BREAKER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::breaker");

/// Observer notified whenever a breaker changes state.
///
/// Hosts typically forward these events to metrics or alerting. The callback
/// runs after the breaker has released its internal lock, so implementations
/// may safely query the breaker's status.
pub trait StateListener: Send + Sync {
    /// Invoked with the dependency name and the old and new states.
    fn on_transition(&self, name: &str, from: BreakerState, to: BreakerState);
}

impl<F> StateListener for F
where
    F: Fn(&str, BreakerState, BreakerState) + Send + Sync,
{
    fn on_transition(&self, name: &str, from: BreakerState, to: BreakerState) {
        self(name, from, to);
    }
}

/// Default listener that records transitions as `tracing` warnings.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingStateListener;

impl StateListener for LoggingStateListener {
    fn on_transition(&self, name: &str, from: BreakerState, to: BreakerState) {
        tracing::warn!(
            target: BREAKER_TARGET,
            breaker = name,
            from = %from,
            to = %to,
            "circuit breaker changed state"
        );
    }
}
