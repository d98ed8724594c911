//! Built-in configuration defaults.

use std::time::Duration;

use crate::logging::{LogColour, LogFormat};

/// Default log filter expression.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Consecutive half-open successes needed to close any breaker.
pub const DEFAULT_SUCCESS_THRESHOLD: u32 = 2;

/// Inference breaker: consecutive failures before opening.
pub const DEFAULT_INFERENCE_FAILURE_THRESHOLD: u32 = 3;
/// Inference breaker: cooldown in milliseconds.
pub const DEFAULT_INFERENCE_COOLDOWN_MS: u64 = 30_000;

/// Embeddings breaker: consecutive failures before opening.
pub const DEFAULT_EMBEDDINGS_FAILURE_THRESHOLD: u32 = 5;
/// Embeddings breaker: cooldown in milliseconds.
pub const DEFAULT_EMBEDDINGS_COOLDOWN_MS: u64 = 15_000;

/// Persistence breaker: consecutive failures before opening.
pub const DEFAULT_PERSISTENCE_FAILURE_THRESHOLD: u32 = 3;
/// Persistence breaker: cooldown in milliseconds.
pub const DEFAULT_PERSISTENCE_COOLDOWN_MS: u64 = 5_000;

/// Default log filter expression.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Colour log output only on interactive terminals.
#[must_use]
pub const fn default_log_colour() -> LogColour {
    LogColour::Auto
}

/// Calls without an actor run as the local owner unless disabled.
#[must_use]
pub const fn default_actor_enabled() -> bool {
    true
}

/// Default half-open success threshold.
#[must_use]
pub const fn default_success_threshold() -> u32 {
    DEFAULT_SUCCESS_THRESHOLD
}

/// Default inference failure threshold.
#[must_use]
pub const fn default_inference_failure_threshold() -> u32 {
    DEFAULT_INFERENCE_FAILURE_THRESHOLD
}

/// Default inference cooldown in milliseconds.
#[must_use]
pub const fn default_inference_cooldown_ms() -> u64 {
    DEFAULT_INFERENCE_COOLDOWN_MS
}

/// Default embeddings failure threshold.
#[must_use]
pub const fn default_embeddings_failure_threshold() -> u32 {
    DEFAULT_EMBEDDINGS_FAILURE_THRESHOLD
}

/// Default embeddings cooldown in milliseconds.
#[must_use]
pub const fn default_embeddings_cooldown_ms() -> u64 {
    DEFAULT_EMBEDDINGS_COOLDOWN_MS
}

/// Default persistence failure threshold.
#[must_use]
pub const fn default_persistence_failure_threshold() -> u32 {
    DEFAULT_PERSISTENCE_FAILURE_THRESHOLD
}

/// Default persistence cooldown in milliseconds.
#[must_use]
pub const fn default_persistence_cooldown_ms() -> u64 {
    DEFAULT_PERSISTENCE_COOLDOWN_MS
}

/// Converts a configured millisecond count into a [`Duration`].
#[must_use]
pub const fn cooldown(ms: u64) -> Duration {
    Duration::from_millis(ms)
}
