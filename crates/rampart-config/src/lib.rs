//! Layered configuration for the rampart host.
//!
//! [`Config`] merges, lowest precedence first:
//!
//! 1. built-in defaults ([`defaults`]),
//! 2. a TOML file named by `--config-path` or `RAMPART_CONFIG_PATH`,
//! 3. `RAMPART_*` environment variables,
//! 4. command-line flags such as `--log-filter`.
//!
//! Loading errors are reported as `Arc<ortho_config::OrthoError>` so the
//! caller can surface every problem at once.

pub mod defaults;
pub mod logging;

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use self::defaults::{
    DEFAULT_LOG_FILTER, default_actor_enabled, default_log_colour, default_log_filter,
    default_log_format,
};
pub use self::logging::{LogColour, LogFormat, LogSettingParseError};

/// Thresholds for one dependency's circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerThresholds {
    /// Consecutive failures that open the breaker.
    pub failure_threshold: u32,
    /// Time an open breaker waits before probing.
    pub cooldown: Duration,
    /// Consecutive half-open successes that close the breaker.
    pub success_threshold: u32,
}

/// Host configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "RAMPART")]
pub struct Config {
    /// `tracing` filter directive, e.g. `info,rampart_dispatch=debug`.
    #[serde(default = "defaults::default_log_filter_string")]
    log_filter: String,
    /// Log output format.
    #[serde(default = "defaults::default_log_format")]
    log_format: LogFormat,
    /// ANSI colour policy for human-readable log output.
    #[serde(default = "defaults::default_log_colour")]
    log_colour: LogColour,
    /// Run actor-less calls as the local owner.
    #[serde(default = "defaults::default_actor_enabled")]
    default_actor_enabled: bool,
    /// Half-open successes needed to close any breaker.
    #[serde(default = "defaults::default_success_threshold")]
    success_threshold: u32,
    /// Inference breaker failure threshold.
    #[serde(default = "defaults::default_inference_failure_threshold")]
    inference_failure_threshold: u32,
    /// Inference breaker cooldown in milliseconds.
    #[serde(default = "defaults::default_inference_cooldown_ms")]
    inference_cooldown_ms: u64,
    /// Embeddings breaker failure threshold.
    #[serde(default = "defaults::default_embeddings_failure_threshold")]
    embeddings_failure_threshold: u32,
    /// Embeddings breaker cooldown in milliseconds.
    #[serde(default = "defaults::default_embeddings_cooldown_ms")]
    embeddings_cooldown_ms: u64,
    /// Persistence breaker failure threshold.
    #[serde(default = "defaults::default_persistence_failure_threshold")]
    persistence_failure_threshold: u32,
    /// Persistence breaker cooldown in milliseconds.
    #[serde(default = "defaults::default_persistence_cooldown_ms")]
    persistence_cooldown_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: defaults::default_log_filter_string(),
            log_format: defaults::default_log_format(),
            log_colour: defaults::default_log_colour(),
            default_actor_enabled: defaults::default_actor_enabled(),
            success_threshold: defaults::default_success_threshold(),
            inference_failure_threshold: defaults::default_inference_failure_threshold(),
            inference_cooldown_ms: defaults::default_inference_cooldown_ms(),
            embeddings_failure_threshold: defaults::default_embeddings_failure_threshold(),
            embeddings_cooldown_ms: defaults::default_embeddings_cooldown_ms(),
            persistence_failure_threshold: defaults::default_persistence_failure_threshold(),
            persistence_cooldown_ms: defaults::default_persistence_cooldown_ms(),
        }
    }
}

impl Config {
    /// Returns the `tracing` filter directive.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Returns the log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Returns the ANSI colour policy for log output.
    #[must_use]
    pub const fn log_colour(&self) -> LogColour {
        self.log_colour
    }

    /// Returns `true` when actor-less calls run as the local owner.
    #[must_use]
    pub const fn default_actor_enabled(&self) -> bool {
        self.default_actor_enabled
    }

    /// Thresholds for the inference breaker.
    #[must_use]
    pub const fn inference(&self) -> BreakerThresholds {
        self.thresholds(self.inference_failure_threshold, self.inference_cooldown_ms)
    }

    /// Thresholds for the embeddings breaker.
    #[must_use]
    pub const fn embeddings(&self) -> BreakerThresholds {
        self.thresholds(self.embeddings_failure_threshold, self.embeddings_cooldown_ms)
    }

    /// Thresholds for the persistence breaker.
    #[must_use]
    pub const fn persistence(&self) -> BreakerThresholds {
        self.thresholds(
            self.persistence_failure_threshold,
            self.persistence_cooldown_ms,
        )
    }

    /// Returns a copy with the log filter replaced.
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// Returns a copy with the log format replaced.
    #[must_use]
    pub const fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    /// Returns a copy with the colour policy replaced.
    #[must_use]
    pub const fn with_log_colour(mut self, colour: LogColour) -> Self {
        self.log_colour = colour;
        self
    }

    /// Returns a copy with the default actor switched on or off.
    #[must_use]
    pub const fn with_default_actor(mut self, enabled: bool) -> Self {
        self.default_actor_enabled = enabled;
        self
    }

    const fn thresholds(&self, failure_threshold: u32, cooldown_ms: u64) -> BreakerThresholds {
        BreakerThresholds {
            failure_threshold,
            cooldown: defaults::cooldown(cooldown_ms),
            success_threshold: self.success_threshold,
        }
    }
}
