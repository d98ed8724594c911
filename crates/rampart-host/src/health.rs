//! Structured health reporting for host lifecycle events.

use std::sync::Arc;

use rampart_config::Config;
use rampart_plugins::PluginError;

use crate::bootstrap::BootstrapError;
use crate::host::LoadError;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked once a plugin is validated, initialised and registered.
    fn plugin_accepted(&self, id: &str, macros: &[String]);

    /// Invoked when a plugin is refused or fails to initialise.
    fn plugin_rejected(&self, id: &str, error: &LoadError);

    /// Invoked when a loaded plugin's tick or destroy hook fails.
    fn plugin_failed(&self, error: &PluginError);

    /// Invoked after a plugin's destroy hook returns successfully.
    fn plugin_stopped(&self, id: &str);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn plugin_accepted(&self, id: &str, macros: &[String]) {
        (**self).plugin_accepted(id, macros);
    }

    fn plugin_rejected(&self, id: &str, error: &LoadError) {
        (**self).plugin_rejected(id, error);
    }

    fn plugin_failed(&self, error: &PluginError) {
        (**self).plugin_failed(error);
    }

    fn plugin_stopped(&self, id: &str) {
        (**self).plugin_stopped(id);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting host bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            log_filter = %config.log_filter(),
            log_format = %config.log_format(),
            log_colour = %config.log_colour(),
            default_actor = config.default_actor_enabled(),
            "host bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "host bootstrap failed"
        );
    }

    fn plugin_accepted(&self, id: &str, macros: &[String]) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "plugin_accepted",
            plugin = id,
            macros = ?macros,
            "plugin loaded"
        );
    }

    fn plugin_rejected(&self, id: &str, error: &LoadError) {
        tracing::warn!(
            target: HEALTH_TARGET,
            event = "plugin_rejected",
            plugin = id,
            error = %error,
            "plugin refused"
        );
    }

    fn plugin_failed(&self, error: &PluginError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "plugin_failed",
            error = %error,
            "plugin hook failed"
        );
    }

    fn plugin_stopped(&self, id: &str) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "plugin_stopped",
            plugin = id,
            "plugin destroyed"
        );
    }
}
