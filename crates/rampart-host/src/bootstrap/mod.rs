//! Host bootstrap orchestration.
//!
//! [`Host::bootstrap_with`](crate::Host::bootstrap_with) loads configuration,
//! installs telemetry and wires the breaker registry, plugin validator and
//! macro dispatcher from the injected [`HostCollaborators`].

use std::fmt;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;

use rampart_breaker::{
    BreakerRegistry, BreakerSettings, Clock, DependencyClass, LoggingStateListener,
    StateListener, SystemClock,
};
use rampart_config::{BreakerThresholds, Config};
use rampart_dispatch::{
    AllowAll, Authorizer, DispatchPolicy, Dispatcher, FounderOverride, GuardAudit, MacroRegistry,
    NoOverride, PermissiveGuard, SafetyGuard, TracingGuardAudit,
};
use rampart_plugins::{PluginError, PluginValidator, ValidatorPolicy};

use crate::telemetry::TelemetryError;

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the host configuration.
    ///
    /// # Errors
    ///
    /// Returns the aggregated loader error when any layer is invalid.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader that hands out an already resolved configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps `config`.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The validator policy carried an unusable rule.
    #[error("failed to build plugin validator: {source}")]
    Validator {
        /// Rule compilation error.
        #[source]
        source: PluginError,
    },
}

/// Collaborators injected into the host at bootstrap.
///
/// Every field defaults to the permissive built-in so tests and embedders
/// only replace what they care about.
#[derive(Clone)]
pub struct HostCollaborators {
    pub(crate) authorizer: Arc<dyn Authorizer>,
    pub(crate) guard: Arc<dyn SafetyGuard>,
    pub(crate) founder_override: Arc<dyn FounderOverride>,
    pub(crate) audit: Arc<dyn GuardAudit>,
    pub(crate) dispatch_policy: DispatchPolicy,
    pub(crate) validator_policy: ValidatorPolicy,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) breaker_listener: Arc<dyn StateListener>,
}

impl fmt::Debug for HostCollaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostCollaborators")
            .field("dispatch_policy", &self.dispatch_policy)
            .field("validator_policy", &self.validator_policy)
            .finish_non_exhaustive()
    }
}

impl Default for HostCollaborators {
    fn default() -> Self {
        Self {
            authorizer: Arc::new(AllowAll),
            guard: Arc::new(PermissiveGuard),
            founder_override: Arc::new(NoOverride),
            audit: Arc::new(TracingGuardAudit),
            dispatch_policy: DispatchPolicy::default(),
            validator_policy: ValidatorPolicy::default(),
            clock: Arc::new(SystemClock),
            breaker_listener: Arc::new(LoggingStateListener),
        }
    }
}

impl HostCollaborators {
    /// Replaces the authorisation check.
    #[must_use]
    pub fn with_authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer = authorizer;
        self
    }

    /// Replaces the safety guard.
    #[must_use]
    pub fn with_guard(mut self, guard: Arc<dyn SafetyGuard>) -> Self {
        self.guard = guard;
        self
    }

    /// Replaces the founder-override decision.
    #[must_use]
    pub fn with_founder_override(mut self, founder_override: Arc<dyn FounderOverride>) -> Self {
        self.founder_override = founder_override;
        self
    }

    /// Replaces the guard audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn GuardAudit>) -> Self {
        self.audit = audit;
        self
    }

    /// Replaces the dispatch allow-lists and trusted roles.
    ///
    /// The configured `default_actor_enabled` flag still applies on top.
    #[must_use]
    pub fn with_dispatch_policy(mut self, policy: DispatchPolicy) -> Self {
        self.dispatch_policy = policy;
        self
    }

    /// Replaces the plugin validation policy.
    #[must_use]
    pub fn with_validator_policy(mut self, policy: ValidatorPolicy) -> Self {
        self.validator_policy = policy;
        self
    }

    /// Replaces the clock breakers measure cooldowns with.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the observer of breaker state changes.
    #[must_use]
    pub fn with_breaker_listener(mut self, listener: Arc<dyn StateListener>) -> Self {
        self.breaker_listener = listener;
        self
    }
}

/// Components assembled from configuration and collaborators.
pub(crate) struct Wiring {
    pub(crate) breakers: BreakerRegistry,
    pub(crate) macros: Arc<MacroRegistry>,
    pub(crate) dispatcher: Dispatcher,
    pub(crate) validator: PluginValidator,
}

pub(crate) fn wire(config: &Config, collaborators: HostCollaborators) -> Result<Wiring, BootstrapError> {
    let validator = PluginValidator::new(collaborators.validator_policy)
        .map_err(|source| BootstrapError::Validator { source })?;

    let mut breakers = BreakerRegistry::new()
        .with_clock(collaborators.clock)
        .with_listener(collaborators.breaker_listener);
    for class in DependencyClass::ALL {
        breakers.register(class.as_str(), settings(thresholds(config, class)));
    }

    let policy = if config.default_actor_enabled() {
        collaborators.dispatch_policy
    } else {
        collaborators.dispatch_policy.without_default_actor()
    };
    let macros = Arc::new(MacroRegistry::new());
    let dispatcher = Dispatcher::new(Arc::clone(&macros))
        .with_policy(policy)
        .with_authorizer(collaborators.authorizer)
        .with_guard(collaborators.guard)
        .with_founder_override(collaborators.founder_override)
        .with_audit(collaborators.audit);

    Ok(Wiring {
        breakers,
        macros,
        dispatcher,
        validator,
    })
}

const fn thresholds(config: &Config, class: DependencyClass) -> BreakerThresholds {
    match class {
        DependencyClass::Inference => config.inference(),
        DependencyClass::Embeddings => config.embeddings(),
        DependencyClass::Persistence => config.persistence(),
    }
}

fn settings(thresholds: BreakerThresholds) -> BreakerSettings {
    BreakerSettings::new(
        thresholds.failure_threshold,
        thresholds.cooldown,
        thresholds.success_threshold,
    )
}
