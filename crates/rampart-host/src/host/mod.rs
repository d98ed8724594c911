//! The assembled host and its plugin lifecycle.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use rampart_breaker::{BreakerRegistry, CircuitBreaker, DependencyClass};
use rampart_config::Config;
use rampart_dispatch::{
    DispatchError, Dispatcher, MacroContext, MacroHandler, MacroRegistry, MacroSpec,
};
use rampart_plugins::{
    LifecyclePhase, PluginError, PluginValidator, ValidateOptions, ValidationResult,
};

use crate::bootstrap::{self, BootstrapError, ConfigLoader, HostCollaborators};
use crate::guarded::BreakerGuarded;
use crate::health::HealthReporter;
use crate::plugin::{MacroPlugin, dispatch_address};
use crate::telemetry::{self, TelemetryHandle};

/// Reasons a plugin is refused by [`Host::load_plugin`].
#[derive(Debug, Error)]
pub enum LoadError {
    /// One or more validation gates failed.
    #[error("plugin '{id}' failed validation: {}", .result.errors().join("; "))]
    Rejected {
        /// Declared plugin id.
        id: String,
        /// Per-gate outcome with every collected error.
        result: ValidationResult,
    },
    /// A declared macro has no handler behind it.
    #[error("plugin '{id}' declares macro '{name}' but provides no handler")]
    MissingHandler {
        /// Declared plugin id.
        id: String,
        /// Macro name as declared.
        name: String,
    },
    /// A declared macro resolves to an address that is already taken.
    #[error("plugin '{id}' declares macro '{address}', which is already registered")]
    MacroTaken {
        /// Declared plugin id.
        id: String,
        /// Resolved `domain.name`.
        address: String,
    },
    /// A declared macro resolves to an allow-listed read, which would bypass
    /// the safety guard.
    #[error("plugin '{id}' declares macro '{address}', which is reserved for guard-exempt reads")]
    SafeReadAddress {
        /// Declared plugin id.
        id: String,
        /// Resolved `domain.name`.
        address: String,
    },
    /// The plugin's `init` hook failed.
    #[error("{source}")]
    Init {
        /// Lifecycle error naming the plugin.
        #[source]
        source: PluginError,
    },
}

impl LoadError {
    /// Returns the validation outcome for gate rejections.
    #[must_use]
    pub const fn validation(&self) -> Option<&ValidationResult> {
        match self {
            Self::Rejected { result, .. } => Some(result),
            Self::MissingHandler { .. }
            | Self::MacroTaken { .. }
            | Self::SafeReadAddress { .. }
            | Self::Init { .. } => None,
        }
    }
}

const HOST_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::host");

type Registration = (MacroSpec, Arc<dyn MacroHandler>);

/// A loaded plugin with the macros it registered.
struct LoadedPlugin {
    plugin: Arc<dyn MacroPlugin>,
    macros: Vec<MacroSpec>,
}

/// A running host: configuration, breakers, validator, dispatcher and the
/// plugins loaded so far.
pub struct Host {
    config: Config,
    telemetry: TelemetryHandle,
    reporter: Arc<dyn HealthReporter>,
    breakers: BreakerRegistry,
    macros: Arc<MacroRegistry>,
    dispatcher: Dispatcher,
    validator: PluginValidator,
    plugins: Vec<LoadedPlugin>,
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("config", &self.config)
            .field("breakers", &self.breakers)
            .field("plugins", &self.loaded_ids().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Host {
    /// Bootstraps a host from the supplied collaborators.
    ///
    /// Configuration is loaded first, then telemetry is installed, then the
    /// breaker registry is provisioned with one breaker per
    /// [`DependencyClass`] using the configured thresholds.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError`] when configuration, telemetry or the
    /// validator policy cannot be set up. The reporter observes the failure
    /// before it is returned.
    pub fn bootstrap_with(
        loader: &dyn ConfigLoader,
        reporter: Arc<dyn HealthReporter>,
        collaborators: HostCollaborators,
    ) -> Result<Self, BootstrapError> {
        reporter.bootstrap_starting();
        let fail = |error: BootstrapError| {
            reporter.bootstrap_failed(&error);
            error
        };

        let config = loader
            .load()
            .map_err(|source| fail(BootstrapError::Configuration { source }))?;
        let telemetry = telemetry::initialise(&config)
            .map_err(|source| fail(BootstrapError::Telemetry { source }))?;
        let wiring = bootstrap::wire(&config, collaborators).map_err(fail)?;

        reporter.bootstrap_succeeded(&config);
        Ok(Self {
            config,
            telemetry,
            reporter,
            breakers: wiring.breakers,
            macros: wiring.macros,
            dispatcher: wiring.dispatcher,
            validator: wiring.validator,
            plugins: Vec::new(),
        })
    }

    /// Accessor for the resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub const fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Returns the breaker registry.
    #[must_use]
    pub const fn breakers(&self) -> &BreakerRegistry {
        &self.breakers
    }

    /// Returns the breaker for a standard dependency class.
    #[must_use]
    pub fn breaker(&self, class: DependencyClass) -> Option<Arc<CircuitBreaker>> {
        self.breakers.class(class)
    }

    /// Returns the macro registry shared with the dispatcher.
    #[must_use]
    pub const fn macros(&self) -> &Arc<MacroRegistry> {
        &self.macros
    }

    /// Returns the guarded dispatcher.
    #[must_use]
    pub const fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Returns the plugin validator.
    #[must_use]
    pub const fn validator(&self) -> &PluginValidator {
        &self.validator
    }

    /// Ids of the loaded plugins in load order.
    pub fn loaded_ids(&self) -> impl Iterator<Item = &str> {
        self.plugins.iter().map(|loaded| loaded.plugin.id())
    }

    /// Runs a macro through the guarded dispatcher.
    ///
    /// # Errors
    ///
    /// Propagates every [`DispatchError`] the dispatcher reports.
    pub fn run_macro(
        &self,
        domain: &str,
        name: &str,
        input: Option<Value>,
        ctx: &MacroContext,
    ) -> Result<Value, DispatchError> {
        self.dispatcher.run_macro(domain, name, input, ctx)
    }

    /// Validates, initialises and registers a plugin.
    ///
    /// The plugin is checked against the ids already loaded, so the same id
    /// cannot be loaded twice. Its macros may neither displace a registered
    /// macro nor take an address on the dispatcher's safe-read list. Nothing
    /// is registered unless all of that holds and `init` succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] describing why the plugin was refused.
    pub fn load_plugin(
        &mut self,
        plugin: Arc<dyn MacroPlugin>,
        options: ValidateOptions,
    ) -> Result<(), LoadError> {
        match self.admit(plugin.as_ref(), options) {
            Ok(macros) => {
                let names: Vec<String> = macros.iter().map(MacroSpec::qualified_name).collect();
                self.reporter.plugin_accepted(plugin.id(), &names);
                self.plugins.push(LoadedPlugin { plugin, macros });
                Ok(())
            }
            Err(error) => {
                self.reporter.plugin_rejected(plugin.id(), &error);
                Err(error)
            }
        }
    }

    /// Drives the `tick` hook of every loaded plugin that exports one.
    ///
    /// A failing plugin does not stop the remaining ticks; its error is
    /// reported and returned.
    #[must_use]
    pub fn tick(&self) -> Vec<PluginError> {
        let mut failures = Vec::new();
        let ticking = self
            .plugins
            .iter()
            .map(|loaded| &loaded.plugin)
            .filter(|plugin| plugin.ticks());
        for plugin in ticking {
            if let Err(error) = plugin.tick() {
                let failure = PluginError::lifecycle(plugin.id(), LifecyclePhase::Tick, &error);
                self.reporter.plugin_failed(&failure);
                failures.push(failure);
            }
        }
        failures
    }

    /// Destroys every loaded plugin, most recently loaded first.
    ///
    /// A plugin's macros are unregistered before its `destroy` hook runs.
    /// Every plugin is destroyed even when an earlier one fails. The host
    /// holds no plugins afterwards.
    pub fn shutdown(&mut self) -> Vec<PluginError> {
        let mut failures = Vec::new();
        while let Some(LoadedPlugin { plugin, macros }) = self.plugins.pop() {
            let retired = macros
                .iter()
                .filter_map(|spec| self.macros.unregister(&spec.domain, &spec.name))
                .count();
            tracing::debug!(
                target: HOST_TARGET,
                plugin = plugin.id(),
                retired,
                "plugin macros unregistered"
            );
            match plugin.destroy() {
                Ok(()) => self.reporter.plugin_stopped(plugin.id()),
                Err(error) => {
                    let failure =
                        PluginError::lifecycle(plugin.id(), LifecyclePhase::Destroy, &error);
                    self.reporter.plugin_failed(&failure);
                    failures.push(failure);
                }
            }
        }
        failures
    }

    fn admit(
        &self,
        plugin: &dyn MacroPlugin,
        options: ValidateOptions,
    ) -> Result<Vec<MacroSpec>, LoadError> {
        let id = plugin.id();
        let checked = options.with_loaded_ids(self.loaded_ids());
        let result = self.validator.validate_module(plugin, &checked);
        if !result.is_valid() {
            return Err(LoadError::Rejected {
                id: id.to_owned(),
                result,
            });
        }

        let registrations = self.registrations(plugin)?;
        plugin.init().map_err(|error| LoadError::Init {
            source: PluginError::lifecycle(id, LifecyclePhase::Init, &error),
        })?;

        let mut registered = Vec::with_capacity(registrations.len());
        for (spec, handler) in registrations {
            registered.push(spec.clone());
            self.macros.register_spec(spec, handler);
        }
        Ok(registered)
    }

    fn registrations(&self, plugin: &dyn MacroPlugin) -> Result<Vec<Registration>, LoadError> {
        let id = plugin.id();
        let mut claimed = BTreeSet::new();
        plugin
            .macro_names()
            .into_iter()
            .map(|declared| {
                let handler =
                    plugin
                        .macro_handler(&declared)
                        .ok_or_else(|| LoadError::MissingHandler {
                            id: id.to_owned(),
                            name: declared.clone(),
                        })?;
                let breaker = plugin
                    .macro_dependency(&declared)
                    .and_then(|class| self.breakers.class(class));
                let (domain, name) = dispatch_address(id, &declared);
                let spec = MacroSpec::new(domain, name);
                self.claim(id, &spec, &mut claimed)?;
                Ok((spec, route(breaker, handler)))
            })
            .collect()
    }

    /// Refuses addresses already registered, claimed twice by the same
    /// plugin, or exempt from the safety guard.
    fn claim(
        &self,
        id: &str,
        spec: &MacroSpec,
        claimed: &mut BTreeSet<String>,
    ) -> Result<(), LoadError> {
        let address = spec.qualified_name();
        if self
            .dispatcher
            .policy()
            .is_safe_read_macro(&spec.domain, &spec.name)
        {
            return Err(LoadError::SafeReadAddress {
                id: id.to_owned(),
                address,
            });
        }
        if self.macros.contains(&spec.domain, &spec.name) || !claimed.insert(address.clone()) {
            return Err(LoadError::MacroTaken {
                id: id.to_owned(),
                address,
            });
        }
        Ok(())
    }
}

fn route(
    breaker: Option<Arc<CircuitBreaker>>,
    handler: Arc<dyn MacroHandler>,
) -> Arc<dyn MacroHandler> {
    if let Some(guard) = breaker {
        return Arc::new(BreakerGuarded::new(guard, handler));
    }
    handler
}
