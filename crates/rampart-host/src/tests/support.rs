//! Shared fixtures for host unit and behavioural tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use rampart_breaker::DependencyClass;
use rampart_config::Config;
use rampart_dispatch::{MacroHandler, handler};
use rampart_plugins::{HookError, Intent, PluginError, PluginModule};
use serde_json::json;

use crate::bootstrap::BootstrapError;
use crate::health::HealthReporter;
use crate::host::LoadError;
use crate::plugin::MacroPlugin;

/// Ordered record of plugin hook invocations, `"<id>:<hook>"`.
#[derive(Clone, Default)]
pub(crate) struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub(crate) fn entries(&self) -> Vec<String> {
        self.0.lock().expect("journal mutex poisoned").clone()
    }

    fn push(&self, entry: String) {
        self.0.lock().expect("journal mutex poisoned").push(entry);
    }
}

/// Configurable plugin used to drive the host lifecycle.
#[derive(Clone)]
pub(crate) struct StubPlugin {
    id: String,
    macros: Vec<String>,
    unhandled: Option<String>,
    dependencies: BTreeMap<String, DependencyClass>,
    macros_fail: bool,
    ticks: bool,
    fail_init: bool,
    fail_tick: bool,
    fail_destroy: bool,
    writes: Vec<String>,
    journal: Journal,
}

impl StubPlugin {
    pub(crate) fn new(id: &str, journal: &Journal) -> Self {
        Self {
            id: id.to_owned(),
            macros: Vec::new(),
            unhandled: None,
            dependencies: BTreeMap::new(),
            macros_fail: false,
            ticks: false,
            fail_init: false,
            fail_tick: false,
            fail_destroy: false,
            writes: Vec::new(),
            journal: journal.clone(),
        }
    }

    pub(crate) fn with_macro(mut self, name: &str) -> Self {
        self.macros.push(name.to_owned());
        self
    }

    pub(crate) fn with_guarded_macro(mut self, name: &str, class: DependencyClass) -> Self {
        self.dependencies.insert(name.to_owned(), class);
        self.with_macro(name)
    }

    pub(crate) fn with_unhandled_macro(mut self, name: &str) -> Self {
        self.unhandled = Some(name.to_owned());
        self
    }

    pub(crate) fn failing_macros(mut self) -> Self {
        self.macros_fail = true;
        self
    }

    pub(crate) fn ticking(mut self) -> Self {
        self.ticks = true;
        self
    }

    pub(crate) fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    pub(crate) fn failing_tick(mut self) -> Self {
        self.fail_tick = true;
        self
    }

    pub(crate) fn failing_destroy(mut self) -> Self {
        self.fail_destroy = true;
        self
    }

    pub(crate) fn writing(mut self, target: &str) -> Self {
        self.writes.push(target.to_owned());
        self
    }

    pub(crate) fn into_arc(self) -> Arc<dyn MacroPlugin> {
        Arc::new(self)
    }

    fn hook(&self, name: &str, fail: bool) -> Result<(), HookError> {
        self.journal.push(format!("{}:{name}", self.id));
        if fail {
            return Err(format!("{name} refused").into());
        }
        Ok(())
    }
}

impl PluginModule for StubPlugin {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        "Stub"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn init(&self) -> Result<(), HookError> {
        self.hook("init", self.fail_init)
    }

    fn destroy(&self) -> Result<(), HookError> {
        self.hook("destroy", self.fail_destroy)
    }

    fn macro_names(&self) -> Vec<String> {
        self.macros
            .iter()
            .chain(self.unhandled.iter())
            .cloned()
            .collect()
    }

    fn ticks(&self) -> bool {
        self.ticks
    }

    fn tick(&self) -> Result<(), HookError> {
        self.hook("tick", self.fail_tick)
    }

    fn intent(&self) -> Option<Intent> {
        if self.writes.is_empty() {
            return None;
        }
        Some(Intent::new(Vec::<String>::new(), self.writes.clone()))
    }
}

impl MacroPlugin for StubPlugin {
    fn macro_handler(&self, name: &str) -> Option<Arc<dyn MacroHandler>> {
        if !self.macros.iter().any(|declared| declared == name) {
            return None;
        }
        let plugin = self.id.clone();
        let declared = name.to_owned();
        let fails = self.macros_fail;
        Some(Arc::new(handler::from_fn(move |_ctx, input| {
            if fails {
                return Err(format!("{declared} backend unavailable").into());
            }
            Ok(json!({"plugin": plugin, "macro": declared, "input": input}))
        })))
    }

    fn macro_dependency(&self, name: &str) -> Option<DependencyClass> {
        self.dependencies.get(name).copied()
    }
}

/// Structured health events tracked during tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded,
    BootstrapFailed(String),
    PluginAccepted(String, Vec<String>),
    PluginRejected(String),
    PluginFailed(String),
    PluginStopped(String),
}

/// Records health events for assertions.
#[derive(Default)]
pub(crate) struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    pub(crate) fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn plugin_accepted(&self, id: &str, macros: &[String]) {
        self.record(HealthEvent::PluginAccepted(id.to_owned(), macros.to_vec()));
    }

    fn plugin_rejected(&self, id: &str, _error: &LoadError) {
        self.record(HealthEvent::PluginRejected(id.to_owned()));
    }

    fn plugin_failed(&self, error: &PluginError) {
        self.record(HealthEvent::PluginFailed(error.to_string()));
    }

    fn plugin_stopped(&self, id: &str) {
        self.record(HealthEvent::PluginStopped(id.to_owned()));
    }
}
