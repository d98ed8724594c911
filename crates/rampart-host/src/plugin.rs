//! Plugins that contribute macros to the host.

use std::sync::Arc;

use rampart_breaker::DependencyClass;
use rampart_dispatch::MacroHandler;
use rampart_plugins::PluginModule;

/// A [`PluginModule`] that can hand its declared macros to the host.
///
/// Every name in [`macro_names`](PluginModule::macro_names) must resolve
/// through [`macro_handler`](Self::macro_handler); the host refuses the plugin
/// otherwise.
pub trait MacroPlugin: PluginModule {
    /// Returns the handler for a declared macro name.
    fn macro_handler(&self, name: &str) -> Option<Arc<dyn MacroHandler>>;

    /// External dependency a macro calls out to, if any.
    ///
    /// Macros that name a dependency are registered behind that dependency's
    /// circuit breaker.
    fn macro_dependency(&self, _name: &str) -> Option<DependencyClass> {
        None
    }
}

/// Splits a declared macro name into its dispatch `(domain, name)` pair.
///
/// `domain.name` registers under `domain`; a bare name registers under the
/// plugin id.
pub(crate) fn dispatch_address<'a>(plugin_id: &'a str, declared: &'a str) -> (&'a str, &'a str) {
    declared
        .split_once('.')
        .unwrap_or((plugin_id, declared))
}
