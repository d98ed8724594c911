//! The plugin module contract and its reflected export view.
//!
//! Statically linked plugins implement [`PluginModule`]; the compiler already
//! guarantees most of the shape. Dynamically described modules are handed to
//! the validator as a [`ModuleExports`] map instead. [`ModuleExports::reflect`]
//! projects a typed plugin onto the same map so a single validator serves
//! both.

mod exports;
mod intent;

pub use self::exports::{ExportValue, ModuleExports};
pub use self::intent::Intent;

use crate::error::HookError;

/// A candidate extension module.
///
/// # Example
///
/// ```
/// use rampart_plugins::{HookError, PluginModule};
///
/// struct Notes;
///
/// impl PluginModule for Notes {
///     fn id(&self) -> &str { "acme.notes" }
///     fn name(&self) -> &str { "Notes" }
///     fn version(&self) -> &str { "1.0.0" }
///     fn init(&self) -> Result<(), HookError> { Ok(()) }
///     fn destroy(&self) -> Result<(), HookError> { Ok(()) }
/// }
///
/// assert!(Notes.macro_names().is_empty());
/// assert!(!Notes.ticks());
/// ```
pub trait PluginModule: Send + Sync {
    /// Dotted identifier, `namespace.name`.
    fn id(&self) -> &str;

    /// Human-readable name.
    fn name(&self) -> &str;

    /// Loose semantic version.
    fn version(&self) -> &str;

    /// Runs once after the module is accepted.
    ///
    /// # Errors
    ///
    /// Returns the plugin's own error when it cannot start.
    fn init(&self) -> Result<(), HookError>;

    /// Runs once when the host shuts down.
    ///
    /// # Errors
    ///
    /// Returns the plugin's own error when teardown fails.
    fn destroy(&self) -> Result<(), HookError>;

    /// Names of the macros the module contributes.
    fn macro_names(&self) -> Vec<String> {
        Vec::new()
    }

    /// Names of the lifecycle hooks the module subscribes to.
    fn hook_names(&self) -> Vec<String> {
        Vec::new()
    }

    /// Whether the module exports a `tick` callable.
    fn ticks(&self) -> bool {
        false
    }

    /// Host-driven periodic work; only called when [`ticks`](Self::ticks)
    /// returns `true`.
    ///
    /// # Errors
    ///
    /// Returns the plugin's own error when the tick fails.
    fn tick(&self) -> Result<(), HookError> {
        Ok(())
    }

    /// Declared state access, if any.
    fn intent(&self) -> Option<Intent> {
        None
    }
}
