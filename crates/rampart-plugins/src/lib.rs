//! Static vetting of extension modules before they are registered.
//!
//! The `rampart-plugins` crate decides which callable extension code may be
//! registered at all. A candidate module is described either by the
//! [`PluginModule`] trait (statically linked plugins) or by a reflected
//! [`ModuleExports`] view (dynamically loaded ones). Both paths meet in the
//! [`PluginValidator`], which runs four independent gates and reports every
//! failure at once:
//!
//! 1. `shape`: identity fields and lifecycle callables are present and
//!    well-formed.
//! 2. `namespace`: the id and declared macros stay out of reserved
//!    namespaces, and generated plugins stay inside `generated`.
//! 3. `prohibited_patterns`: a textual deny-list over the source text. This
//!    is a lint, not a sandbox; candidate code is never executed.
//! 4. `dependency_declaration`: the declared read/write intent only names
//!    permitted state.
//!
//! # Example
//!
//! ```
//! use rampart_plugins::{ExportValue, ModuleExports, PluginValidator, ValidateOptions};
//!
//! let exports = ModuleExports::new()
//!     .with("id", ExportValue::text("acme.notes"))
//!     .with("name", ExportValue::text("Notes"))
//!     .with("version", ExportValue::text("1.0.0"))
//!     .with("init", ExportValue::Function)
//!     .with("destroy", ExportValue::Function);
//!
//! let validator = PluginValidator::standard().expect("default patterns compile");
//! let result = validator.validate(&exports, &ValidateOptions::new());
//! assert!(result.is_valid(), "{:?}", result.errors());
//! ```

pub mod error;
pub mod gates;
pub mod module;
pub mod policy;
pub mod validator;

#[cfg(test)]
mod tests;

pub use self::error::{HookError, LifecyclePhase, PluginError};
pub use self::gates::{GateName, GateResult};
pub use self::module::{ExportValue, Intent, ModuleExports, PluginModule};
pub use self::policy::{PatternRule, ValidatorPolicy};
pub use self::validator::{PluginValidator, ValidateOptions, ValidationResult};
