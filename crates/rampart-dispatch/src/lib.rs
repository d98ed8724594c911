//! Macro registry and guarded dispatch.
//!
//! Macros are named callables grouped into domains. Every invocation goes
//! through [`Dispatcher::run_macro`], which applies a fixed protocol before
//! the handler runs:
//!
//! 1. **Authorization.** The caller's actor, or the configured default actor,
//!    must be accepted by the injected [`Authorizer`].
//! 2. **Safe-read bypass.** Read-only HTTP requests and allow-listed read
//!    macros skip the safety guard entirely.
//! 3. **Safety guard.** Everything else is evaluated by the injected
//!    [`SafetyGuard`]. A rejection stands unless the call is a safe read under
//!    another path alias, an internal tick from a trusted role, or a
//!    requested founder override the [`FounderOverride`] approves. Every
//!    evaluation is reported to the [`GuardAudit`] sink.
//! 4. **Resolution.** The handler is looked up and invoked outside the
//!    registry lock; its result or error is returned unchanged.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use rampart_dispatch::{Dispatcher, MacroContext, MacroRegistry, handler};
//! use serde_json::json;
//!
//! let registry = Arc::new(MacroRegistry::new());
//! registry.register("notes", "count", handler::from_fn(|_ctx, _input| Ok(json!(3))));
//!
//! let dispatcher = Dispatcher::new(Arc::clone(&registry));
//! let output = dispatcher
//!     .run_macro("notes", "count", None, &MacroContext::new())
//!     .expect("default actor may run macros");
//! assert_eq!(output, json!(3));
//! ```

pub mod context;
pub mod dispatcher;
pub mod error;
pub mod guard;
pub mod handler;
pub mod policy;
pub mod registry;

#[cfg(test)]
mod tests;

pub use self::context::{Actor, MacroContext, RequestMeta, Role, RoleParseError};
pub use self::dispatcher::Dispatcher;
pub use self::error::DispatchError;
pub use self::guard::{
    AllowAll, Authorizer, FounderOverride, GuardAudit, GuardDecision, GuardEvent, GuardVerdict,
    NoOverride, PermissiveGuard, SafetyGuard, Severity, TracingGuardAudit,
};
pub use self::handler::{MacroError, MacroHandler, MacroSpec};
pub use self::policy::DispatchPolicy;
pub use self::registry::MacroRegistry;
