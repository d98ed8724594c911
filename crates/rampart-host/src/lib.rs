//! Composition root for a rampart host.
//!
//! The host ties the other rampart crates together. Bootstrap loads the
//! layered [`rampart_config::Config`], installs structured telemetry, then
//! provisions one circuit breaker per external dependency class, a plugin
//! validator and a guarded macro dispatcher.
//!
//! Plugins enter through [`Host::load_plugin`]: they are validated against
//! the four gates, initialised, and their macros registered. A macro that
//! names an external dependency is registered behind that dependency's
//! breaker via [`BreakerGuarded`]. [`Host::tick`] drives periodic plugin work
//! and [`Host::shutdown`] tears plugins down in reverse load order.
//!
//! Lifecycle events are surfaced through a [`HealthReporter`]; the default
//! [`StructuredHealthReporter`] writes them as `tracing` events under the
//! `rampart_host::health` target.

mod bootstrap;
mod guarded;
mod health;
mod host;
mod plugin;
pub mod telemetry;

pub use bootstrap::{
    BootstrapError, ConfigLoader, HostCollaborators, StaticConfigLoader, SystemConfigLoader,
};
pub use guarded::BreakerGuarded;
pub use health::{HealthReporter, StructuredHealthReporter};
pub use host::{Host, LoadError};
pub use plugin::MacroPlugin;
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
