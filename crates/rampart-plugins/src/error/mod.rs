//! Domain errors raised while vetting and running plugin modules.
//!
//! Validation failures carry every gate message so the caller can report the
//! whole picture at once. Lifecycle errors wrap whatever the plugin returned
//! from `init`, `tick` or `destroy`.

use std::fmt;

use thiserror::Error;

/// Error type plugin lifecycle callables return.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Lifecycle stage during which a plugin callable failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecyclePhase {
    /// One-time initialisation after validation.
    Init,
    /// Periodic host-driven tick.
    Tick,
    /// Teardown during host shutdown.
    Destroy,
}

impl LifecyclePhase {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Tick => "tick",
            Self::Destroy => "destroy",
        }
    }
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors arising from plugin vetting and lifecycle management.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The candidate failed one or more validation gates.
    #[error("plugin '{id}' failed validation: {}", errors.join("; "))]
    ValidationFailed {
        /// Identifier of the rejected candidate.
        id: String,
        /// Gate-prefixed error messages in gate order.
        errors: Vec<String>,
    },

    /// A deny-list pattern could not be compiled.
    #[error("prohibited pattern '{label}' is not a valid regular expression")]
    Pattern {
        /// Label of the offending rule.
        label: String,
        /// Underlying regex compilation error.
        #[source]
        source: regex::Error,
    },

    /// A lifecycle callable reported failure.
    #[error("plugin '{id}' failed during {phase}: {message}")]
    Lifecycle {
        /// Plugin identifier.
        id: String,
        /// Stage that failed.
        phase: LifecyclePhase,
        /// Message reported by the plugin.
        message: String,
    },
}

impl PluginError {
    /// Builds a lifecycle error from a plugin callable's failure.
    #[must_use]
    pub fn lifecycle(id: impl Into<String>, phase: LifecyclePhase, error: &HookError) -> Self {
        Self::Lifecycle {
            id: id.into(),
            phase,
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests;
