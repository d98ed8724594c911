//! Error types for macro dispatch.

use thiserror::Error;

use crate::guard::Severity;
use crate::handler::MacroError;

/// Errors surfaced by [`Dispatcher::run_macro`](crate::Dispatcher::run_macro).
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No actor could be established, or the authorizer refused it.
    #[error("forbidden: not permitted to run '{domain}.{name}'")]
    Forbidden {
        /// Target domain.
        domain: String,
        /// Target macro name.
        name: String,
    },

    /// The safety guard rejected the call and nothing overrode it.
    #[error("guard rejected '{domain}.{name}' ({severity}): {reason}")]
    GuardRejected {
        /// Target domain.
        domain: String,
        /// Target macro name.
        name: String,
        /// Reason reported by the guard.
        reason: String,
        /// Severity reported by the guard.
        severity: Severity,
    },

    /// The domain has no registered macros.
    #[error("unknown macro domain: {domain}")]
    DomainNotFound {
        /// Requested domain.
        domain: String,
    },

    /// The domain exists but has no macro of that name.
    #[error("unknown macro '{name}' in domain '{domain}'")]
    MacroNotFound {
        /// Requested domain.
        domain: String,
        /// Requested macro name.
        name: String,
    },

    /// The macro itself failed.
    #[error(transparent)]
    Macro(MacroError),
}

impl DispatchError {
    /// Creates a forbidden error.
    #[must_use]
    pub fn forbidden(domain: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Forbidden {
            domain: domain.into(),
            name: name.into(),
        }
    }

    /// Creates an unknown domain error.
    #[must_use]
    pub fn domain_not_found(domain: impl Into<String>) -> Self {
        Self::DomainNotFound {
            domain: domain.into(),
        }
    }

    /// Creates an unknown macro error.
    #[must_use]
    pub fn macro_not_found(domain: impl Into<String>, name: impl Into<String>) -> Self {
        Self::MacroNotFound {
            domain: domain.into(),
            name: name.into(),
        }
    }

    /// Returns the macro's own error when the failure came from the handler.
    #[must_use]
    pub fn into_macro_error(self) -> Option<MacroError> {
        match self {
            Self::Macro(error) => Some(error),
            _ => None,
        }
    }
}
