//! Collaborators consulted by the dispatcher.
//!
//! Authorization, safety evaluation, founder overrides and auditing are all
//! injected at construction. The defaults allow everything and log guard
//! decisions through `tracing`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::{Actor, MacroContext};

/// Tracing target for guard decisions.
pub(crate) const GUARD_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::guard");

/// Decides whether an actor may invoke a macro at all.
pub trait Authorizer: Send + Sync {
    /// Returns `true` when `actor` may run `domain.name`.
    fn authorize(&self, actor: &Actor, domain: &str, name: &str) -> bool;
}

/// Authorizer that accepts every actor.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn authorize(&self, _actor: &Actor, _domain: &str, _name: &str) -> bool {
        true
    }
}

/// How serious a guard rejection is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational; nothing was wrong.
    #[default]
    Info,
    /// Minor concern.
    Low,
    /// Noteworthy concern.
    Medium,
    /// Serious concern.
    High,
    /// The action must not proceed.
    Critical,
}

impl Severity {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A proposed action presented to the safety guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardEvent {
    /// Kind of action; always `macro` for dispatch.
    pub kind: &'static str,
    /// Target domain.
    pub domain: String,
    /// Target macro name.
    pub name: String,
    /// Input the macro would receive.
    pub input: Value,
    /// Caller context, with the default actor applied.
    pub ctx: MacroContext,
}

impl GuardEvent {
    /// Builds a macro invocation event.
    #[must_use]
    pub fn for_macro(domain: &str, name: &str, input: &Value, ctx: &MacroContext) -> Self {
        Self {
            kind: "macro",
            domain: domain.to_owned(),
            name: name.to_owned(),
            input: input.clone(),
            ctx: ctx.clone(),
        }
    }
}

/// The safety guard's answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardVerdict {
    /// Whether the action may proceed.
    pub ok: bool,
    /// Why the action was rejected.
    #[serde(default)]
    pub reason: Option<String>,
    /// How serious the rejection is.
    #[serde(default)]
    pub severity: Severity,
}

impl GuardVerdict {
    /// An approving verdict.
    #[must_use]
    pub const fn allow() -> Self {
        Self {
            ok: true,
            reason: None,
            severity: Severity::Info,
        }
    }

    /// A rejecting verdict.
    #[must_use]
    pub fn reject(reason: impl Into<String>, severity: Severity) -> Self {
        Self {
            ok: false,
            reason: Some(reason.into()),
            severity,
        }
    }
}

/// Evaluates proposed actions against the host's safety invariants.
pub trait SafetyGuard: Send + Sync {
    /// Returns the verdict for `event`.
    fn evaluate(&self, event: &GuardEvent) -> GuardVerdict;
}

/// Guard that approves everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct PermissiveGuard;

impl SafetyGuard for PermissiveGuard {
    fn evaluate(&self, _event: &GuardEvent) -> GuardVerdict {
        GuardVerdict::allow()
    }
}

/// Decides whether a founder may override a guard rejection.
///
/// Only consulted when the caller explicitly requested an override.
pub trait FounderOverride: Send + Sync {
    /// Returns `true` when the rejected `event` may proceed anyway.
    fn approves(&self, event: &GuardEvent) -> bool;
}

/// Override policy that never approves.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOverride;

impl FounderOverride for NoOverride {
    fn approves(&self, _event: &GuardEvent) -> bool {
        false
    }
}

/// Record of one guard evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuardDecision {
    /// Target domain.
    pub domain: String,
    /// Target macro name.
    pub name: String,
    /// The guard's verdict.
    pub ok: bool,
    /// Severity reported by the guard.
    pub severity: Severity,
    /// Rejection reason, if any.
    pub reason: Option<String>,
    /// A rejection was overridden and the call proceeded.
    pub allow_override: bool,
}

/// Sink for guard decisions.
pub trait GuardAudit: Send + Sync {
    /// Records a decision.
    fn record(&self, decision: &GuardDecision);
}

/// Audit sink that emits structured `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingGuardAudit;

impl GuardAudit for TracingGuardAudit {
    fn record(&self, decision: &GuardDecision) {
        if decision.ok {
            tracing::debug!(
                target: GUARD_TARGET,
                event = "guard_decision",
                domain = %decision.domain,
                name = %decision.name,
                ok = true,
                "guard approved macro"
            );
        } else {
            tracing::warn!(
                target: GUARD_TARGET,
                event = "guard_decision",
                domain = %decision.domain,
                name = %decision.name,
                ok = false,
                severity = %decision.severity,
                reason = decision.reason.as_deref().unwrap_or_default(),
                allow_override = decision.allow_override,
                "guard rejected macro"
            );
        }
    }
}
