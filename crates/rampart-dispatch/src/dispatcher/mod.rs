//! Guarded macro dispatch.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use crate::context::{Actor, MacroContext};
use crate::error::DispatchError;
use crate::guard::{
    AllowAll, Authorizer, FounderOverride, GuardAudit, GuardDecision, GuardEvent, GuardVerdict,
    NoOverride, PermissiveGuard, SafetyGuard, TracingGuardAudit,
};
use crate::policy::DispatchPolicy;
use crate::registry::MacroRegistry;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Why a guard rejection was allowed to proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exemption {
    SafeReadAlias,
    InternalTick,
    FounderOverride,
}

impl Exemption {
    const fn as_str(self) -> &'static str {
        match self {
            Self::SafeReadAlias => "safe_read_alias",
            Self::InternalTick => "internal_tick",
            Self::FounderOverride => "founder_override",
        }
    }
}

/// Runs macros under the authorization and safety protocol.
///
/// Collaborators default to permissive implementations; hosts inject their
/// own through the `with_*` builders.
pub struct Dispatcher {
    registry: Arc<MacroRegistry>,
    policy: DispatchPolicy,
    authorizer: Arc<dyn Authorizer>,
    guard: Arc<dyn SafetyGuard>,
    founder_override: Arc<dyn FounderOverride>,
    audit: Arc<dyn GuardAudit>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Creates a dispatcher over `registry` with the default policy and
    /// permissive collaborators.
    #[must_use]
    pub fn new(registry: Arc<MacroRegistry>) -> Self {
        Self {
            registry,
            policy: DispatchPolicy::default(),
            authorizer: Arc::new(AllowAll),
            guard: Arc::new(PermissiveGuard),
            founder_override: Arc::new(NoOverride),
            audit: Arc::new(TracingGuardAudit),
        }
    }

    /// Replaces the dispatch policy.
    #[must_use]
    pub fn with_policy(mut self, policy: DispatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replaces the authorizer.
    #[must_use]
    pub fn with_authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer = authorizer;
        self
    }

    /// Replaces the safety guard.
    #[must_use]
    pub fn with_guard(mut self, guard: Arc<dyn SafetyGuard>) -> Self {
        self.guard = guard;
        self
    }

    /// Replaces the founder override policy.
    #[must_use]
    pub fn with_founder_override(mut self, founder_override: Arc<dyn FounderOverride>) -> Self {
        self.founder_override = founder_override;
        self
    }

    /// Replaces the guard audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn GuardAudit>) -> Self {
        self.audit = audit;
        self
    }

    /// Returns the registry macros are resolved from.
    #[must_use]
    pub const fn registry(&self) -> &Arc<MacroRegistry> {
        &self.registry
    }

    /// Returns the policy in force.
    #[must_use]
    pub const fn policy(&self) -> &DispatchPolicy {
        &self.policy
    }

    /// Runs `domain.name` with `input` (an empty object when `None` or
    /// JSON `null`).
    ///
    /// The handler receives `ctx` with the default actor applied when the
    /// caller supplied none.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::Forbidden`] when no actor is available or the
    ///   authorizer refuses it.
    /// - [`DispatchError::GuardRejected`] when the safety guard rejects the
    ///   call and no exemption applies.
    /// - [`DispatchError::DomainNotFound`] / [`DispatchError::MacroNotFound`]
    ///   when nothing is registered under the name.
    /// - [`DispatchError::Macro`] carrying the handler's own error.
    pub fn run_macro(
        &self,
        domain: &str,
        name: &str,
        input: Option<Value>,
        ctx: &MacroContext,
    ) -> Result<Value, DispatchError> {
        let actor = self.authorize(domain, name, ctx)?;
        let effective = MacroContext {
            actor: Some(actor),
            request: ctx.request.clone(),
        };
        let payload = match input {
            Some(Value::Null) | None => Value::Object(Map::new()),
            Some(value) => value,
        };

        if self.is_safe_read(domain, name, &effective) {
            debug!(target: DISPATCH_TARGET, domain, name, "safe read bypasses guard");
        } else {
            self.check_guard(domain, name, &payload, &effective)?;
        }

        let handler = self.registry.resolve(domain, name)?;
        handler
            .call(&effective, payload)
            .map_err(DispatchError::Macro)
    }

    fn authorize(
        &self,
        domain: &str,
        name: &str,
        ctx: &MacroContext,
    ) -> Result<Actor, DispatchError> {
        let actor = ctx
            .actor
            .as_ref()
            .or_else(|| self.policy.default_actor())
            .ok_or_else(|| DispatchError::forbidden(domain, name))?;
        if self.authorizer.authorize(actor, domain, name) {
            Ok(actor.clone())
        } else {
            debug!(target: DISPATCH_TARGET, domain, name, role = %actor.role, "authorizer refused actor");
            Err(DispatchError::forbidden(domain, name))
        }
    }

    fn is_safe_read(&self, domain: &str, name: &str, ctx: &MacroContext) -> bool {
        ctx.request
            .as_ref()
            .is_some_and(|request| self.policy.is_safe_read_request(request))
            || self.policy.is_safe_read_macro(domain, name)
    }

    fn check_guard(
        &self,
        domain: &str,
        name: &str,
        input: &Value,
        ctx: &MacroContext,
    ) -> Result<(), DispatchError> {
        let event = GuardEvent::for_macro(domain, name, input, ctx);
        let verdict = self.guard.evaluate(&event);
        let exemption = if verdict.ok {
            None
        } else {
            self.exemption(&event, input)
        };
        self.audit.record(&decision(domain, name, &verdict, exemption.is_some()));

        if verdict.ok {
            return Ok(());
        }
        if let Some(granted) = exemption {
            debug!(
                target: DISPATCH_TARGET,
                domain,
                name,
                exemption = granted.as_str(),
                "guard rejection overridden"
            );
            return Ok(());
        }
        Err(DispatchError::GuardRejected {
            domain: domain.to_owned(),
            name: name.to_owned(),
            reason: verdict
                .reason
                .unwrap_or_else(|| "rejected by safety guard".to_owned()),
            severity: verdict.severity,
        })
    }

    fn exemption(&self, event: &GuardEvent, input: &Value) -> Option<Exemption> {
        let ctx = &event.ctx;
        if ctx
            .request
            .as_ref()
            .is_some_and(|request| self.policy.is_safe_read_under_any_alias(request))
        {
            return Some(Exemption::SafeReadAlias);
        }
        let trusted = ctx
            .actor
            .as_ref()
            .is_some_and(|actor| self.policy.is_trusted(actor.role));
        if ctx.is_internal() && trusted {
            return Some(Exemption::InternalTick);
        }
        if override_requested(ctx, input) && self.founder_override.approves(event) {
            return Some(Exemption::FounderOverride);
        }
        None
    }
}

fn override_requested(ctx: &MacroContext, input: &Value) -> bool {
    ctx.request
        .as_ref()
        .is_some_and(|request| request.override_requested)
        || input.get("override") == Some(&Value::Bool(true))
}

fn decision(domain: &str, name: &str, verdict: &GuardVerdict, overridden: bool) -> GuardDecision {
    GuardDecision {
        domain: domain.to_owned(),
        name: name.to_owned(),
        ok: verdict.ok,
        severity: verdict.severity,
        reason: verdict.reason.clone(),
        allow_override: overridden,
    }
}

#[cfg(test)]
mod tests;
