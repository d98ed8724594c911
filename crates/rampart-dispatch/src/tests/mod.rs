//! Crate-level integration and BDD tests.

use std::sync::Arc;

use serde_json::json;

use crate::context::{Actor, MacroContext, RequestMeta, Role};
use crate::dispatcher::Dispatcher;
use crate::guard::{GuardEvent, GuardVerdict, SafetyGuard, Severity};
use crate::handler::from_fn;
use crate::policy::DispatchPolicy;
use crate::registry::MacroRegistry;


/// Rejects anything whose input carries `"destructive": true`.
struct DestructiveInputGuard;

impl SafetyGuard for DestructiveInputGuard {
    fn evaluate(&self, event: &GuardEvent) -> GuardVerdict {
        if event.input.get("destructive") == Some(&json!(true)) {
            GuardVerdict::reject("destructive input", Severity::Critical)
        } else {
            GuardVerdict::allow()
        }
    }
}

#[test]
fn multi_tenant_host_requires_explicit_actors() {
    let registry = Arc::new(MacroRegistry::new());
    registry.register(
        "dtu",
        "archive",
        from_fn(|_ctx, input| Ok(json!({"archived": input}))),
    );
    let dispatcher = Dispatcher::new(Arc::clone(&registry))
        .with_policy(DispatchPolicy::default().without_default_actor())
        .with_guard(Arc::new(DestructiveInputGuard));

    let anonymous = MacroContext::from_request(None, RequestMeta::new("POST", "/api/dtus"));
    assert!(dispatcher.run_macro("dtu", "archive", None, &anonymous).is_err());

    let user = MacroContext::from_request(
        Some(Actor::new(Role::User, ["dtus:write"])),
        RequestMeta::new("POST", "/api/dtus"),
    );
    let output = dispatcher
        .run_macro("dtu", "archive", Some(json!({"id": 4})), &user)
        .expect("benign input");
    assert_eq!(output, json!({"archived": {"id": 4}}));

    let rejected = dispatcher.run_macro("dtu", "archive", Some(json!({"destructive": true})), &user);
    assert!(rejected.is_err());
}
