//! Unit tests for guarded dispatch.

use std::sync::Mutex;

use mockall::mock;
use mockall::predicate::always;
use rstest::{fixture, rstest};
use serde_json::json;

use super::*;
use crate::context::{RequestMeta, Role};
use crate::guard::Severity;
use crate::handler::from_fn;

mock! {
    Guard {}
    impl SafetyGuard for Guard {
        fn evaluate(&self, event: &GuardEvent) -> GuardVerdict;
    }
}

mock! {
    Gate {}
    impl Authorizer for Gate {
        fn authorize(&self, actor: &Actor, domain: &str, name: &str) -> bool;
    }
}

mock! {
    Founder {}
    impl FounderOverride for Founder {
        fn approves(&self, event: &GuardEvent) -> bool;
    }
}

#[derive(Default)]
struct RecordingAudit {
    decisions: Mutex<Vec<GuardDecision>>,
}

impl RecordingAudit {
    fn decisions(&self) -> Vec<GuardDecision> {
        self.decisions.lock().expect("audit mutex poisoned").clone()
    }
}

impl GuardAudit for RecordingAudit {
    fn record(&self, decision: &GuardDecision) {
        self.decisions
            .lock()
            .expect("audit mutex poisoned")
            .push(decision.clone());
    }
}

#[fixture]
fn registry() -> Arc<MacroRegistry> {
    let registry = Arc::new(MacroRegistry::new());
    registry.register(
        "dtu",
        "create",
        from_fn(|_ctx, input| Ok(json!({"created": input}))),
    );
    registry.register("dtu", "list", from_fn(|_ctx, _input| Ok(json!([]))));
    registry.register(
        "whoami",
        "role",
        from_fn(|ctx, _input| {
            let role = ctx.actor.as_ref().map(|actor| actor.role.as_str());
            Ok(json!(role))
        }),
    );
    registry.register(
        "dtu",
        "fail",
        from_fn(|_ctx, _input| Err("store offline".into())),
    );
    registry
}

fn rejecting_guard(times: usize) -> Arc<MockGuard> {
    let mut guard = MockGuard::new();
    guard
        .expect_evaluate()
        .times(times)
        .returning(|_| GuardVerdict::reject("would violate invariants", Severity::High));
    Arc::new(guard)
}

fn http(method: &str, path: &str) -> MacroContext {
    MacroContext::from_request(Some(Actor::new(Role::User, ["*"])), RequestMeta::new(method, path))
}

// ---------------------------------------------------------------------------
// Authorization
// ---------------------------------------------------------------------------

#[rstest]
fn default_actor_is_applied(registry: Arc<MacroRegistry>) {
    let dispatcher = Dispatcher::new(registry);
    let output = dispatcher
        .run_macro("whoami", "role", None, &MacroContext::new())
        .expect("default actor runs");
    assert_eq!(output, json!("owner"));
}

#[rstest]
#[case::absent(None)]
#[case::null(Some(Value::Null))]
fn missing_input_becomes_empty_object(
    registry: Arc<MacroRegistry>,
    #[case] input: Option<Value>,
) {
    let dispatcher = Dispatcher::new(registry);
    let output = dispatcher
        .run_macro("dtu", "create", input, &MacroContext::new())
        .expect("create runs");
    assert_eq!(output, json!({"created": {}}));
}

#[rstest]
fn missing_actor_without_default_is_forbidden(registry: Arc<MacroRegistry>) {
    let dispatcher = Dispatcher::new(registry)
        .with_policy(DispatchPolicy::default().without_default_actor());
    let error = dispatcher
        .run_macro("dtu", "list", None, &MacroContext::new())
        .expect_err("no actor");
    assert!(matches!(error, DispatchError::Forbidden { .. }));
}

#[rstest]
fn authorizer_refusal_is_forbidden(registry: Arc<MacroRegistry>) {
    let mut gate = MockGate::new();
    gate.expect_authorize()
        .withf(|actor, domain, name| actor.role == Role::Guest && domain == "dtu" && name == "create")
        .times(1)
        .return_const(false);
    let mut guard = MockGuard::new();
    guard.expect_evaluate().never();

    let dispatcher = Dispatcher::new(registry)
        .with_authorizer(Arc::new(gate))
        .with_guard(Arc::new(guard));
    let ctx = MacroContext::internal(Actor::new(Role::Guest, Vec::<String>::new()));
    let error = dispatcher
        .run_macro("dtu", "create", None, &ctx)
        .expect_err("refused");
    assert!(matches!(
        error,
        DispatchError::Forbidden { ref domain, ref name } if domain == "dtu" && name == "create"
    ));
}

// ---------------------------------------------------------------------------
// Safe reads
// ---------------------------------------------------------------------------

#[rstest]
fn safe_read_path_never_consults_guard(registry: Arc<MacroRegistry>) {
    let mut guard = MockGuard::new();
    guard.expect_evaluate().never();
    let audit = Arc::new(RecordingAudit::default());
    let dispatcher = Dispatcher::new(registry)
        .with_guard(Arc::new(guard))
        .with_audit(audit.clone());

    let output = dispatcher
        .run_macro("dtu", "create", None, &http("GET", "/api/dtus/42?full=1"))
        .expect("safe read bypasses guard");
    assert_eq!(output, json!({"created": {}}));
    assert!(audit.decisions().is_empty());
}

#[rstest]
fn safe_read_macro_never_consults_guard(registry: Arc<MacroRegistry>) {
    let mut guard = MockGuard::new();
    guard.expect_evaluate().never();
    let dispatcher = Dispatcher::new(registry).with_guard(Arc::new(guard));
    let output = dispatcher
        .run_macro("dtu", "list", None, &http("POST", "/api/macros/run"))
        .expect("safe read macro");
    assert_eq!(output, json!([]));
}

// ---------------------------------------------------------------------------
// Guard rejection and exemptions
// ---------------------------------------------------------------------------

#[rstest]
fn rejection_without_exemption_fails(registry: Arc<MacroRegistry>) {
    let audit = Arc::new(RecordingAudit::default());
    let dispatcher = Dispatcher::new(registry)
        .with_guard(rejecting_guard(1))
        .with_audit(audit.clone());
    let error = dispatcher
        .run_macro("dtu", "create", Some(json!({"title": "x"})), &http("POST", "/api/dtus"))
        .expect_err("guard rejects");

    match error {
        DispatchError::GuardRejected {
            domain,
            name,
            reason,
            severity,
        } => {
            assert_eq!((domain.as_str(), name.as_str()), ("dtu", "create"));
            assert_eq!(reason, "would violate invariants");
            assert_eq!(severity, Severity::High);
        }
        other => panic!("expected guard rejection, got {other}"),
    }
    let decisions = audit.decisions();
    assert_eq!(decisions.len(), 1);
    assert!(decisions.iter().all(|d| !d.ok && !d.allow_override));
}

#[rstest]
fn rejection_is_exempt_under_safe_read_alias(registry: Arc<MacroRegistry>) {
    let dispatcher = Dispatcher::new(registry).with_guard(rejecting_guard(1));
    let request = RequestMeta::new("GET", "/internal/rewrite").with_original_url("/api/goals");
    let ctx = MacroContext::from_request(None, request);
    dispatcher
        .run_macro("dtu", "create", None, &ctx)
        .expect("alias is a safe read");
}

#[rstest]
#[case::system(Role::System)]
#[case::owner(Role::Owner)]
#[case::founder(Role::Founder)]
fn internal_tick_from_trusted_role_is_exempt(registry: Arc<MacroRegistry>, #[case] role: Role) {
    let audit = Arc::new(RecordingAudit::default());
    let dispatcher = Dispatcher::new(registry)
        .with_guard(rejecting_guard(1))
        .with_audit(audit.clone());
    let ctx = MacroContext::internal(Actor::new(role, ["*"]));
    dispatcher
        .run_macro("dtu", "create", None, &ctx)
        .expect("internal tick proceeds");
    assert!(audit.decisions().iter().all(|d| d.allow_override));
}

#[rstest]
fn internal_call_from_untrusted_role_is_rejected(registry: Arc<MacroRegistry>) {
    let dispatcher = Dispatcher::new(registry).with_guard(rejecting_guard(1));
    let ctx = MacroContext::internal(Actor::new(Role::User, ["*"]));
    let error = dispatcher
        .run_macro("dtu", "create", None, &ctx)
        .expect_err("untrusted internal call");
    assert!(matches!(error, DispatchError::GuardRejected { .. }));
}

#[rstest]
fn http_call_from_owner_is_not_an_internal_tick(registry: Arc<MacroRegistry>) {
    let dispatcher = Dispatcher::new(registry).with_guard(rejecting_guard(1));
    let ctx = MacroContext::from_request(Some(Actor::owner()), RequestMeta::new("POST", "/api/dtus"));
    assert!(dispatcher.run_macro("dtu", "create", None, &ctx).is_err());
}

#[rstest]
#[case::request_flag(true, None)]
#[case::input_flag(false, Some(json!({"override": true})))]
fn approved_founder_override_is_exempt(
    registry: Arc<MacroRegistry>,
    #[case] flag: bool,
    #[case] input: Option<Value>,
) {
    let mut founder = MockFounder::new();
    founder
        .expect_approves()
        .with(always())
        .times(1)
        .return_const(true);
    let dispatcher = Dispatcher::new(registry)
        .with_guard(rejecting_guard(1))
        .with_founder_override(Arc::new(founder));
    let mut request = RequestMeta::new("POST", "/api/dtus");
    request.override_requested = flag;
    let ctx = MacroContext::from_request(Some(Actor::new(Role::Founder, ["*"])), request);
    dispatcher
        .run_macro("dtu", "create", input, &ctx)
        .expect("override approved");
}

#[rstest]
fn override_is_not_consulted_unless_requested(registry: Arc<MacroRegistry>) {
    let mut founder = MockFounder::new();
    founder.expect_approves().never();
    let dispatcher = Dispatcher::new(registry)
        .with_guard(rejecting_guard(1))
        .with_founder_override(Arc::new(founder));
    let result = dispatcher.run_macro(
        "dtu",
        "create",
        Some(json!({"override": "yes"})),
        &http("POST", "/api/dtus"),
    );
    assert!(result.is_err());
}

#[rstest]
fn declined_override_is_rejected(registry: Arc<MacroRegistry>) {
    let mut founder = MockFounder::new();
    founder.expect_approves().times(1).return_const(false);
    let dispatcher = Dispatcher::new(registry)
        .with_guard(rejecting_guard(1))
        .with_founder_override(Arc::new(founder));
    let request = RequestMeta::new("POST", "/api/dtus").requesting_override();
    let ctx = MacroContext::from_request(Some(Actor::new(Role::Admin, ["*"])), request);
    assert!(matches!(
        dispatcher.run_macro("dtu", "create", None, &ctx),
        Err(DispatchError::GuardRejected { .. })
    ));
}

// ---------------------------------------------------------------------------
// Resolution and invocation
// ---------------------------------------------------------------------------

#[rstest]
fn guard_sees_the_macro_event(registry: Arc<MacroRegistry>) {
    let mut guard = MockGuard::new();
    guard
        .expect_evaluate()
        .withf(|event| {
            event.kind == "macro"
                && event.domain == "dtu"
                && event.name == "create"
                && event.input == json!({"title": "x"})
                && event.ctx.actor.as_ref().is_some_and(|a| a.role == Role::User)
        })
        .times(1)
        .returning(|_| GuardVerdict::allow());
    let dispatcher = Dispatcher::new(registry).with_guard(Arc::new(guard));
    dispatcher
        .run_macro("dtu", "create", Some(json!({"title": "x"})), &http("POST", "/api/dtus"))
        .expect("guard approves");
}

#[rstest]
#[case::domain("billing", "charge")]
#[case::name("dtu", "purge")]
fn unknown_targets_are_reported(
    registry: Arc<MacroRegistry>,
    #[case] domain: &str,
    #[case] name: &str,
) {
    let dispatcher = Dispatcher::new(registry);
    let error = dispatcher
        .run_macro(domain, name, None, &MacroContext::new())
        .expect_err("unknown target");
    match (domain, error) {
        ("billing", DispatchError::DomainNotFound { .. })
        | ("dtu", DispatchError::MacroNotFound { .. }) => {}
        (_, other) => panic!("unexpected error: {other}"),
    }
}

#[rstest]
fn handler_errors_pass_through_unchanged(registry: Arc<MacroRegistry>) {
    let dispatcher = Dispatcher::new(registry);
    let error = dispatcher
        .run_macro("dtu", "fail", None, &MacroContext::new())
        .expect_err("handler fails");
    assert_eq!(error.to_string(), "store offline");
    assert!(error.into_macro_error().is_some());
}

#[rstest]
fn handlers_run_outside_the_registry_lock(registry: Arc<MacroRegistry>) {
    let inner = Arc::clone(&registry);
    registry.register(
        "plugins",
        "install",
        from_fn(move |_ctx, _input| {
            inner.register("plugins", "installed", from_fn(|_ctx, _input| Ok(Value::Null)));
            Ok(json!(inner.len()))
        }),
    );
    let dispatcher = Dispatcher::new(Arc::clone(&registry));
    dispatcher
        .run_macro("plugins", "install", None, &MacroContext::new())
        .expect("registration from inside a handler");
    assert!(registry.contains("plugins", "installed"));
}
