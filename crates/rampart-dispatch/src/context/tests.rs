//! Unit tests for call context types.

use rstest::rstest;

use super::*;

#[rstest]
#[case::lower("owner", Role::Owner)]
#[case::upper("FOUNDER", Role::Founder)]
#[case::padded(" system ", Role::System)]
fn role_parses(#[case] input: &str, #[case] expected: Role) {
    assert_eq!(input.parse::<Role>(), Ok(expected));
}

#[test]
fn role_rejects_unknown() {
    let error = "superuser".parse::<Role>().expect_err("unknown role");
    assert!(error.to_string().contains("superuser"));
}

#[test]
fn owner_holds_every_scope() {
    let owner = Actor::owner();
    assert_eq!(owner.role, Role::Owner);
    assert!(owner.has_scope("dtus:write"));
}

#[test]
fn scoped_actor_only_holds_granted_scopes() {
    let user = Actor::new(Role::User, ["dtus:read"]);
    assert!(user.has_scope("dtus:read"));
    assert!(!user.has_scope("dtus:write"));
}

#[test]
fn path_aliases_follow_fixed_order() {
    let request = RequestMeta::new("GET", "/a")
        .with_url("/d")
        .with_pathname("/b")
        .with_original_url("/c");
    let aliases: Vec<&str> = request.path_aliases().collect();
    assert_eq!(aliases, vec!["/a", "/b", "/c", "/d"]);
}

#[test]
fn missing_aliases_are_skipped() {
    let request = RequestMeta {
        method: "GET".into(),
        url: Some("/api/status".into()),
        ..RequestMeta::default()
    };
    assert_eq!(request.path_aliases().collect::<Vec<_>>(), vec!["/api/status"]);
}

#[rstest]
#[case::upper("GET", true)]
#[case::lower("get", true)]
#[case::post("POST", false)]
fn get_detection_ignores_case(#[case] method: &str, #[case] expected: bool) {
    assert_eq!(RequestMeta::new(method, "/").is_get(), expected);
}

#[test]
fn internal_context_has_no_request() {
    let ctx = MacroContext::internal(Actor::system());
    assert!(ctx.is_internal());
    let http = MacroContext::from_request(None, RequestMeta::new("POST", "/api/macros"));
    assert!(!http.is_internal());
}

#[test]
fn context_deserialises_from_request_layer_json() {
    let ctx: MacroContext = serde_json::from_value(serde_json::json!({
        "actor": {"role": "user", "scopes": ["dtus:read"]},
        "request": {"method": "GET", "original_url": "/api/goals", "override_requested": true}
    }))
    .expect("deserialise context");
    let request = ctx.request.expect("request present");
    assert_eq!(request.original_url.as_deref(), Some("/api/goals"));
    assert!(request.override_requested);
    assert_eq!(ctx.actor.map(|actor| actor.role), Some(Role::User));
}
