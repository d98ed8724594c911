//! Unit tests for plugin error types.

use rstest::rstest;

use super::*;

#[test]
fn validation_failure_lists_every_error() {
    let error = PluginError::ValidationFailed {
        id: "acme.notes".into(),
        errors: vec![
            "shape: init must be a function".into(),
            "namespace: id 'acme.notes' is already loaded".into(),
        ],
    };
    let message = error.to_string();
    assert!(message.contains("acme.notes"), "missing id: {message}");
    assert!(
        message.contains("shape: init must be a function; namespace:"),
        "errors should be joined in order: {message}"
    );
}

#[test]
fn pattern_error_exposes_source() {
    let source = regex::Regex::new("(unclosed").expect_err("invalid regex");
    let error = PluginError::Pattern {
        label: "broken".into(),
        source,
    };
    assert!(error.to_string().contains("broken"));
    assert!(std::error::Error::source(&error).is_some());
}

#[rstest]
#[case::init(LifecyclePhase::Init, "init")]
#[case::tick(LifecyclePhase::Tick, "tick")]
#[case::destroy(LifecyclePhase::Destroy, "destroy")]
fn lifecycle_error_names_phase(#[case] phase: LifecyclePhase, #[case] label: &str) {
    let cause: HookError = "store unavailable".into();
    let error = PluginError::lifecycle("acme.notes", phase, &cause);
    let message = error.to_string();
    assert!(
        message.contains(&format!("during {label}")),
        "phase missing: {message}"
    );
    assert!(message.contains("store unavailable"), "cause missing: {message}");
}
