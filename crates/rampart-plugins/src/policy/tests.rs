//! Unit tests for the validator policy.

use rstest::rstest;

use super::*;

#[rstest]
#[case::system("system")]
#[case::founder("founder")]
#[case::registry("registry")]
fn default_policy_reserves_host_namespaces(#[case] namespace: &str) {
    assert!(ValidatorPolicy::default().is_reserved(namespace));
}

#[test]
fn ordinary_namespaces_are_not_reserved() {
    let policy = ValidatorPolicy::default();
    assert!(!policy.is_reserved("acme"));
    assert!(!policy.is_reserved("generated"));
}

#[rstest]
#[case::events_generated("events", true, true)]
#[case::dtus_human("dtus", false, true)]
#[case::dtus_generated("dtus", true, false)]
#[case::lens_root("lens", false, false)]
#[case::lens_state("lens.state", false, true)]
#[case::sessions_generated("sessions.notes", true, false)]
fn writable_targets_depend_on_plugin_kind(
    #[case] target: &str,
    #[case] generated: bool,
    #[case] expected: bool,
) {
    assert_eq!(
        ValidatorPolicy::default().is_writable(target, generated),
        expected
    );
}

#[test]
fn builder_extends_lists() {
    let policy = ValidatorPolicy::default()
        .reserve_namespace("billing")
        .allow_read_root("inventory")
        .allow_generated_write("inventory.cache");
    assert!(policy.is_reserved("billing"));
    assert!(policy.is_readable_root("inventory"));
    assert!(policy.is_writable("inventory.cache", true));
    assert!(policy.is_writable("inventory.cache", false));
}

#[test]
fn allow_write_leaves_generated_list_alone() {
    let policy = ValidatorPolicy::default().allow_write("audit");
    assert!(policy.is_writable("audit", false));
    assert!(!policy.is_writable("audit", true));
}

#[test]
fn custom_rules_are_appended() {
    let base = ValidatorPolicy::default();
    let policy = base
        .clone()
        .prohibit(PatternRule::new("debugger", r"\bdebugger\b"))
        .prohibit_for_generated(PatternRule::new("console", r"\bconsole\."));
    assert_eq!(policy.prohibited().len(), base.prohibited().len() + 1);
    assert_eq!(
        policy.generated_prohibited().last().map(PatternRule::label),
        Some("console")
    );
}
