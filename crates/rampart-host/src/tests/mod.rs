//! Crate-level integration and BDD tests.

use std::sync::Arc;

use mockall::mock;
use rampart_config::Config;
use rampart_dispatch::{
    Actor, DispatchError, GuardEvent, GuardVerdict, MacroContext, RequestMeta, SafetyGuard,
    Severity,
};
use rampart_plugins::ValidateOptions;

use crate::bootstrap::{HostCollaborators, StaticConfigLoader};
use crate::health::StructuredHealthReporter;
use crate::host::Host;

pub(crate) mod support;

use self::support::{Journal, StubPlugin};

mock! {
    Guard {}
    impl SafetyGuard for Guard {
        fn evaluate(&self, event: &GuardEvent) -> GuardVerdict;
    }
}

#[test]
fn injected_guard_governs_plugin_macros() {
    let mut guard = MockGuard::new();
    guard
        .expect_evaluate()
        .withf(|event| event.domain == "acme.notes" && event.name == "purge")
        .times(2)
        .returning(|_| GuardVerdict::reject("purge needs review", Severity::High));

    let collaborators = HostCollaborators::default().with_guard(Arc::new(guard));
    let mut host = Host::bootstrap_with(
        &StaticConfigLoader::new(Config::default()),
        Arc::new(StructuredHealthReporter::new()),
        collaborators,
    )
    .expect("bootstrap succeeds");

    let journal = Journal::default();
    let plugin = StubPlugin::new("acme.notes", &journal).with_macro("purge");
    host.load_plugin(plugin.into_arc(), ValidateOptions::new())
        .expect("plugin loads");

    let request = MacroContext::from_request(None, RequestMeta::new("POST", "/api/notes/purge"));
    let rejected = host
        .run_macro("acme.notes", "purge", None, &request)
        .expect_err("guard rejects user-facing call");
    assert!(matches!(
        rejected,
        DispatchError::GuardRejected { severity: Severity::High, .. }
    ));

    let internal = host
        .run_macro(
            "acme.notes",
            "purge",
            None,
            &MacroContext::internal(Actor::system()),
        )
        .expect("internal system tick survives rejection");
    assert_eq!(internal["macro"], "purge");
    assert!(host.shutdown().is_empty());
}
