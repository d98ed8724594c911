//! Gate `namespace`: keeps plugins out of host-owned namespaces.

use std::collections::BTreeSet;

use super::top_segment;
use crate::module::ModuleExports;
use crate::policy::ValidatorPolicy;

/// Checks the id and declared macro names against namespace rules.
pub(crate) fn check_namespace(
    exports: &ModuleExports,
    loaded_ids: &BTreeSet<String>,
    generated: bool,
    policy: &ValidatorPolicy,
) -> Vec<String> {
    let mut errors = Vec::new();

    if let Some(id) = exports.text("id") {
        let namespace = top_segment(id);
        if generated && namespace != policy.generated_namespace() {
            errors.push(format!(
                "generated plugin '{id}' must live in the '{}' namespace",
                policy.generated_namespace()
            ));
        }
        if policy.is_reserved(namespace) {
            errors.push(format!("namespace '{namespace}' is reserved"));
        }
        if loaded_ids.contains(id) {
            errors.push(format!("id '{id}' is already loaded"));
        }
    }

    for name in exports.macro_names() {
        let namespace = top_segment(name);
        if policy.is_reserved(namespace) {
            errors.push(format!(
                "macro '{name}' uses reserved namespace '{namespace}'"
            ));
        }
    }
    errors
}
