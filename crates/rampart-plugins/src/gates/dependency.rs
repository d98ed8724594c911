//! Gate `dependency_declaration`: declared state access stays within bounds.

use super::top_segment;
use crate::module::{ExportValue, Intent, ModuleExports};
use crate::policy::ValidatorPolicy;

/// Checks the declared intent, passing when none is declared.
pub(crate) fn check_dependencies(
    exports: &ModuleExports,
    generated: bool,
    policy: &ValidatorPolicy,
) -> Vec<String> {
    let Some(declared) = exports.get("intent") else {
        return Vec::new();
    };
    let intent = match declared {
        ExportValue::Data(value) => Intent::from_value(value),
        ExportValue::Function | ExportValue::Table(_) => None,
    };
    let Some(intent) = intent else {
        return vec!["intent 'reads' and 'writes' must be string arrays".to_owned()];
    };

    let mut errors = Vec::new();
    for target in &intent.reads {
        if !policy.is_readable_root(top_segment(target)) {
            errors.push(format!("read target '{target}' is not readable"));
        }
    }
    for target in &intent.writes {
        if !policy.is_writable(target, generated) {
            let who = if generated { "generated plugins" } else { "plugins" };
            errors.push(format!("write target '{target}' is not writable by {who}"));
        }
    }
    errors
}
