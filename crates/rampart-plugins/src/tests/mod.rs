//! Crate-level integration and BDD tests.

use crate::error::PluginError;
use crate::module::{ExportValue, ModuleExports};
use crate::validator::{PluginValidator, ValidateOptions};


#[test]
fn rejected_plugin_surfaces_every_gate_error() {
    let validator = PluginValidator::standard().expect("default rules compile");
    let candidate = ModuleExports::new()
        .with("id", ExportValue::text("Kernel"))
        .with("name", ExportValue::text("Kernel"))
        .with("version", ExportValue::text("1"))
        .with("init", ExportValue::Function);
    let options = ValidateOptions::new()
        .generated(true)
        .with_source("setInterval(poll, 10)");

    let error = validator
        .validate(&candidate, &options)
        .into_result("Kernel")
        .expect_err("candidate is rejected");
    let PluginError::ValidationFailed { errors, .. } = error else {
        panic!("expected validation failure, got {error}");
    };
    for gate in ["shape", "namespace", "prohibited_patterns"] {
        assert!(
            errors.iter().any(|e| e.starts_with(&format!("{gate}: "))),
            "missing {gate} error in {errors:?}"
        );
    }
}
