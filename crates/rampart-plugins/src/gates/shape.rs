//! Gate `shape`: identity and callable structure.

use crate::module::{ExportValue, ModuleExports};

/// Returns `true` for `segment(.segment)+` with lowercase alphanumeric or
/// hyphen segments.
pub(super) fn is_valid_id(id: &str) -> bool {
    let mut segments = 0_usize;
    for segment in id.split('.') {
        let well_formed = !segment.is_empty()
            && segment
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !well_formed {
            return false;
        }
        segments += 1;
    }
    segments >= 2
}

/// Returns `true` when `version` starts with numeric `MAJOR.MINOR.PATCH`.
pub(super) fn has_semver_prefix(version: &str) -> bool {
    let mut rest = version;
    for position in 0..3 {
        let digits = rest.chars().take_while(char::is_ascii_digit).count();
        if digits == 0 {
            return false;
        }
        rest = rest.get(digits..).unwrap_or_default();
        if position < 2 {
            match rest.strip_prefix('.') {
                Some(tail) => rest = tail,
                None => return false,
            }
        }
    }
    true
}

fn require_text<'a>(
    exports: &'a ModuleExports,
    field: &str,
    errors: &mut Vec<String>,
) -> Option<&'a str> {
    match exports.get(field) {
        None => {
            errors.push(format!("{field} is missing"));
            None
        }
        Some(value) => {
            let text = value.as_text();
            if text.is_none() {
                errors.push(format!("{field} must be a string, found {}", value.kind()));
            }
            text
        }
    }
}

fn require_function(exports: &ModuleExports, field: &str, errors: &mut Vec<String>) {
    match exports.get(field) {
        Some(ExportValue::Function) => {}
        Some(other) => errors.push(format!("{field} must be a function, found {}", other.kind())),
        None => errors.push(format!("{field} must be a function")),
    }
}

fn optional_table(exports: &ModuleExports, field: &str, errors: &mut Vec<String>) {
    if let Some(value) = exports.get(field)
        && value.as_table().is_none()
    {
        errors.push(format!("{field} must be a table, found {}", value.kind()));
    }
}

/// Checks identity fields and callable structure.
pub(crate) fn check_shape(exports: &ModuleExports) -> Vec<String> {
    let mut errors = Vec::new();

    if let Some(id) = require_text(exports, "id", &mut errors)
        && !is_valid_id(id)
    {
        errors.push(format!(
            "id '{id}' must be dotted lowercase segments such as 'namespace.name'"
        ));
    }
    require_text(exports, "name", &mut errors);
    if let Some(version) = require_text(exports, "version", &mut errors)
        && !has_semver_prefix(version)
    {
        errors.push(format!(
            "version '{version}' must start with MAJOR.MINOR.PATCH"
        ));
    }
    require_function(exports, "init", &mut errors);
    require_function(exports, "destroy", &mut errors);
    optional_table(exports, "macros", &mut errors);
    optional_table(exports, "hooks", &mut errors);
    if let Some(tick) = exports.get("tick")
        && !tick.is_function()
    {
        errors.push(format!("tick must be a function, found {}", tick.kind()));
    }
    errors
}
