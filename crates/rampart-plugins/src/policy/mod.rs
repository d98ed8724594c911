//! Tunable lists the validator enforces.
//!
//! [`ValidatorPolicy::default`] carries the host's standard reserved
//! namespaces, state allow-lists and deny-list patterns. Hosts that expose
//! additional state or want a stricter lint adjust the policy before building
//! a [`PluginValidator`](crate::PluginValidator).

use std::collections::BTreeSet;

/// A labelled deny-list regular expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternRule {
    label: String,
    pattern: String,
}

impl PatternRule {
    /// Creates a rule; the pattern is compiled when the validator is built.
    #[must_use]
    pub fn new(label: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            pattern: pattern.into(),
        }
    }

    /// Returns the label reported when the rule matches.
    #[must_use]
    pub const fn label(&self) -> &str {
        self.label.as_str()
    }

    /// Returns the regular expression source.
    #[must_use]
    pub const fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

/// Modules that may not be loaded by plugin code.
const RESTRICTED_MODULES: &str =
    "child_process|fs|net|dgram|cluster|worker_threads|vm|http|https|tls|dns|os";

const RESERVED_NAMESPACES: [&str; 10] = [
    "system", "core", "kernel", "auth", "admin", "economy", "founder", "guard", "reality",
    "registry",
];

const READABLE_ROOTS: [&str; 9] = [
    "dtus", "goals", "lens", "settings", "events", "metrics", "plugins", "stats", "sessions",
];

const WRITABLE_TARGETS: [&str; 7] = [
    "dtus",
    "goals",
    "lens.state",
    "events",
    "metrics",
    "plugins.state",
    "sessions.notes",
];

const GENERATED_WRITABLE_TARGETS: [&str; 3] = ["events", "metrics", "plugins.state"];

fn base_rules() -> Vec<PatternRule> {
    let module = format!(r#"['"`](?:node:)?(?:{RESTRICTED_MODULES})(?:/[\w./-]*)?['"`]"#);
    vec![
        PatternRule::new(
            "process termination",
            r"\bprocess\s*\.\s*(?:exit|abort|kill)\b",
        ),
        PatternRule::new("eval", r"\beval\s*\("),
        PatternRule::new("dynamic Function construction", r"\bFunction\s*\("),
        PatternRule::new("restricted require", format!(r"\brequire\s*\(\s*{module}")),
        PatternRule::new("restricted dynamic import", format!(r"\bimport\s*\(\s*{module}")),
        PatternRule::new("restricted static import", format!(r"\bfrom\s+{module}")),
        PatternRule::new(
            "prototype manipulation",
            r"__proto__|\bsetPrototypeOf\b",
        ),
        PatternRule::new(
            "global object indexing",
            r"\b(?:globalThis|global|window|self)\s*\[",
        ),
    ]
}

fn generated_rules() -> Vec<PatternRule> {
    vec![
        PatternRule::new(
            "timer scheduling",
            r"\b(?:setTimeout|setInterval|setImmediate|queueMicrotask)\b",
        ),
        PatternRule::new(
            "outbound network access",
            r"\bfetch\s*\(|\b(?:XMLHttpRequest|WebSocket|EventSource)\b",
        ),
    ]
}

fn owned_set<const N: usize>(items: [&str; N]) -> BTreeSet<String> {
    items.into_iter().map(str::to_owned).collect()
}

/// Lists and patterns enforced by the validation gates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorPolicy {
    reserved_namespaces: BTreeSet<String>,
    generated_namespace: String,
    readable_roots: BTreeSet<String>,
    writable_targets: BTreeSet<String>,
    generated_writable_targets: BTreeSet<String>,
    prohibited: Vec<PatternRule>,
    generated_prohibited: Vec<PatternRule>,
}

impl Default for ValidatorPolicy {
    fn default() -> Self {
        Self {
            reserved_namespaces: owned_set(RESERVED_NAMESPACES),
            generated_namespace: "generated".to_owned(),
            readable_roots: owned_set(READABLE_ROOTS),
            writable_targets: owned_set(WRITABLE_TARGETS),
            generated_writable_targets: owned_set(GENERATED_WRITABLE_TARGETS),
            prohibited: base_rules(),
            generated_prohibited: generated_rules(),
        }
    }
}

impl ValidatorPolicy {
    /// Reserves an additional top-level namespace.
    #[must_use]
    pub fn reserve_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.reserved_namespaces.insert(namespace.into());
        self
    }

    /// Permits reads under an additional root segment.
    #[must_use]
    pub fn allow_read_root(mut self, root: impl Into<String>) -> Self {
        self.readable_roots.insert(root.into());
        self
    }

    /// Permits human-authored plugins to write an additional target.
    #[must_use]
    pub fn allow_write(mut self, target: impl Into<String>) -> Self {
        self.writable_targets.insert(target.into());
        self
    }

    /// Permits every plugin, generated ones included, to write a target.
    #[must_use]
    pub fn allow_generated_write(mut self, target: impl Into<String>) -> Self {
        let target = target.into();
        self.writable_targets.insert(target.clone());
        self.generated_writable_targets.insert(target);
        self
    }

    /// Adds a deny-list rule applied to every plugin.
    #[must_use]
    pub fn prohibit(mut self, rule: PatternRule) -> Self {
        self.prohibited.push(rule);
        self
    }

    /// Adds a deny-list rule applied only to generated plugins.
    #[must_use]
    pub fn prohibit_for_generated(mut self, rule: PatternRule) -> Self {
        self.generated_prohibited.push(rule);
        self
    }

    /// Returns `true` when `namespace` is reserved.
    #[must_use]
    pub fn is_reserved(&self, namespace: &str) -> bool {
        self.reserved_namespaces.contains(namespace)
    }

    /// Namespace generated plugins must live in.
    #[must_use]
    pub const fn generated_namespace(&self) -> &str {
        self.generated_namespace.as_str()
    }

    /// Returns `true` when reads under `root` are permitted.
    #[must_use]
    pub fn is_readable_root(&self, root: &str) -> bool {
        self.readable_roots.contains(root)
    }

    /// Returns `true` when `target` may be written by the given plugin kind.
    #[must_use]
    pub fn is_writable(&self, target: &str, generated: bool) -> bool {
        if generated {
            self.generated_writable_targets.contains(target)
        } else {
            self.writable_targets.contains(target)
        }
    }

    /// Rules applied to every plugin.
    #[must_use]
    pub fn prohibited(&self) -> &[PatternRule] {
        &self.prohibited
    }

    /// Rules applied only to generated plugins.
    #[must_use]
    pub fn generated_prohibited(&self) -> &[PatternRule] {
        &self.generated_prohibited
    }
}

#[cfg(test)]
mod tests;
