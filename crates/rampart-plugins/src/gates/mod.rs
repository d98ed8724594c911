//! The four validation gates.
//!
//! Each gate inspects one concern and returns its own error list. Gates never
//! short-circuit one another; the validator runs all of them and aggregates.

mod dependency;
mod namespace;
mod patterns;
mod shape;

use std::fmt;

use serde::Serialize;

pub(crate) use self::dependency::check_dependencies;
pub(crate) use self::namespace::check_namespace;
pub(crate) use self::patterns::CompiledPatterns;
pub(crate) use self::shape::check_shape;

/// Identifies a validation gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateName {
    /// Identity fields and lifecycle callables.
    Shape,
    /// Reserved and generated namespace rules.
    Namespace,
    /// Textual deny-list over the source.
    ProhibitedPatterns,
    /// Declared read/write intent.
    DependencyDeclaration,
}

impl GateName {
    /// Gates in evaluation order.
    pub const ALL: [Self; 4] = [
        Self::Shape,
        Self::Namespace,
        Self::ProhibitedPatterns,
        Self::DependencyDeclaration,
    ];

    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shape => "shape",
            Self::Namespace => "namespace",
            Self::ProhibitedPatterns => "prohibited_patterns",
            Self::DependencyDeclaration => "dependency_declaration",
        }
    }
}

impl fmt::Display for GateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateResult {
    name: GateName,
    passed: bool,
    errors: Vec<String>,
}

impl GateResult {
    /// Builds a result; the gate passes when `errors` is empty.
    #[must_use]
    pub fn new(name: GateName, errors: Vec<String>) -> Self {
        Self {
            name,
            passed: errors.is_empty(),
            errors,
        }
    }

    /// Returns the gate this result belongs to.
    #[must_use]
    pub const fn name(&self) -> GateName {
        self.name
    }

    /// Returns `true` when the gate found nothing to report.
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.passed
    }

    /// Returns the gate's error messages without the gate prefix.
    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Returns the error messages prefixed with the gate name.
    pub fn prefixed_errors(&self) -> impl Iterator<Item = String> + '_ {
        self.errors
            .iter()
            .map(move |error| format!("{}: {error}", self.name))
    }
}

/// Returns the top segment of a dotted identifier.
fn top_segment(dotted: &str) -> &str {
    dotted.split('.').next().unwrap_or(dotted)
}
