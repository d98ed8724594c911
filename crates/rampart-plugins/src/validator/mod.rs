//! Four-gate validation of candidate modules.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::PluginError;
use crate::gates::{
    CompiledPatterns, GateName, GateResult, check_dependencies, check_namespace, check_shape,
};
use crate::module::{ModuleExports, PluginModule};
use crate::policy::ValidatorPolicy;

/// Tracing target for validation decisions.
const VALIDATOR_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::validator");

/// Per-call inputs that are not part of the module itself.
///
/// # Example
///
/// ```
/// use rampart_plugins::ValidateOptions;
///
/// let options = ValidateOptions::new()
///     .generated(true)
///     .with_source("export function init() {}")
///     .with_loaded_ids(["generated.old"]);
/// assert!(options.is_generated());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidateOptions {
    loaded_ids: BTreeSet<String>,
    generated: bool,
    source_text: Option<String>,
}

impl ValidateOptions {
    /// Options for a human-authored module with no source text and nothing
    /// loaded yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the module as machine-generated.
    #[must_use]
    pub const fn generated(mut self, generated: bool) -> Self {
        self.generated = generated;
        self
    }

    /// Supplies the source text scanned by the deny-list.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source_text = Some(source.into());
        self
    }

    /// Supplies the ids already loaded into the host.
    #[must_use]
    pub fn with_loaded_ids<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.loaded_ids.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Returns `true` for machine-generated modules.
    #[must_use]
    pub const fn is_generated(&self) -> bool {
        self.generated
    }

    /// Returns the source text, if supplied.
    #[must_use]
    pub fn source_text(&self) -> Option<&str> {
        self.source_text.as_deref()
    }

    /// Returns the ids already loaded.
    #[must_use]
    pub const fn loaded_ids(&self) -> &BTreeSet<String> {
        &self.loaded_ids
    }
}

/// Aggregate outcome of all four gates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    valid: bool,
    gates: Vec<GateResult>,
    errors: Vec<String>,
}

impl ValidationResult {
    fn from_gates(gates: Vec<GateResult>) -> Self {
        let errors: Vec<String> = gates
            .iter()
            .flat_map(|gate| gate.prefixed_errors())
            .collect();
        Self {
            valid: gates.iter().all(GateResult::passed),
            gates,
            errors,
        }
    }

    /// Returns `true` when every gate passed.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.valid
    }

    /// Returns the per-gate results in evaluation order.
    #[must_use]
    pub fn gates(&self) -> &[GateResult] {
        &self.gates
    }

    /// Looks up the result of one gate.
    #[must_use]
    pub fn gate(&self, name: GateName) -> Option<&GateResult> {
        self.gates.iter().find(|gate| gate.name() == name)
    }

    /// Returns every error, each prefixed with its gate name.
    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Converts a failing result into an error for the module `id`.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::ValidationFailed`] when any gate failed.
    pub fn into_result(self, id: &str) -> Result<(), PluginError> {
        if self.valid {
            Ok(())
        } else {
            Err(PluginError::ValidationFailed {
                id: id.to_owned(),
                errors: self.errors,
            })
        }
    }
}

/// Runs candidate modules through the four gates.
///
/// The validator never executes candidate code; it only inspects exports and
/// source text.
#[derive(Debug, Clone)]
pub struct PluginValidator {
    policy: ValidatorPolicy,
    patterns: CompiledPatterns,
}

impl PluginValidator {
    /// Builds a validator for `policy`, compiling its deny-list.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Pattern`] when a rule is not a valid regular
    /// expression.
    pub fn new(policy: ValidatorPolicy) -> Result<Self, PluginError> {
        let patterns = CompiledPatterns::compile(&policy)?;
        Ok(Self { policy, patterns })
    }

    /// Builds a validator for the default policy.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Pattern`] if a built-in rule fails to compile.
    pub fn standard() -> Result<Self, PluginError> {
        Self::new(ValidatorPolicy::default())
    }

    /// Returns the policy in force.
    #[must_use]
    pub const fn policy(&self) -> &ValidatorPolicy {
        &self.policy
    }

    /// Validates an export view.
    #[must_use]
    pub fn validate(&self, exports: &ModuleExports, options: &ValidateOptions) -> ValidationResult {
        let generated = options.is_generated();
        let gates = vec![
            GateResult::new(GateName::Shape, check_shape(exports)),
            GateResult::new(
                GateName::Namespace,
                check_namespace(exports, options.loaded_ids(), generated, &self.policy),
            ),
            GateResult::new(
                GateName::ProhibitedPatterns,
                self.patterns.check(options.source_text(), generated),
            ),
            GateResult::new(
                GateName::DependencyDeclaration,
                check_dependencies(exports, generated, &self.policy),
            ),
        ];
        let result = ValidationResult::from_gates(gates);

        let id = exports.text("id").unwrap_or("<unnamed>");
        if result.is_valid() {
            tracing::debug!(target: VALIDATOR_TARGET, plugin = id, generated, "plugin passed validation");
        } else {
            tracing::info!(
                target: VALIDATOR_TARGET,
                plugin = id,
                generated,
                errors = ?result.errors(),
                "plugin rejected"
            );
        }
        result
    }

    /// Validates a typed plugin through its reflected export view.
    #[must_use]
    pub fn validate_module<P: PluginModule + ?Sized>(
        &self,
        plugin: &P,
        options: &ValidateOptions,
    ) -> ValidationResult {
        self.validate(&ModuleExports::reflect(plugin), options)
    }
}
