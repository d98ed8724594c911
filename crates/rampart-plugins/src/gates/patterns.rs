//! Gate `prohibited_patterns`: textual deny-list over the source.
//!
//! Matching is purely lexical. Obfuscated code defeats it; the gate exists to
//! catch accidental or careless use of dangerous primitives.

use regex::Regex;

use crate::error::PluginError;
use crate::policy::{PatternRule, ValidatorPolicy};

#[derive(Debug, Clone)]
struct CompiledRule {
    label: String,
    regex: Regex,
}

impl CompiledRule {
    fn compile(rule: &PatternRule) -> Result<Self, PluginError> {
        let regex = Regex::new(rule.pattern()).map_err(|source| PluginError::Pattern {
            label: rule.label().to_owned(),
            source,
        })?;
        Ok(Self {
            label: rule.label().to_owned(),
            regex,
        })
    }
}

/// Deny-list rules compiled once per validator.
#[derive(Debug, Clone)]
pub(crate) struct CompiledPatterns {
    base: Vec<CompiledRule>,
    generated: Vec<CompiledRule>,
}

impl CompiledPatterns {
    /// Compiles every rule in the policy.
    pub(crate) fn compile(policy: &ValidatorPolicy) -> Result<Self, PluginError> {
        let compile_all = |rules: &[PatternRule]| {
            rules
                .iter()
                .map(CompiledRule::compile)
                .collect::<Result<Vec<_>, _>>()
        };
        Ok(Self {
            base: compile_all(policy.prohibited())?,
            generated: compile_all(policy.generated_prohibited())?,
        })
    }

    /// Reports every rule the source matches. Without source the gate passes.
    pub(crate) fn check(&self, source: Option<&str>, generated: bool) -> Vec<String> {
        let Some(source) = source else {
            return Vec::new();
        };
        let extra: &[CompiledRule] = if generated { &self.generated } else { &[] };
        self.base
            .iter()
            .chain(extra)
            .filter(|rule| rule.regex.is_match(source))
            .map(|rule| format!("source contains prohibited pattern: {}", rule.label))
            .collect()
    }
}
