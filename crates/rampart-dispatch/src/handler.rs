//! The callable contract for macros.

use std::error::Error;

use serde::Serialize;
use serde_json::Value;

use crate::context::MacroContext;

/// Error type macro handlers return; surfaced to callers unchanged.
pub type MacroError = Box<dyn Error + Send + Sync>;

/// A registered macro callable.
pub trait MacroHandler: Send + Sync {
    /// Runs the macro with the caller's context and JSON input.
    ///
    /// # Errors
    ///
    /// Returns whatever failure the macro itself reports.
    fn call(&self, ctx: &MacroContext, input: Value) -> Result<Value, MacroError>;
}

impl<F> MacroHandler for F
where
    F: Fn(&MacroContext, Value) -> Result<Value, MacroError> + Send + Sync,
{
    fn call(&self, ctx: &MacroContext, input: Value) -> Result<Value, MacroError> {
        self(ctx, input)
    }
}

/// Pins a closure to the handler signature so its argument and error types
/// are inferred.
///
/// # Example
///
/// ```
/// use rampart_dispatch::{MacroContext, MacroHandler, handler};
/// use serde_json::json;
///
/// let echo = handler::from_fn(|_ctx, input| Ok(input));
/// let output = echo.call(&MacroContext::new(), json!({"n": 1})).expect("echo");
/// assert_eq!(output, json!({"n": 1}));
/// ```
pub const fn from_fn<F>(f: F) -> F
where
    F: Fn(&MacroContext, Value) -> Result<Value, MacroError> + Send + Sync,
{
    f
}

/// Descriptive listing entry for a registered macro.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MacroSpec {
    /// Domain the macro belongs to.
    pub domain: String,
    /// Name within the domain.
    pub name: String,
    /// Optional human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl MacroSpec {
    /// Creates a spec without a description.
    #[must_use]
    pub fn new(domain: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            name: name.into(),
            description: None,
        }
    }

    /// Attaches a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the dotted `domain.name` form.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.domain, self.name)
    }
}
