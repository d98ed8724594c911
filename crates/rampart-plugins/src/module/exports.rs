//! Reflected view of what a module exports.

use std::collections::BTreeMap;

use serde_json::Value;

use super::PluginModule;

/// One exported member of a module.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportValue {
    /// A callable.
    Function,
    /// A nested name → value map, such as the `macros` table.
    Table(BTreeMap<String, ExportValue>),
    /// Plain data.
    Data(Value),
}

impl ExportValue {
    /// Wraps a string as data.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Data(Value::String(value.into()))
    }

    /// Builds a table whose members are all callables.
    #[must_use]
    pub fn functions<I>(names: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self::Table(
            names
                .into_iter()
                .map(|name| (name.into(), Self::Function))
                .collect(),
        )
    }

    /// Returns the string payload when this is textual data.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Data(Value::String(text)) => Some(text),
            _ => None,
        }
    }

    /// Returns the members when this is a table.
    #[must_use]
    pub const fn as_table(&self) -> Option<&BTreeMap<String, ExportValue>> {
        match self {
            Self::Table(members) => Some(members),
            _ => None,
        }
    }

    /// Returns `true` for callables.
    #[must_use]
    pub const fn is_function(&self) -> bool {
        matches!(self, Self::Function)
    }

    /// Short description of the value's kind for error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Table(_) => "table",
            Self::Data(Value::String(_)) => "string",
            Self::Data(Value::Null) => "null",
            Self::Data(Value::Bool(_)) => "boolean",
            Self::Data(Value::Number(_)) => "number",
            Self::Data(Value::Array(_)) => "array",
            Self::Data(Value::Object(_)) => "object",
        }
    }
}

/// Name → value map of a module's exports.
///
/// # Example
///
/// ```
/// use rampart_plugins::{ExportValue, ModuleExports};
///
/// let exports = ModuleExports::new()
///     .with("id", ExportValue::text("acme.notes"))
///     .with("macros", ExportValue::functions(["notes.add"]));
///
/// assert_eq!(exports.text("id"), Some("acme.notes"));
/// assert_eq!(exports.macro_names(), vec!["notes.add"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleExports {
    members: BTreeMap<String, ExportValue>,
}

impl ModuleExports {
    /// Creates an empty export map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a member.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: ExportValue) -> Self {
        self.insert(name, value);
        self
    }

    /// Adds or replaces a member in place.
    pub fn insert(&mut self, name: impl Into<String>, value: ExportValue) {
        self.members.insert(name.into(), value);
    }

    /// Removes a member.
    pub fn remove(&mut self, name: &str) -> Option<ExportValue> {
        self.members.remove(name)
    }

    /// Looks up a member.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ExportValue> {
        self.members.get(name)
    }

    /// Looks up a textual member.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ExportValue::as_text)
    }

    /// Returns the keys of the `macros` table, or nothing when absent.
    #[must_use]
    pub fn macro_names(&self) -> Vec<&str> {
        self.get("macros")
            .and_then(ExportValue::as_table)
            .map(|table| table.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Projects a typed plugin onto its export view.
    ///
    /// Empty macro and hook lists are omitted, as is an absent intent or
    /// tick.
    #[must_use]
    pub fn reflect<P: PluginModule + ?Sized>(plugin: &P) -> Self {
        let mut exports = Self::new()
            .with("id", ExportValue::text(plugin.id()))
            .with("name", ExportValue::text(plugin.name()))
            .with("version", ExportValue::text(plugin.version()))
            .with("init", ExportValue::Function)
            .with("destroy", ExportValue::Function);

        let macros = plugin.macro_names();
        if !macros.is_empty() {
            exports.insert("macros", ExportValue::functions(macros));
        }
        let hooks = plugin.hook_names();
        if !hooks.is_empty() {
            exports.insert("hooks", ExportValue::functions(hooks));
        }
        if plugin.ticks() {
            exports.insert("tick", ExportValue::Function);
        }
        if let Some(intent) = plugin.intent() {
            exports.insert("intent", ExportValue::Data(intent.to_value()));
        }
        exports
    }
}
