//! Declared state access.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// State targets a module reads from and writes to.
///
/// Targets are dotted paths such as `dtus` or `plugins.state`. Either list
/// may be omitted from a declaration and then reads as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    /// Targets the module reads.
    #[serde(default)]
    pub reads: Vec<String>,
    /// Targets the module writes.
    #[serde(default)]
    pub writes: Vec<String>,
}

impl Intent {
    /// Creates an intent from read and write targets.
    #[must_use]
    pub fn new<R, W>(reads: R, writes: W) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        W: IntoIterator,
        W::Item: Into<String>,
    {
        Self {
            reads: reads.into_iter().map(Into::into).collect(),
            writes: writes.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses a declared intent, returning `None` when it is not an object
    /// or a present `reads` or `writes` entry is not a string array.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        Self::deserialize(value).ok()
    }

    /// Renders the intent as JSON data.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("reads".into(), Value::from(self.reads.clone()));
        map.insert("writes".into(), Value::from(self.writes.clone()));
        Value::Object(map)
    }
}
