use serde_json::Value;

use crate::config::ConfigFormat;
use crate::plugin_system::error::PluginSystemError;

/// Deployment descriptor document that plugins contribute to.
///
/// The document is kept as a `serde_json::Value` tree regardless of the
/// format it was read from, and written back in that same format.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    root: Value,
    format: ConfigFormat,
}

impl Descriptor {
    /// An empty JSON object document
    pub fn new() -> Self {
        Self::from_value(Value::Object(Default::default()), ConfigFormat::Json)
    }

    pub fn from_value(root: Value, format: ConfigFormat) -> Self {
        Self { root, format }
    }

    pub fn parse(text: &str, format: ConfigFormat) -> Result<Self, PluginSystemError> {
        let root = format
            .deserialize(text)
            .map_err(|e| PluginSystemError::descriptor("could not parse descriptor document", e))?;
        Ok(Self { root, format })
    }

    pub fn format(&self) -> ConfigFormat {
        self.format
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Value {
        &mut self.root
    }

    pub fn into_value(self) -> Value {
        self.root
    }

    /// Look up a value by JSON pointer (`/servlets/0/name`)
    pub fn get(&self, pointer: &str) -> Option<&Value> {
        self.root.pointer(pointer)
    }

    /// Merge a fragment into the document, see [`deep_merge`]
    pub fn merge(&mut self, fragment: &Value) {
        deep_merge(&mut self.root, fragment);
    }

    /// Serialise the document in the format it was parsed from
    pub fn render(&self) -> Result<String, PluginSystemError> {
        self.format
            .serialize(&self.root)
            .map_err(|e| PluginSystemError::descriptor("could not serialise descriptor document", e))
    }
}

impl Default for Descriptor {
    fn default() -> Self {
        Self::new()
    }
}

/// Objects merge key by key, arrays are appended, anything else replaces
/// the target.
pub fn deep_merge(target: &mut Value, fragment: &Value) {
    match (target, fragment) {
        (Value::Object(existing), Value::Object(incoming)) => {
            for (key, value) in incoming {
                match existing.get_mut(key) {
                    Some(slot) => deep_merge(slot, value),
                    None => {
                        existing.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (Value::Array(existing), Value::Array(incoming)) => {
            existing.extend(incoming.iter().cloned());
        }
        (slot, value) => *slot = value.clone(),
    }
}
