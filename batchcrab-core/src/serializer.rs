//! Named value serializers.
//!
//! A serializer kind maps a name to a function from a structured document
//! (`serde_json::Value`) to bytes. Sink values are lowered with
//! `serde_json::to_value` before encoding, so one registry serves every
//! pipeline output type.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::ConfigError;

/// Compact JSON. The default sink kind.
pub const JSON: &str = "json";

/// Strings as raw UTF-8, everything else as JSON text.
pub const TEXT: &str = "text";

/// Encodes a lowered value into the bytes handed to the runtime.
pub type SerializeFn = dyn Fn(&Value) -> anyhow::Result<Vec<u8>> + Send + Sync;

/// Serializer kinds known to a pipeline. Starts out with [`JSON`] and [`TEXT`].
#[derive(Clone)]
pub struct SerializerRegistry {
    kinds: HashMap<String, Arc<SerializeFn>>,
}

impl SerializerRegistry {
    /// Registry without any kinds, not even the built-in ones.
    pub fn empty() -> Self {
        Self {
            kinds: HashMap::new(),
        }
    }

    /// Add a kind. Names are unique, built-in ones included.
    pub fn register<F>(&mut self, kind: impl Into<String>, f: F) -> Result<(), ConfigError>
    where
        F: Fn(&Value) -> anyhow::Result<Vec<u8>> + Send + Sync + 'static,
    {
        let kind = kind.into();
        if self.kinds.contains_key(&kind) {
            return Err(ConfigError::DuplicateSerializer(kind));
        }
        self.kinds.insert(kind, Arc::new(f));
        Ok(())
    }

    pub fn get(&self, kind: &str) -> Result<Arc<SerializeFn>, ConfigError> {
        self.kinds
            .get(kind)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownSerializer(kind.to_string()))
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }

    /// Registered kind names, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.kinds.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }
}

impl Default for SerializerRegistry {
    fn default() -> Self {
        let mut kinds: HashMap<String, Arc<SerializeFn>> = HashMap::new();
        kinds.insert(JSON.to_string(), Arc::new(serialize_json));
        kinds.insert(TEXT.to_string(), Arc::new(serialize_text));
        Self { kinds }
    }
}

impl fmt::Debug for SerializerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializerRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

pub fn serialize_json(value: &Value) -> anyhow::Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

pub fn serialize_text(value: &Value) -> anyhow::Result<Vec<u8>> {
    match value {
        Value::String(s) => Ok(s.clone().into_bytes()),
        other => Ok(other.to_string().into_bytes()),
    }
}

#[cfg(test)]
#[path = "tests/serializer_tests.rs"]
mod tests;
