use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::adapter::ComputationContext;
use crate::error::{ConfigError, PipelineError, Result};
use crate::serializer::{JSON, SerializeFn, SerializerRegistry};

/// One output destination: a stream and the serializer kind used for it.
#[derive(Clone)]
pub struct SinkBinding {
    pub stream: String,
    pub kind: String,
    serializer: Arc<SerializeFn>,
}

impl fmt::Debug for SinkBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkBinding")
            .field("stream", &self.stream)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Every sink of a pipeline plus the serializer kinds they may use.
///
/// Each post-batch result is sent to all sinks, in registration order.
#[derive(Debug, Clone, Default)]
pub struct SinkSet {
    registry: SerializerRegistry,
    bindings: Vec<SinkBinding>,
}

impl SinkSet {
    pub fn new(registry: SerializerRegistry) -> Self {
        Self {
            registry,
            bindings: Vec::new(),
        }
    }

    pub fn register_serializer<F>(&mut self, kind: impl Into<String>, f: F) -> std::result::Result<(), ConfigError>
    where
        F: Fn(&serde_json::Value) -> anyhow::Result<Vec<u8>> + Send + Sync + 'static,
    {
        self.registry.register(kind, f)
    }

    /// Send results to `stream` encoded with the serializer called `kind`.
    ///
    /// The kind is resolved here, so an unknown kind fails before anything runs.
    pub fn bind(&mut self, stream: impl Into<String>, kind: &str) -> std::result::Result<(), ConfigError> {
        let serializer = self.registry.get(kind)?;
        self.bindings.push(SinkBinding {
            stream: stream.into(),
            kind: kind.to_string(),
            serializer,
        });
        Ok(())
    }

    /// Send results to `stream` as compact JSON.
    pub fn bind_json(&mut self, stream: impl Into<String>) -> std::result::Result<(), ConfigError> {
        self.bind(stream, JSON)
    }

    pub fn bindings(&self) -> &[SinkBinding] {
        &self.bindings
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Distinct output streams in the order they were first bound.
    pub fn output_streams(&self) -> Vec<String> {
        let mut streams: Vec<String> = Vec::with_capacity(self.bindings.len());
        for binding in &self.bindings {
            if !streams.contains(&binding.stream) {
                streams.push(binding.stream.clone());
            }
        }
        streams
    }

    /// Serialize `value` once per sink and hand it to the runtime under `key`.
    pub fn emit<K, V>(&self, ctx: &mut dyn ComputationContext, key: &K, value: &V) -> Result<()>
    where
        K: fmt::Display + ?Sized,
        V: Serialize + ?Sized,
    {
        if self.bindings.is_empty() {
            return Ok(());
        }
        let key = key.to_string();
        for binding in &self.bindings {
            let bytes = serde_json::to_value(value)
                .map_err(anyhow::Error::from)
                .and_then(|doc| (binding.serializer)(&doc))
                .map_err(|source| PipelineError::Serialize {
                    stream: binding.stream.clone(),
                    kind: binding.kind.clone(),
                    source,
                })?;
            ctx.produce_record(&binding.stream, &key, bytes)
                .map_err(PipelineError::Adapter)?;
        }
        Ok(())
    }
}
