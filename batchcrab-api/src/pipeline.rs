use std::fmt;
use std::marker::PhantomData;
use std::time::Duration;

use serde::Serialize;

use batchcrab_core::config::PipelineConfig;
use batchcrab_core::driver::{BatchCallback, BatchProcessor, SinkSet};
use batchcrab_core::error::ConfigError;
use batchcrab_core::runtime::LocalRuntime;
use batchcrab_core::transform::Transformation;

/// A pipeline whose chains are final.
///
/// Callbacks see the post-batch output type, so registering the first one
/// closes both chains; sinks and further callbacks can still be added.
pub struct Pipeline<V, Pre, Post>
where
    Pre: Transformation<String, V>,
    Post: Transformation<Pre::Key, Pre::Value>,
{
    config: PipelineConfig,
    pre_batch: Pre,
    post_batch: Post,
    sinks: SinkSet,
    callbacks: Vec<BatchCallback<Post::Key, Post::Value>>,
    _input: PhantomData<fn(V)>,
}

impl<V, Pre, Post> Pipeline<V, Pre, Post>
where
    V: 'static,
    Pre: Transformation<String, V>,
    Post: Transformation<Pre::Key, Pre::Value>,
{
    pub(crate) fn new(config: PipelineConfig, pre_batch: Pre, post_batch: Post, sinks: SinkSet) -> Self {
        Self {
            config,
            pre_batch,
            post_batch,
            sinks,
            callbacks: Vec::new(),
            _input: PhantomData,
        }
    }

    /// Call `callback` with every post-batch result, before it is sent to the sinks.
    ///
    /// Callbacks run in registration order.
    pub fn on_batched_record<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&Post::Key, &Post::Value) + Send + 'static,
    {
        self.callbacks.push(Box::new(callback));
        self
    }

    pub fn batch_interval(mut self, interval: Duration) -> Self {
        self.config.batch_interval = interval;
        self
    }

    pub fn with_serializer<F>(mut self, kind: impl Into<String>, f: F) -> Result<Self, ConfigError>
    where
        F: Fn(&serde_json::Value) -> anyhow::Result<Vec<u8>> + Send + Sync + 'static,
    {
        self.sinks.register_serializer(kind, f)?;
        Ok(self)
    }

    pub fn sink(mut self, stream: impl Into<String>) -> Result<Self, ConfigError> {
        self.sinks.bind_json(stream)?;
        Ok(self)
    }

    pub fn sink_with(mut self, stream: impl Into<String>, kind: &str) -> Result<Self, ConfigError> {
        self.sinks.bind(stream, kind)?;
        Ok(self)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Assemble the driver.
    pub fn build(self) -> Result<BatchProcessor<V, Pre, Post>, ConfigError> {
        let mut processor = BatchProcessor::new(self.config, self.pre_batch, self.post_batch, self.sinks)?;
        for callback in self.callbacks {
            processor.add_callback(callback);
        }
        Ok(processor)
    }

    /// Build the driver and serve it on `runtime` until shutdown or the first error.
    ///
    /// Blocks the current thread. Take handles from `runtime` before calling.
    pub fn run(self, runtime: LocalRuntime<V>) -> batchcrab_core::Result<()>
    where
        Post::Key: fmt::Display,
        Post::Value: Serialize,
    {
        let mut processor = self.build()?.with_clock(runtime.clock());
        tracing::info!(
            "{}: running on {} with batch interval {:?}",
            processor.config().name,
            processor.config().input_stream,
            processor.config().batch_interval
        );
        runtime.serve(&mut processor)
    }
}
