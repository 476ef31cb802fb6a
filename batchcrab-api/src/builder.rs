use std::fmt;
use std::marker::PhantomData;
use std::time::Duration;

use serde::Serialize;

use batchcrab_core::config::PipelineConfig;
use batchcrab_core::driver::{BatchProcessor, SinkSet};
use batchcrab_core::error::ConfigError;
use batchcrab_core::runtime::LocalRuntime;
use batchcrab_core::transform::{Chain, Filter, Identity, IntoMapOutput, Map, Reduce, Transformation};

use crate::pipeline::Pipeline;

/// Entry point of the builder: a pipeline over input values of type `V` with
/// an empty pre-batch chain.
pub type InputSource<V> = PreBatchBuilder<V, Identity>;

/// Builder phase before the first `reduce`: `map` and `filter` extend the
/// pre-batch chain, which runs once per incoming record.
pub struct PreBatchBuilder<V, Pre> {
    config: PipelineConfig,
    pre_batch: Pre,
    sinks: SinkSet,
    _input: PhantomData<fn(V)>,
}

impl<V> PreBatchBuilder<V, Identity> {
    /// Pipeline called `name` reading `input_stream`.
    pub fn new(name: impl Into<String>, input_stream: impl Into<String>) -> Self {
        Self::from_config(PipelineConfig::new(name, input_stream))
    }

    pub fn from_config(config: PipelineConfig) -> Self {
        Self {
            config,
            pre_batch: Identity,
            sinks: SinkSet::default(),
            _input: PhantomData,
        }
    }
}

impl<V, Pre> PreBatchBuilder<V, Pre>
where
    V: 'static,
    Pre: Transformation<String, V>,
{
    /// Append a map stage to the pre-batch chain.
    ///
    /// The pre-batch chain must turn every record into exactly one record, so
    /// `f` should return a single pair here.
    pub fn map<F, O>(self, f: F) -> PreBatchBuilder<V, Chain<Pre, Map<F>>>
    where
        F: FnMut(Pre::Key, Pre::Value) -> anyhow::Result<O> + Send,
        O: IntoMapOutput,
        O::Key: Send + 'static,
        O::Value: Send + 'static,
    {
        PreBatchBuilder {
            config: self.config,
            pre_batch: Chain::new(self.pre_batch, Map::new(f)),
            sinks: self.sinks,
            _input: PhantomData,
        }
    }

    /// Append a filter stage to the pre-batch chain.
    pub fn filter<F>(self, predicate: F) -> PreBatchBuilder<V, Chain<Pre, Filter<F>>>
    where
        F: FnMut(&Pre::Key, &Pre::Value) -> anyhow::Result<bool> + Send,
    {
        PreBatchBuilder {
            config: self.config,
            pre_batch: Chain::new(self.pre_batch, Filter::new(predicate)),
            sinks: self.sinks,
            _input: PhantomData,
        }
    }

    /// Start the post-batch chain with a reduce stage.
    ///
    /// Everything appended after this call runs once per window over the whole
    /// window instead of once per record.
    #[allow(clippy::type_complexity)]
    pub fn reduce<F, OutK, OutV>(
        self,
        f: F,
    ) -> PostBatchBuilder<V, Pre, Chain<Identity, Reduce<F, Pre::Key, Pre::Value>>>
    where
        Pre::Key: Ord,
        F: FnMut(Pre::Key, Vec<Pre::Value>) -> anyhow::Result<(OutK, OutV)> + Send,
        OutK: Send + 'static,
        OutV: Send + 'static,
    {
        PostBatchBuilder {
            config: self.config,
            pre_batch: self.pre_batch,
            post_batch: Identity.then(Reduce::new(f)),
            sinks: self.sinks,
            _input: PhantomData,
        }
    }

    pub fn batch_interval(mut self, interval: Duration) -> Self {
        self.config.batch_interval = interval;
        self
    }

    /// Make the serializer kind `kind` available to later sinks.
    pub fn with_serializer<F>(mut self, kind: impl Into<String>, f: F) -> Result<Self, ConfigError>
    where
        F: Fn(&serde_json::Value) -> anyhow::Result<Vec<u8>> + Send + Sync + 'static,
    {
        self.sinks.register_serializer(kind, f)?;
        Ok(self)
    }

    /// Send every post-batch result to `stream` as JSON.
    pub fn sink(mut self, stream: impl Into<String>) -> Result<Self, ConfigError> {
        self.sinks.bind_json(stream)?;
        Ok(self)
    }

    /// Send every post-batch result to `stream` encoded with serializer `kind`.
    pub fn sink_with(mut self, stream: impl Into<String>, kind: &str) -> Result<Self, ConfigError> {
        self.sinks.bind(stream, kind)?;
        Ok(self)
    }

    /// Finish the chains with an empty post-batch chain.
    pub fn into_pipeline(self) -> Pipeline<V, Pre, Identity> {
        Pipeline::new(self.config, self.pre_batch, Identity, self.sinks)
    }

    pub fn on_batched_record<F>(self, callback: F) -> Pipeline<V, Pre, Identity>
    where
        F: FnMut(&Pre::Key, &Pre::Value) + Send + 'static,
    {
        self.into_pipeline().on_batched_record(callback)
    }

    pub fn build(self) -> Result<BatchProcessor<V, Pre, Identity>, ConfigError> {
        self.into_pipeline().build()
    }

    pub fn run(self, runtime: LocalRuntime<V>) -> batchcrab_core::Result<()>
    where
        Pre::Key: fmt::Display,
        Pre::Value: Serialize,
    {
        self.into_pipeline().run(runtime)
    }
}

/// Builder phase after the first `reduce`: every stage goes to the
/// post-batch chain, which runs once per window.
pub struct PostBatchBuilder<V, Pre, Post> {
    config: PipelineConfig,
    pre_batch: Pre,
    post_batch: Post,
    sinks: SinkSet,
    _input: PhantomData<fn(V)>,
}

impl<V, Pre, Post> PostBatchBuilder<V, Pre, Post>
where
    V: 'static,
    Pre: Transformation<String, V>,
    Post: Transformation<Pre::Key, Pre::Value>,
{
    pub fn map<F, O>(self, f: F) -> PostBatchBuilder<V, Pre, Chain<Post, Map<F>>>
    where
        F: FnMut(Post::Key, Post::Value) -> anyhow::Result<O> + Send,
        O: IntoMapOutput,
        O::Key: Send + 'static,
        O::Value: Send + 'static,
    {
        PostBatchBuilder {
            config: self.config,
            pre_batch: self.pre_batch,
            post_batch: Chain::new(self.post_batch, Map::new(f)),
            sinks: self.sinks,
            _input: PhantomData,
        }
    }

    pub fn filter<F>(self, predicate: F) -> PostBatchBuilder<V, Pre, Chain<Post, Filter<F>>>
    where
        F: FnMut(&Post::Key, &Post::Value) -> anyhow::Result<bool> + Send,
    {
        PostBatchBuilder {
            config: self.config,
            pre_batch: self.pre_batch,
            post_batch: Chain::new(self.post_batch, Filter::new(predicate)),
            sinks: self.sinks,
            _input: PhantomData,
        }
    }

    #[allow(clippy::type_complexity)]
    pub fn reduce<F, OutK, OutV>(
        self,
        f: F,
    ) -> PostBatchBuilder<V, Pre, Chain<Post, Reduce<F, Post::Key, Post::Value>>>
    where
        Post::Key: Ord,
        F: FnMut(Post::Key, Vec<Post::Value>) -> anyhow::Result<(OutK, OutV)> + Send,
        OutK: Send + 'static,
        OutV: Send + 'static,
    {
        PostBatchBuilder {
            config: self.config,
            pre_batch: self.pre_batch,
            post_batch: Chain::new(self.post_batch, Reduce::new(f)),
            sinks: self.sinks,
            _input: PhantomData,
        }
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

    pub fn into_pipeline(self) -> Pipeline<V, Pre, Post> {
        Pipeline::new(self.config, self.pre_batch, self.post_batch, self.sinks)
    }

    pub fn on_batched_record<F>(self, callback: F) -> Pipeline<V, Pre, Post>
    where
        F: FnMut(&Post::Key, &Post::Value) + Send + 'static,
    {
        self.into_pipeline().on_batched_record(callback)
    }

    pub fn build(self) -> Result<BatchProcessor<V, Pre, Post>, ConfigError> {
        self.into_pipeline().build()
    }

    pub fn run(self, runtime: LocalRuntime<V>) -> batchcrab_core::Result<()>
    where
        Post::Key: fmt::Display,
        Post::Value: Serialize,
    {
        self.into_pipeline().run(runtime)
    }
}

#[cfg(test)]
#[path = "tests/builder_tests.rs"]
mod tests;
