//! Pipeline driver.
//!
//! [`BatchProcessor`] hosts one pre-batch chain and one post-batch chain as a
//! runtime [`Computation`]:
//!
//! ```text
//! process_record ─▶ pre-batch chain ─▶ WindowBuffer
//!                                         │ timer "window"
//!                                         ▼
//!                       post-batch chain over the whole window
//!                                         │
//!                           callbacks, then every sink
//! ```
//!
//! The window timer is re-armed at `now + batch_interval` once a flush
//! completes, so windows never overlap and drift by the flush time.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;

use crate::adapter::{Computation, ComputationContext, Metadata, Record};
use crate::config::PipelineConfig;
use crate::error::{ConfigError, PipelineError, Result};
use crate::time::{Clock, EventTime, SystemClock, duration_millis};
use crate::transform::{StageResult, Transformation, records};

mod sink;
mod window;

pub use sink::*;
pub use window::*;

/// Name of the timer that closes a window.
pub const WINDOW_TIMER: &str = "window";

/// Called once per post-batch result, before the result goes to the sinks.
pub type BatchCallback<K, V> = Box<dyn FnMut(&K, &V) + Send>;

/// Driver for a micro-batch pipeline over input values of type `V`.
pub struct BatchProcessor<V, Pre, Post>
where
    Pre: Transformation<String, V>,
    Post: Transformation<Pre::Key, Pre::Value>,
{
    config: PipelineConfig,
    pre_batch: Pre,
    post_batch: Post,
    window: WindowBuffer<Pre::Key, Pre::Value>,
    sinks: SinkSet,
    callbacks: Vec<BatchCallback<Post::Key, Post::Value>>,
    clock: Arc<dyn Clock>,
    windows_processed: u64,
    _input: PhantomData<fn(V)>,
}

impl<V, Pre, Post> BatchProcessor<V, Pre, Post>
where
    V: 'static,
    Pre: Transformation<String, V>,
    Post: Transformation<Pre::Key, Pre::Value>,
{
    pub fn new(config: PipelineConfig, pre_batch: Pre, post_batch: Post, sinks: SinkSet) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            pre_batch,
            post_batch,
            window: WindowBuffer::new(),
            sinks,
            callbacks: Vec::new(),
            clock: Arc::new(SystemClock),
            windows_processed: 0,
            _input: PhantomData,
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn add_callback(&mut self, callback: BatchCallback<Post::Key, Post::Value>) {
        self.callbacks.push(callback);
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Records buffered in the open window.
    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// Windows flushed successfully so far.
    pub fn windows_processed(&self) -> u64 {
        self.windows_processed
    }

    fn next_deadline(&self) -> EventTime {
        self.clock
            .now_millis()
            .saturating_add(duration_millis(self.config.batch_interval))
    }

    fn arm_window(&self, ctx: &mut dyn ComputationContext) -> Result<()> {
        ctx.set_timer(WINDOW_TIMER, self.next_deadline())
            .map_err(PipelineError::Adapter)
    }

    fn ingest(&mut self, key: String, value: V) -> Result<()> {
        let produced = self
            .pre_batch
            .apply(records(std::iter::once((key, value))))
            .collect::<StageResult<Vec<_>>>()?;

        match <[_; 1]>::try_from(produced) {
            Ok([(key, value)]) => {
                self.window.push(key, value);
                Ok(())
            }
            Err(produced) => Err(ConfigError::PreBatchCardinality {
                produced: produced.len(),
            }
            .into()),
        }
    }
}

impl<V, Pre, Post> BatchProcessor<V, Pre, Post>
where
    V: 'static,
    Pre: Transformation<String, V>,
    Post: Transformation<Pre::Key, Pre::Value>,
    Post::Key: fmt::Display,
    Post::Value: Serialize,
{
    fn flush(&mut self, ctx: &mut dyn ComputationContext) -> Result<()> {
        let batch = self.window.take();
        let batch_len = batch.len();

        let results = self
            .post_batch
            .apply(records(batch))
            .collect::<StageResult<Vec<_>>>()?;
        tracing::debug!(
            "{}: window {} closed with {} records, {} results",
            self.config.name,
            self.windows_processed,
            batch_len,
            results.len()
        );

        for (key, value) in &results {
            for callback in &mut self.callbacks {
                callback(key, value);
            }
            self.sinks.emit(ctx, key, value)?;
        }
        self.windows_processed += 1;
        Ok(())
    }
}

impl<V, Pre, Post> Computation<V> for BatchProcessor<V, Pre, Post>
where
    V: 'static,
    Pre: Transformation<String, V>,
    Post: Transformation<Pre::Key, Pre::Value>,
    Post::Key: fmt::Display,
    Post::Value: Serialize,
{
    fn metadata(&self) -> Metadata {
        Metadata {
            name: self.config.name.clone(),
            input_streams: vec![self.config.input_stream.clone()],
            output_streams: self.sinks.output_streams(),
        }
    }

    fn init(&mut self, ctx: &mut dyn ComputationContext) -> Result<()> {
        tracing::debug!(
            "{}: starting with batch interval {:?}",
            self.config.name,
            self.config.batch_interval
        );
        self.arm_window(ctx)
    }

    fn process_record(&mut self, _ctx: &mut dyn ComputationContext, record: Record<V>) -> Result<()> {
        let Record { key, value } = record;
        let result = self.ingest(key, value);
        if let Err(err) = &result {
            tracing::error!("error in process_record: {:?}", err);
        }
        result
    }

    fn process_timer(
        &mut self,
        ctx: &mut dyn ComputationContext,
        timer_key: &str,
        fire_time: EventTime,
    ) -> Result<()> {
        if timer_key != WINDOW_TIMER {
            tracing::warn!("{}: ignoring unknown timer {} at {}", self.config.name, timer_key, fire_time);
            return Ok(());
        }
        if let Err(err) = self.flush(ctx) {
            tracing::error!("error in process_timer: {:?}", err);
            return Err(err);
        }
        self.arm_window(ctx)
    }
}

#[cfg(test)]
#[path = "tests/driver_tests.rs"]
mod tests;
