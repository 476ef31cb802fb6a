//! Runtime adapter contract.
//!
//! A runtime hosts a [`Computation`]: it asks for its [`Metadata`] once,
//! calls [`Computation::init`], then delivers records and fired timers one at
//! a time. During each call the computation talks back to the runtime through
//! a [`ComputationContext`] to emit output records and arm timers.
//!
//! ```text
//! runtime ──metadata()/init()──────────────▶ computation
//! runtime ──process_record(ctx, record)────▶ computation ──ctx.set_timer()──▶ runtime
//! runtime ──process_timer(ctx, name, ts)───▶ computation ──ctx.produce_record()──▶ runtime
//! ```
//!
//! Calls on one computation never overlap.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::time::EventTime;

mod recording;

pub use recording::*;

/// Name and stream declarations of a computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    pub input_streams: Vec<String>,
    pub output_streams: Vec<String>,
}

/// Input record as delivered by the runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<V> {
    pub key: String,
    pub value: V,
}

impl<V> Record<V> {
    pub fn new(key: impl Into<String>, value: V) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Record emitted by a computation, value already serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub stream: String,
    pub key: String,
    pub value: Vec<u8>,
}

impl OutputRecord {
    /// The value as UTF-8 text, if it is valid UTF-8.
    pub fn value_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.value).ok()
    }
}

/// Callbacks a computation may make into the runtime while it is being called.
pub trait ComputationContext {
    /// Emit `value` under `key` on the output stream `stream`.
    fn produce_record(&mut self, stream: &str, key: &str, value: Vec<u8>) -> anyhow::Result<()>;

    /// Arm the timer called `name` to fire at `fire_at`, replacing any earlier deadline.
    fn set_timer(&mut self, name: &str, fire_at: EventTime) -> anyhow::Result<()>;
}

/// A unit of work hosted by a runtime.
pub trait Computation<V>: Send {
    fn metadata(&self) -> Metadata;

    /// Called once before any record or timer is delivered.
    fn init(&mut self, ctx: &mut dyn ComputationContext) -> Result<()>;

    fn process_record(&mut self, ctx: &mut dyn ComputationContext, record: Record<V>) -> Result<()>;

    fn process_timer(
        &mut self,
        ctx: &mut dyn ComputationContext,
        timer_key: &str,
        fire_time: EventTime,
    ) -> Result<()>;
}

#[cfg(test)]
#[path = "tests/adapter_tests.rs"]
mod tests;
