use std::collections::HashMap;

use super::*;

/// In-memory [`ComputationContext`] that records every call.
///
/// Handy for driving a computation by hand: feed it records and timers, then
/// inspect what it produced and which timers it armed.
#[derive(Debug, Default)]
pub struct RecordingContext {
    produced: Vec<OutputRecord>,
    timers: Vec<(String, EventTime)>,
    armed: HashMap<String, EventTime>,
    fail_produce: bool,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later `produce_record` call fail.
    pub fn fail_produce(mut self) -> Self {
        self.fail_produce = true;
        self
    }

    /// Everything produced so far, in call order.
    pub fn produced(&self) -> &[OutputRecord] {
        &self.produced
    }

    /// Records produced on `stream`, in call order.
    pub fn produced_on<'a>(&'a self, stream: &'a str) -> impl Iterator<Item = &'a OutputRecord> + 'a {
        self.produced.iter().filter(move |r| r.stream == stream)
    }

    /// Take everything produced so far.
    pub fn take_produced(&mut self) -> Vec<OutputRecord> {
        std::mem::take(&mut self.produced)
    }

    /// Every `set_timer` call, in call order.
    pub fn timer_history(&self) -> &[(String, EventTime)] {
        &self.timers
    }

    /// Latest deadline set for `name`.
    pub fn timer(&self, name: &str) -> Option<EventTime> {
        self.armed.get(name).copied()
    }
}

impl ComputationContext for RecordingContext {
    fn produce_record(&mut self, stream: &str, key: &str, value: Vec<u8>) -> anyhow::Result<()> {
        if self.fail_produce {
            anyhow::bail!("produce_record rejected for stream {}", stream);
        }
        self.produced.push(OutputRecord {
            stream: stream.to_string(),
            key: key.to_string(),
            value,
        });
        Ok(())
    }

    fn set_timer(&mut self, name: &str, fire_at: EventTime) -> anyhow::Result<()> {
        self.timers.push((name.to_string(), fire_at));
        self.armed.insert(name.to_string(), fire_at);
        Ok(())
    }
}
