//! Pipeline and runtime settings.
//!
//! Both structs deserialize with `serde`; missing fields take their defaults
//! and durations are written as milliseconds:
//!
//! ```json
//! { "name": "word-counter", "input_stream": "sentences", "batch_interval_ms": 1000 }
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Window length used when none is configured.
pub const DEFAULT_BATCH_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Computation name reported to the runtime.
    pub name: String,
    /// The single input stream the pipeline consumes.
    pub input_stream: String,
    /// Length of one window.
    #[serde(rename = "batch_interval_ms", with = "millis")]
    pub batch_interval: Duration,
}

impl PipelineConfig {
    pub fn new(name: impl Into<String>, input_stream: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input_stream: input_stream.into(),
            batch_interval: DEFAULT_BATCH_INTERVAL,
        }
    }

    pub fn with_batch_interval(mut self, interval: Duration) -> Self {
        self.batch_interval = interval;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_interval.is_zero() {
            return Err(ConfigError::ZeroBatchInterval);
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new("batch-processor", "input")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Capacity of the bounded event channel feeding the runtime.
    pub channel_capacity: usize,
    /// Longest the runtime blocks waiting for an event when no timer is due sooner.
    #[serde(rename = "idle_poll_ms", with = "millis")]
    pub idle_poll: Duration,
}

impl RuntimeConfig {
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    pub fn with_idle_poll(mut self, idle_poll: Duration) -> Self {
        self.idle_poll = idle_poll;
        self
    }

    /// A zero idle poll would spin the event loop while no timer is armed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.idle_poll.is_zero() {
            return Err(ConfigError::ZeroIdlePoll);
        }
        Ok(())
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
            idle_poll: Duration::from_millis(100),
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
