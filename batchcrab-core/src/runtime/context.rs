use anyhow::{Result, bail};
use crossbeam_channel::Sender;

use crate::adapter::{ComputationContext, OutputRecord};
use crate::time::{EventTime, TimerService};

/// [`ComputationContext`] handed to the computation served by a
/// [`LocalRuntime`](super::LocalRuntime).
pub(crate) struct LocalContext {
    computation: String,
    output_streams: Vec<String>,
    outputs: Option<Sender<OutputRecord>>,
    pub(crate) timers: TimerService,
}

impl LocalContext {
    pub(crate) fn new(
        computation: String,
        output_streams: Vec<String>,
        outputs: Option<Sender<OutputRecord>>,
    ) -> Self {
        Self {
            computation,
            output_streams,
            outputs,
            timers: TimerService::new(),
        }
    }
}

impl ComputationContext for LocalContext {
    fn produce_record(&mut self, stream: &str, key: &str, value: Vec<u8>) -> Result<()> {
        if !self.output_streams.iter().any(|s| s == stream) {
            bail!(
                "{} produced a record for undeclared output stream {}",
                self.computation,
                stream
            );
        }
        let record = OutputRecord {
            stream: stream.to_string(),
            key: key.to_string(),
            value,
        };
        match &self.outputs {
            Some(outputs) => {
                if outputs.send(record).is_err() {
                    tracing::debug!("{}: output receiver dropped, discarding record", self.computation);
                }
            }
            None => tracing::trace!("{}: no output listener, discarding record", self.computation),
        }
        Ok(())
    }

    fn set_timer(&mut self, name: &str, fire_at: EventTime) -> Result<()> {
        self.timers.register(name, fire_at);
        Ok(())
    }
}
