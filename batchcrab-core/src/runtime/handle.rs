use anyhow::{Result, anyhow};
use crossbeam_channel::Sender;

use crate::adapter::Record;

/// Event delivered to a [`LocalRuntime`](super::LocalRuntime).
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeEvent<V> {
    /// An input record addressed to `stream`.
    Record { stream: String, record: Record<V> },
    /// Wake the runtime so it re-checks its timers against the clock.
    Tick,
    /// Stop serving once the events sent before this one are handled.
    Shutdown,
}

/// Producer side of a [`LocalRuntime`](super::LocalRuntime).
///
/// Cheap to clone; every clone feeds the same runtime. Sends block while the
/// runtime's event channel is full.
pub struct RuntimeHandle<V> {
    sender: Sender<RuntimeEvent<V>>,
}

impl<V> RuntimeHandle<V> {
    pub(crate) fn new(sender: Sender<RuntimeEvent<V>>) -> Self {
        Self { sender }
    }

    /// Deliver `value` under `key` to the input stream `stream`.
    pub fn send(&self, stream: impl Into<String>, key: impl Into<String>, value: V) -> Result<()> {
        self.event(RuntimeEvent::Record {
            stream: stream.into(),
            record: Record::new(key, value),
        })
    }

    pub fn tick(&self) -> Result<()> {
        self.event(RuntimeEvent::Tick)
    }

    pub fn shutdown(&self) -> Result<()> {
        self.event(RuntimeEvent::Shutdown)
    }

    pub fn event(&self, event: RuntimeEvent<V>) -> Result<()> {
        self.sender
            .send(event)
            .map_err(|_| anyhow!("Runtime stopped: event channel closed"))
    }
}

impl<V> Clone for RuntimeHandle<V> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}
