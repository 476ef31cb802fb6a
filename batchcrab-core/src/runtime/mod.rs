//! In-process runtime.
//!
//! [`LocalRuntime`] hosts a single [`Computation`] on the thread that calls
//! [`serve`](LocalRuntime::serve). Producers on any thread feed it through
//! cloned [`RuntimeHandle`]s; produced records come out of the receiver
//! returned by [`outputs`](LocalRuntime::outputs).
//!
//! # Event loop
//!
//! ```text
//! loop {
//!     fire every timer whose deadline <= clock.now()
//!     event = events.recv_timeout(min(next deadline - now, idle_poll))
//!     match event {
//!         Record   => computation.process_record()   (undeclared input stream: dropped)
//!         Tick     => re-check timers
//!         Shutdown => return Ok
//!         timeout  => re-check timers
//!         all handles dropped => return Ok
//!     }
//! }
//! ```
//!
//! Events are handled one at a time, so the computation is never called
//! concurrently. The first error returned by the computation stops the loop.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded, unbounded};

use crate::adapter::{Computation, Metadata, OutputRecord};
use crate::config::RuntimeConfig;
use crate::error::Result;
use crate::time::{Clock, SystemClock};

mod context;
mod handle;

use context::LocalContext;
pub use handle::*;

pub use crate::time::time_millis;

pub struct LocalRuntime<V> {
    config: RuntimeConfig,
    clock: Arc<dyn Clock>,
    sender: Sender<RuntimeEvent<V>>,
    receiver: Receiver<RuntimeEvent<V>>,
    outputs: Option<(Sender<OutputRecord>, Receiver<OutputRecord>)>,
}

impl<V> LocalRuntime<V> {
    pub fn new(config: RuntimeConfig) -> Self {
        let (sender, receiver) = bounded(config.channel_capacity);
        Self {
            config,
            clock: Arc::new(SystemClock),
            sender,
            receiver,
            outputs: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Clock used to decide when timers are due.
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// New producer handle. `serve` returns once every handle is dropped.
    pub fn handle(&self) -> RuntimeHandle<V> {
        RuntimeHandle::new(self.sender.clone())
    }

    /// Receiver for every record the computation produces.
    ///
    /// Records are discarded until the first call. The channel is unbounded and
    /// disconnects when the runtime is dropped.
    pub fn outputs(&mut self) -> Receiver<OutputRecord> {
        let (_, receiver) = self.outputs.get_or_insert_with(unbounded);
        receiver.clone()
    }

    /// Host `computation` until shutdown, until every handle is dropped, or
    /// until the computation fails. An invalid [`RuntimeConfig`] fails before
    /// `init` is called.
    pub fn serve<C>(self, computation: &mut C) -> Result<()>
    where
        C: Computation<V> + ?Sized,
    {
        let LocalRuntime {
            config,
            clock,
            sender,
            receiver,
            outputs,
        } = self;
        drop(sender);
        config.validate()?;

        let metadata = computation.metadata();
        let mut ctx = LocalContext::new(
            metadata.name.clone(),
            metadata.output_streams.clone(),
            outputs.map(|(tx, _)| tx),
        );
        tracing::info!(
            "{}: serving inputs {:?}, outputs {:?}",
            metadata.name,
            metadata.input_streams,
            metadata.output_streams
        );

        let result = computation
            .init(&mut ctx)
            .and_then(|()| event_loop(computation, &mut ctx, &receiver, clock.as_ref(), &config, &metadata));

        if let Err(err) = &result {
            tracing::error!("{}: stopped on error: {}", metadata.name, err);
        }
        result
    }
}

fn event_loop<V, C>(
    computation: &mut C,
    ctx: &mut LocalContext,
    events: &Receiver<RuntimeEvent<V>>,
    clock: &dyn Clock,
    config: &RuntimeConfig,
    metadata: &Metadata,
) -> Result<()>
where
    C: Computation<V> + ?Sized,
{
    loop {
        for (name, fire_at) in ctx.timers.drain_due(clock.now_millis()) {
            computation.process_timer(ctx, &name, fire_at)?;
        }

        let timeout = match ctx.timers.next_timer() {
            Some(deadline) => {
                let until = deadline.saturating_sub(clock.now_millis()).max(0) as u64;
                config.idle_poll.min(Duration::from_millis(until))
            }
            None => config.idle_poll,
        };

        match events.recv_timeout(timeout) {
            Ok(RuntimeEvent::Record { stream, record }) => {
                if !metadata.input_streams.contains(&stream) {
                    tracing::warn!(
                        "{}: dropping record {} for undeclared input stream {}",
                        metadata.name,
                        record.key,
                        stream
                    );
                    continue;
                }
                computation.process_record(ctx, record)?;
            }
            Ok(RuntimeEvent::Tick) | Err(RecvTimeoutError::Timeout) => {}
            Ok(RuntimeEvent::Shutdown) => {
                tracing::info!("{}: shutdown requested", metadata.name);
                return Ok(());
            }
            Err(RecvTimeoutError::Disconnected) => {
                tracing::info!("{}: all producers gone", metadata.name);
                return Ok(());
            }
        }
    }
}

impl<V> Default for LocalRuntime<V> {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}

#[cfg(test)]
#[path = "tests/runtime_tests.rs"]
mod tests;
