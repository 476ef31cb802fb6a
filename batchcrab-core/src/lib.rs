//! # BatchCrab Core
//!
//! Core components of the BatchCrab micro-batch engine.
//!
//! - [`transform`] — Stages over `(key, value)` records: [`Identity`](transform::Identity),
//!   [`Map`](transform::Map), [`Filter`](transform::Filter), [`Reduce`](transform::Reduce),
//!   composed with [`Chain`](transform::Chain).
//! - [`driver`] — [`BatchProcessor`](driver::BatchProcessor): pre-batch chain per record,
//!   window buffer, post-batch chain per window, sinks and callbacks.
//! - [`adapter`] — The [`Computation`](adapter::Computation) /
//!   [`ComputationContext`](adapter::ComputationContext) contract between a driver and its runtime.
//! - [`runtime`] — [`LocalRuntime`](runtime::LocalRuntime), an in-process implementation of that contract.
//! - [`serializer`] — Named encoders for sink values.
//! - [`time`] — Clocks and named timers.
//! - [`config`], [`error`] — Settings and the error taxonomy.

pub mod adapter;
pub mod config;
pub mod driver;
pub mod error;
pub mod runtime;
pub mod serializer;
pub mod time;
pub mod transform;

pub use error::{ConfigError, PipelineError, Result, StageError, StageKind};
