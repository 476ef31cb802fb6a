//! # BatchCrab API
//!
//! User-facing builder for micro-batch pipelines.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use batchcrab_api::InputSource;
//! use batchcrab_api::batchcrab_core::config::RuntimeConfig;
//! use batchcrab_api::batchcrab_core::runtime::LocalRuntime;
//!
//! let runtime = LocalRuntime::new(RuntimeConfig::default());
//! let words = runtime.handle();
//! std::thread::spawn(move || {
//!     for word in ["the", "cat", "sat"] {
//!         words.send("words", word, word.to_string()).unwrap();
//!     }
//! });
//!
//! InputSource::<String>::new("word-counter", "words")
//!     .batch_interval(Duration::from_secs(1))
//!     .map(|_key, word| Ok((word, 1u64)))
//!     .reduce(|word, counts| Ok((word, counts.into_iter().sum::<u64>())))
//!     .sink("word-count")
//!     .unwrap()
//!     .run(runtime)
//!     .unwrap();
//! ```
//!
//! - [`builder`] — [`InputSource`](builder::InputSource),
//!   [`PreBatchBuilder`](builder::PreBatchBuilder) and
//!   [`PostBatchBuilder`](builder::PostBatchBuilder). `reduce` moves a builder
//!   from the pre-batch phase (once per record) to the post-batch phase (once per window).
//! - [`pipeline`] — [`Pipeline`](pipeline::Pipeline): chains closed, callbacks and sinks attached.

pub mod builder;
pub mod pipeline;

pub use batchcrab_core;
pub use builder::{InputSource, PostBatchBuilder, PreBatchBuilder};
pub use pipeline::Pipeline;
