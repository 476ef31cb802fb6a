//! Transformations and stage chains.
//!
//! A [`Transformation`] turns a lazy sequence of `(key, value)` records into
//! another lazy sequence. Stages are composed with [`Chain`]: the output of the
//! upstream stage is exactly the input of the next one, and nothing is
//! materialized between them.
//!
//! ```text
//! Identity.then(Map).then(Filter).then(Reduce)
//! → Chain<Chain<Chain<Identity, Map>, Filter>, Reduce>
//! ```
//!
//! ## Laziness and failure
//!
//! Records flow as [`StageResult`] items. A stage that sees an upstream error
//! forwards it and stops; a stage whose user function fails yields a
//! [`StageError`] labelled with its [`StageKind`](crate::error::StageKind) and stops. Records yielded
//! before the failure stay valid, but the driver collects a whole chain run
//! before acting on it, so a failed run has no visible effect.
//!
//! Every chain is single-pass: re-running it means calling `apply` again with
//! fresh input.

use crate::error::StageError;

mod filter;
mod map;
mod reduce;

pub use filter::*;
pub use map::*;
pub use reduce::*;

/// Result of producing one record inside a stage chain.
pub type StageResult<T> = std::result::Result<T, StageError>;

/// Lazy, single-pass sequence of records flowing between stages.
pub type Records<'a, K, V> = Box<dyn Iterator<Item = StageResult<(K, V)>> + 'a>;

/// Wrap plain pairs as a [`Records`] sequence.
pub fn records<'a, K, V, I>(pairs: I) -> Records<'a, K, V>
where
    K: 'a,
    V: 'a,
    I: IntoIterator<Item = (K, V)>,
    I::IntoIter: 'a,
{
    Box::new(pairs.into_iter().map(Ok))
}

// ============================================================================
// Core Trait
// ============================================================================

/// A single stage over `(K, V)` records.
///
/// The output types are associated so that a chain's intermediate types are
/// fixed by its stages: `Chain<Up, Stage>` requires `Stage: Transformation<Up::Key, Up::Value>`.
pub trait Transformation<K, V>: Send {
    /// Key type of the records this stage yields.
    type Key: Send + 'static;
    /// Value type of the records this stage yields.
    type Value: Send + 'static;

    /// Apply the stage to `input`, returning the lazy output sequence.
    fn apply<'a>(&'a mut self, input: Records<'a, K, V>) -> Records<'a, Self::Key, Self::Value>;
}

// ============================================================================
// Identity and Chain
// ============================================================================

/// Pass-through stage. Seeds every chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Identity;

impl Identity {
    /// Start a chain with `stage` running right after the identity seed.
    pub fn then<Stage>(self, stage: Stage) -> Chain<Identity, Stage> {
        Chain::new(self, stage)
    }
}

impl<K, V> Transformation<K, V> for Identity
where
    K: Send + 'static,
    V: Send + 'static,
{
    type Key = K;
    type Value = V;

    #[inline]
    fn apply<'a>(&'a mut self, input: Records<'a, K, V>) -> Records<'a, K, V> {
        input
    }
}

/// Two stages run back to back: `upstream` first, then `stage`.
#[derive(Debug, Clone)]
pub struct Chain<Upstream, Stage> {
    upstream: Upstream,
    stage: Stage,
}

impl<Upstream, Stage> Chain<Upstream, Stage> {
    pub fn new(upstream: Upstream, stage: Stage) -> Self {
        Self { upstream, stage }
    }

    /// Append another stage to the end of the chain.
    pub fn then<Next>(self, next: Next) -> Chain<Self, Next> {
        Chain::new(self, next)
    }

    /// The last stage of the chain.
    pub fn stage(&self) -> &Stage {
        &self.stage
    }
}

impl<K, V, Upstream, Stage> Transformation<K, V> for Chain<Upstream, Stage>
where
    K: 'static,
    V: 'static,
    Upstream: Transformation<K, V>,
    Stage: Transformation<Upstream::Key, Upstream::Value>,
{
    type Key = Stage::Key;
    type Value = Stage::Value;

    #[inline]
    fn apply<'a>(&'a mut self, input: Records<'a, K, V>) -> Records<'a, Stage::Key, Stage::Value> {
        let intermediate = self.upstream.apply(input);
        self.stage.apply(intermediate)
    }
}

#[cfg(test)]
#[path = "tests/transform_tests.rs"]
mod tests;
