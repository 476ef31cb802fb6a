//! Error taxonomy for pipelines.
//!
//! - [`StageError`]: a user-supplied map/filter/reduce function failed.
//! - [`ConfigError`]: the pipeline was assembled or used in a way it cannot run.
//! - [`PipelineError`]: everything a driver call can return to the runtime adapter.
//!
//! User functions and adapter calls speak `anyhow::Error`; those errors are
//! wrapped here so the adapter can tell failure classes apart.

use std::fmt;

/// Which kind of stage raised a [`StageError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Mapper,
    Filter,
    Reducer,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StageKind::Mapper => "mapper",
            StageKind::Filter => "filter",
            StageKind::Reducer => "reducer",
        };
        f.write_str(label)
    }
}

/// A user function failed while a stage chain was running.
#[derive(Debug, thiserror::Error)]
#[error("error in {stage}")]
pub struct StageError {
    pub stage: StageKind,
    #[source]
    pub source: anyhow::Error,
}

impl StageError {
    pub fn new(stage: StageKind, source: anyhow::Error) -> Self {
        Self { stage, source }
    }

    /// Log the failure with its stage label and full cause chain, then wrap it.
    pub(crate) fn report(stage: StageKind, source: anyhow::Error) -> Self {
        tracing::error!("error in {}: {:?}", stage, source);
        Self::new(stage, source)
    }
}

/// The pipeline cannot run as configured.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("pre-batch chain must yield exactly one record per input record, got {produced}")]
    PreBatchCardinality { produced: usize },

    #[error("unknown serializer kind `{0}`")]
    UnknownSerializer(String),

    #[error("serializer kind `{0}` is already registered")]
    DuplicateSerializer(String),

    #[error("batch interval must be greater than zero")]
    ZeroBatchInterval,

    #[error("runtime idle poll must be greater than zero")]
    ZeroIdlePoll,
}

/// Errors returned by the driver to the runtime adapter.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Stage(#[from] StageError),

    #[error("pipeline misconfigured: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to serialize value for stream `{stream}` with `{kind}` serializer")]
    Serialize {
        stream: String,
        kind: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("runtime adapter call failed")]
    Adapter(#[source] anyhow::Error),
}

impl PipelineError {
    /// Stage that raised the error, if it came from a user function.
    pub fn stage(&self) -> Option<StageKind> {
        match self {
            PipelineError::Stage(err) => Some(err.stage),
            _ => None,
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(self, PipelineError::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
