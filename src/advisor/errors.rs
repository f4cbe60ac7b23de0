//! Error types for the decision pipeline.

use thiserror::Error;

use crate::advisor::pipeline::Stage;
use crate::catalog::SpecError;
use crate::engine::errors::EngineError;

/// Failure reported by a [`Classifier`](crate::advisor::Classifier)
/// implementation.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ClassifierError(pub String);

/// Failure reported by a [`SymbolicStore`](crate::advisor::SymbolicStore)
/// implementation.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StoreError(pub String);

/// Errors that abort advisor startup: the configured network or map could
/// not be built. No partial advisor is usable.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Spec(#[from] SpecError),
}

/// Errors that abort one pipeline invocation.
///
/// Every variant carries the plot identifier and enough stage context for
/// the caller to retry or log; the core itself never retries.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The external classifier failed; fatal to the current invocation.
    #[error("classifier failed for plot '{plot}': {source}")]
    Classifier {
        plot: String,
        source: ClassifierError,
    },

    /// The external symbolic store failed during the named stage.
    #[error("symbolic store failed for plot '{plot}' at stage {stage}: {source}")]
    SymbolicStore {
        plot: String,
        stage: Stage,
        source: StoreError,
    },

    /// The diagnosis step failed (for example, unsatisfiable evidence);
    /// the rest of the invocation is abandoned.
    #[error("diagnosis failed for plot '{plot}': {source}")]
    Diagnosis { plot: String, source: EngineError },
}
