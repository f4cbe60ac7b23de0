//! Error types for model construction and inference.

use thiserror::Error;

/// Errors raised by the graphical-model store and the inference engine.
///
/// Marked `#[non_exhaustive]` so new variants can be added without breaking
/// downstream matches.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum EngineError {
    /// The model specification is malformed: a CPT row does not normalize,
    /// the declared parent set does not match the CPT, or the edges contain
    /// a cycle. Detected at construction; no partial model is usable.
    #[error("model invalid: {0}")]
    ModelInvalid(String),

    /// A query or evidence entry references a variable the model does not
    /// declare. This is a programming or configuration error.
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    /// The supplied evidence has zero joint probability under the model, so
    /// no posterior exists. Reported instead of dividing by zero.
    #[error("evidence is unsatisfiable under the model: {0}")]
    Unsatisfiable(String),
}
