//! The diagnosis engine: graphical-model store and exact inference.
//!
//! This module provides:
//! - **errors**: Error types for model construction and queries
//! - **model**: Immutable belief net with validated CPTs
//! - **factor**: Factor tables for variable elimination
//! - **infer**: Posterior queries over the net

pub mod errors;
pub(crate) mod factor;
pub mod infer;
pub mod model;

pub use errors::EngineError;
pub use infer::{query, query_with_order, Evidence, Posterior};
pub use model::{BeliefNet, VarId, Variable};
