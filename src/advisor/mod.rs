//! The decision orchestrator and its collaborator seams.
//!
//! This module provides:
//! - **errors**: Pipeline and setup error types
//! - **external**: Capability traits for the classifier and symbolic store
//! - **reference**: Deterministic in-crate collaborator implementations
//! - **decision**: Diagnosis configuration and the corrective-action rule
//! - **pipeline**: The advisory state machine

pub mod decision;
pub mod errors;
pub mod external;
pub mod pipeline;
pub mod reference;

pub use decision::{decide, DecisionPolicy, DiagnosisConfig, HumidityEstimator, Treatment};
pub use errors::{ClassifierError, PipelineError, SetupError, StoreError};
pub use external::{Classifier, Label, PlotSample, SymbolicStore};
pub use pipeline::{Advisor, Decision, Diagnosis, Recommendation, RoutePlan, Stage, SymptomReport};
pub use reference::{MemoryStore, RangeClassifier};
