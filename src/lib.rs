//! # Agrosage - Hybrid Crop Advisory Core
//!
//! Agrosage combines three reasoning modalities to advise on crop selection
//! and plant-health response for a farm plot:
//!
//! - a statistical classifier (external, behind the [`advisor::Classifier`]
//!   trait) proposes a candidate crop,
//! - a symbolic fact/rule store (external, behind the
//!   [`advisor::SymbolicStore`] trait) validates it against biological
//!   constraints and suggests taxonomic fallbacks,
//! - and when symbols cannot resolve the conflict, a drone is routed to the
//!   flagged plot by A* search ([`planner`]) and the observed symptoms are
//!   diagnosed by exact inference over a small Bayesian network
//!   ([`engine`]).
//!
//! ## Architecture
//!
//! The system is organized into several modules:
//!
//! - **engine**: Graphical-model store and variable-elimination inference
//! - **planner**: Farm map and A* route search
//! - **advisor**: The decision pipeline and collaborator seams
//! - **catalog**: Static serde specifications and built-in presets
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agrosage::advisor::{Advisor, MemoryStore, PlotSample, RangeClassifier};
//! use agrosage::catalog::AdvisorConfig;
//!
//! let mut advisor = Advisor::from_config(
//!     RangeClassifier::default(),
//!     MemoryStore::default(),
//!     &AdvisorConfig::default(),
//! )?;
//! let recommendation = advisor.reasoning_pipeline("plot_7", &PlotSample {
//!     nitrogen: 90.0,
//!     phosphorus: 40.0,
//!     potassium: 40.0,
//!     ph: 5.5,
//!     rainfall_mm: 200.0,
//!     temperature_c: 25.0,
//! })?;
//! ```

#![forbid(unsafe_code)]

pub mod advisor;
pub mod catalog;
pub mod engine;
pub mod planner;

// Re-export commonly used types
pub use advisor::{Advisor, PipelineError, PlotSample, Recommendation};
pub use catalog::AdvisorConfig;
pub use engine::{BeliefNet, EngineError, Evidence, Posterior};
pub use planner::{a_star, FieldMap, Route};
