//! Capability interfaces for the external collaborators.
//!
//! The statistical classifier and the symbolic fact/rule store are external
//! systems; the pipeline depends on them only through these traits so tests
//! can substitute deterministic fakes and deployments can plug in real
//! backends.

use serde::{Deserialize, Serialize};

use crate::advisor::errors::{ClassifierError, StoreError};

/// A crop or disease label exchanged with the collaborators.
pub type Label = String;

/// One plot's measured features, in the order the classifier expects:
/// nitrogen, phosphorus, potassium, pH, rainfall, temperature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotSample {
    /// Soil nitrogen level.
    pub nitrogen: f64,
    /// Soil phosphorus level.
    pub phosphorus: f64,
    /// Soil potassium level.
    pub potassium: f64,
    /// Soil pH.
    pub ph: f64,
    /// Seasonal rainfall in millimeters.
    pub rainfall_mm: f64,
    /// Mean temperature in Celsius.
    pub temperature_c: f64,
}

impl PlotSample {
    /// The ordered feature tuple the classifier contract is defined over.
    pub fn features(&self) -> [f64; 6] {
        [
            self.nitrogen,
            self.phosphorus,
            self.potassium,
            self.ph,
            self.rainfall_mm,
            self.temperature_c,
        ]
    }
}

/// The external statistical classifier.
///
/// Misclassification risk is out of scope here; the pipeline only consumes
/// the label and its confidence.
pub trait Classifier {
    /// The most likely crop label for the sample.
    fn predict(&self, sample: &PlotSample) -> Result<Label, ClassifierError>;

    /// Confidence in [0, 1] for the predicted label.
    fn predict_proba(&self, sample: &PlotSample) -> Result<f64, ClassifierError>;
}

/// The external symbolic fact/rule store.
///
/// The pipeline owns the call sequencing discipline: facts for a plot are
/// retracted, then asserted, then queried, in that order, within one
/// invocation. Implementations only need to honor each call in isolation.
pub trait SymbolicStore {
    /// Removes all facts previously asserted for the plot. Retracting a
    /// plot with no facts is a no-op, not an error.
    fn retract_facts(&mut self, plot: &str) -> Result<(), StoreError>;

    /// Asserts the plot's current feature facts.
    fn assert_facts(&mut self, plot: &str, sample: &PlotSample) -> Result<(), StoreError>;

    /// Whether the candidate label is consistent with the asserted facts.
    fn validate(&mut self, plot: &str, label: &str) -> Result<bool, StoreError>;

    /// A taxonomically related label that does satisfy the facts, if the
    /// store knows one.
    fn suggest_alternative(&mut self, plot: &str, label: &str)
        -> Result<Option<Label>, StoreError>;
}
