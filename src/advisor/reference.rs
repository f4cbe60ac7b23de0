//! Reference implementations of the external collaborators.
//!
//! These stand in for the real decision-tree classifier and the Prolog
//! knowledge base in the CLI and in tests: a deterministic agronomic-range
//! classifier and an in-memory symbolic store with per-plot fact rows, crop
//! constraint rules and a taxonomy table for fallback suggestions.

use rustc_hash::FxHashMap;

use crate::advisor::errors::{ClassifierError, StoreError};
use crate::advisor::external::{Classifier, Label, PlotSample, SymbolicStore};

/// An inclusive feature band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub low: f64,
    pub high: f64,
}

impl Band {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }
}

/// Agronomic feature bands for one crop.
#[derive(Debug, Clone, PartialEq)]
pub struct CropProfile {
    pub label: &'static str,
    pub nitrogen: Band,
    pub phosphorus: Band,
    pub potassium: Band,
    pub ph: Band,
    pub rainfall_mm: Band,
    pub temperature_c: Band,
}

impl CropProfile {
    /// How many of the six features fall inside this crop's bands.
    fn matches(&self, sample: &PlotSample) -> usize {
        let checks = [
            self.nitrogen.contains(sample.nitrogen),
            self.phosphorus.contains(sample.phosphorus),
            self.potassium.contains(sample.potassium),
            self.ph.contains(sample.ph),
            self.rainfall_mm.contains(sample.rainfall_mm),
            self.temperature_c.contains(sample.temperature_c),
        ];
        checks.iter().filter(|hit| **hit).count()
    }
}

/// A deterministic classifier scoring samples against per-crop feature
/// bands. The crop matching the most bands wins; ties break by profile
/// order. Confidence is the matched fraction.
#[derive(Debug, Clone)]
pub struct RangeClassifier {
    profiles: Vec<CropProfile>,
}

impl RangeClassifier {
    pub fn new(profiles: Vec<CropProfile>) -> Self {
        Self { profiles }
    }

    fn best(&self, sample: &PlotSample) -> Result<(&CropProfile, usize), ClassifierError> {
        let mut best: Option<(&CropProfile, usize)> = None;
        for profile in &self.profiles {
            let score = profile.matches(sample);
            let better = match best {
                Some((_, current)) => score > current,
                None => true,
            };
            if better {
                best = Some((profile, score));
            }
        }
        best.ok_or_else(|| ClassifierError("no crop profiles configured".into()))
    }
}

impl Default for RangeClassifier {
    fn default() -> Self {
        Self::new(default_profiles())
    }
}

impl Classifier for RangeClassifier {
    fn predict(&self, sample: &PlotSample) -> Result<Label, ClassifierError> {
        let (profile, _) = self.best(sample)?;
        Ok(profile.label.to_string())
    }

    fn predict_proba(&self, sample: &PlotSample) -> Result<f64, ClassifierError> {
        let (_, score) = self.best(sample)?;
        Ok(score as f64 / 6.0)
    }
}

/// Environmental constraints one crop must satisfy to be validated.
#[derive(Debug, Clone, PartialEq)]
pub struct CropRule {
    pub label: &'static str,
    pub ph: Band,
    pub rainfall_mm: Band,
    pub temperature_c: Band,
}

impl CropRule {
    fn satisfied_by(&self, sample: &PlotSample) -> bool {
        self.ph.contains(sample.ph)
            && self.rainfall_mm.contains(sample.rainfall_mm)
            && self.temperature_c.contains(sample.temperature_c)
    }
}

/// An in-memory symbolic store.
///
/// Holds at most one fact row per plot. `assert_facts` on a plot that
/// already has facts is rejected: the caller must retract first, which
/// keeps the retract-then-assert discipline observable instead of silently
/// overwriting.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    facts: FxHashMap<String, PlotSample>,
    rules: Vec<CropRule>,
    /// Taxonomically related labels per crop, in preference order.
    taxonomy: FxHashMap<&'static str, Vec<&'static str>>,
}

impl MemoryStore {
    pub fn new(rules: Vec<CropRule>, taxonomy: FxHashMap<&'static str, Vec<&'static str>>) -> Self {
        Self {
            facts: FxHashMap::default(),
            rules,
            taxonomy,
        }
    }

    /// Number of plots with asserted facts.
    pub fn fact_count(&self) -> usize {
        self.facts.len()
    }

    fn rule(&self, label: &str) -> Option<&CropRule> {
        self.rules.iter().find(|rule| rule.label == label)
    }

    fn facts_for(&self, plot: &str) -> Result<&PlotSample, StoreError> {
        self.facts
            .get(plot)
            .ok_or_else(|| StoreError(format!("no facts asserted for plot '{plot}'")))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(default_rules(), default_taxonomy())
    }
}

impl SymbolicStore for MemoryStore {
    fn retract_facts(&mut self, plot: &str) -> Result<(), StoreError> {
        self.facts.remove(plot);
        Ok(())
    }

    fn assert_facts(&mut self, plot: &str, sample: &PlotSample) -> Result<(), StoreError> {
        if self.facts.contains_key(plot) {
            return Err(StoreError(format!(
                "facts already asserted for plot '{plot}'; retract first"
            )));
        }
        self.facts.insert(plot.to_string(), *sample);
        Ok(())
    }

    fn validate(&mut self, plot: &str, label: &str) -> Result<bool, StoreError> {
        let sample = *self.facts_for(plot)?;
        // A label the knowledge base has no rule for cannot be validated.
        Ok(self
            .rule(label)
            .map(|rule| rule.satisfied_by(&sample))
            .unwrap_or(false))
    }

    fn suggest_alternative(
        &mut self,
        plot: &str,
        label: &str,
    ) -> Result<Option<Label>, StoreError> {
        let sample = *self.facts_for(plot)?;
        let Some(related) = self.taxonomy.get(label) else {
            return Ok(None);
        };
        for candidate in related {
            if let Some(rule) = self.rule(candidate) {
                if rule.satisfied_by(&sample) {
                    return Ok(Some(candidate.to_string()));
                }
            }
        }
        Ok(None)
    }
}

/// Feature bands for the crops the reference classifier knows.
pub fn default_profiles() -> Vec<CropProfile> {
    vec![
        CropProfile {
            label: "rice",
            nitrogen: Band::new(60.0, 99.0),
            phosphorus: Band::new(35.0, 60.0),
            potassium: Band::new(35.0, 45.0),
            ph: Band::new(5.0, 7.0),
            rainfall_mm: Band::new(180.0, 300.0),
            temperature_c: Band::new(20.0, 28.0),
        },
        CropProfile {
            label: "maize",
            nitrogen: Band::new(60.0, 100.0),
            phosphorus: Band::new(35.0, 60.0),
            potassium: Band::new(15.0, 25.0),
            ph: Band::new(5.5, 7.0),
            rainfall_mm: Band::new(60.0, 110.0),
            temperature_c: Band::new(18.0, 27.0),
        },
        CropProfile {
            label: "chickpea",
            nitrogen: Band::new(20.0, 60.0),
            phosphorus: Band::new(55.0, 80.0),
            potassium: Band::new(75.0, 85.0),
            ph: Band::new(6.0, 8.0),
            rainfall_mm: Band::new(60.0, 95.0),
            temperature_c: Band::new(17.0, 21.0),
        },
        CropProfile {
            label: "lentil",
            nitrogen: Band::new(10.0, 40.0),
            phosphorus: Band::new(55.0, 80.0),
            potassium: Band::new(15.0, 25.0),
            ph: Band::new(5.9, 7.5),
            rainfall_mm: Band::new(35.0, 55.0),
            temperature_c: Band::new(18.0, 30.0),
        },
        CropProfile {
            label: "banana",
            nitrogen: Band::new(80.0, 120.0),
            phosphorus: Band::new(70.0, 95.0),
            potassium: Band::new(45.0, 55.0),
            ph: Band::new(5.5, 6.5),
            rainfall_mm: Band::new(90.0, 120.0),
            temperature_c: Band::new(25.0, 30.0),
        },
        CropProfile {
            label: "cotton",
            nitrogen: Band::new(100.0, 140.0),
            phosphorus: Band::new(35.0, 60.0),
            potassium: Band::new(15.0, 25.0),
            ph: Band::new(5.8, 8.0),
            rainfall_mm: Band::new(60.0, 100.0),
            temperature_c: Band::new(22.0, 26.0),
        },
    ]
}

/// Environmental validation rules for the reference knowledge base.
pub fn default_rules() -> Vec<CropRule> {
    vec![
        CropRule {
            label: "rice",
            ph: Band::new(5.0, 7.5),
            rainfall_mm: Band::new(150.0, 320.0),
            temperature_c: Band::new(19.0, 30.0),
        },
        CropRule {
            label: "maize",
            ph: Band::new(5.5, 7.5),
            rainfall_mm: Band::new(50.0, 120.0),
            temperature_c: Band::new(17.0, 28.0),
        },
        CropRule {
            label: "chickpea",
            ph: Band::new(5.9, 8.1),
            rainfall_mm: Band::new(50.0, 110.0),
            temperature_c: Band::new(15.0, 23.0),
        },
        CropRule {
            label: "lentil",
            ph: Band::new(5.8, 7.8),
            rainfall_mm: Band::new(30.0, 70.0),
            temperature_c: Band::new(16.0, 31.0),
        },
        CropRule {
            label: "banana",
            ph: Band::new(5.2, 6.8),
            rainfall_mm: Band::new(80.0, 130.0),
            temperature_c: Band::new(23.0, 32.0),
        },
        CropRule {
            label: "cotton",
            ph: Band::new(5.5, 8.2),
            rainfall_mm: Band::new(50.0, 110.0),
            temperature_c: Band::new(20.0, 28.0),
        },
    ]
}

/// Related-crop fallbacks, most similar first.
pub fn default_taxonomy() -> FxHashMap<&'static str, Vec<&'static str>> {
    FxHashMap::from_iter([
        ("rice", vec!["maize"]),
        ("maize", vec!["rice", "cotton"]),
        ("chickpea", vec!["lentil"]),
        ("lentil", vec!["chickpea"]),
        ("banana", Vec::new()),
        ("cotton", vec!["maize"]),
    ])
}
