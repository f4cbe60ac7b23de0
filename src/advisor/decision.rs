//! Diagnosis configuration and the corrective-action decision rule.

use serde::{Deserialize, Serialize};

/// Margin below which two posteriors count as tied.
const TIE_MARGIN: f64 = 1e-9;

/// Estimates ambient humidity from rainfall when no sensor value exists.
///
/// The coefficients are inherited from the field deployment (80% above the
/// rain threshold, 40% below) and have not been calibrated against sensor
/// data; treat them as provisional pending agronomist review.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HumidityEstimator {
    /// Rainfall above this many millimeters counts as a wet season.
    pub rain_threshold_mm: f64,
    /// Humidity percentage assumed in a wet season.
    pub wet_humidity_pct: f64,
    /// Humidity percentage assumed in a dry season.
    pub dry_humidity_pct: f64,
}

impl Default for HumidityEstimator {
    fn default() -> Self {
        Self {
            rain_threshold_mm: 50.0,
            wet_humidity_pct: 80.0,
            dry_humidity_pct: 40.0,
        }
    }
}

impl HumidityEstimator {
    /// The assumed humidity percentage for the given rainfall.
    pub fn estimate(&self, rainfall_mm: f64) -> f64 {
        if rainfall_mm > self.rain_threshold_mm {
            self.wet_humidity_pct
        } else {
            self.dry_humidity_pct
        }
    }
}

/// How the disease and water-stress posteriors turn into an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionPolicy {
    /// Fixed high-risk thresholds: fungicide when the disease posterior
    /// exceeds `disease_threshold`, else irrigation when the stress
    /// posterior exceeds `stress_threshold`, else monitoring.
    Thresholds,
    /// Direct comparison: whichever posterior dominates wins; a tie means
    /// monitoring.
    Comparative,
}

/// Settings for the drone-inspection diagnosis step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosisConfig {
    /// Rainfall above this many millimeters is the "abundant" state.
    pub rain_threshold_mm: f64,
    /// Humidity above this percentage is the "high" state.
    pub humidity_threshold_pct: f64,
    /// Disease posterior above this value is high risk.
    pub disease_threshold: f64,
    /// Water-stress posterior above this value calls for irrigation.
    pub stress_threshold: f64,
    pub policy: DecisionPolicy,
    pub humidity: HumidityEstimator,
}

impl Default for DiagnosisConfig {
    fn default() -> Self {
        Self {
            rain_threshold_mm: 50.0,
            humidity_threshold_pct: 60.0,
            disease_threshold: 0.75,
            stress_threshold: 0.70,
            policy: DecisionPolicy::Thresholds,
            humidity: HumidityEstimator::default(),
        }
    }
}

/// The corrective action recommended after diagnosis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Treatment {
    /// Disease risk dominates: apply a fungicidal treatment.
    ApplyFungicide,
    /// The plant is thirsty, not sick: irrigate.
    Irrigate,
    /// Uncertain or low risk: keep monitoring.
    Monitor,
}

/// Applies the configured decision rule to the two posteriors.
pub fn decide(config: &DiagnosisConfig, disease: f64, stress: f64) -> Treatment {
    match config.policy {
        DecisionPolicy::Thresholds => {
            if disease > config.disease_threshold {
                Treatment::ApplyFungicide
            } else if stress > config.stress_threshold {
                Treatment::Irrigate
            } else {
                Treatment::Monitor
            }
        }
        DecisionPolicy::Comparative => {
            if (disease - stress).abs() <= TIE_MARGIN {
                Treatment::Monitor
            } else if disease > stress {
                Treatment::ApplyFungicide
            } else {
                Treatment::Irrigate
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimator_switches_on_the_rain_threshold() {
        let estimator = HumidityEstimator::default();
        assert_eq!(estimator.estimate(100.0), 80.0);
        assert_eq!(estimator.estimate(50.0), 40.0);
        assert_eq!(estimator.estimate(0.0), 40.0);
    }

    #[test]
    fn threshold_policy_matches_field_semantics() {
        let config = DiagnosisConfig::default();
        assert_eq!(decide(&config, 0.98, 0.14), Treatment::ApplyFungicide);
        assert_eq!(decide(&config, 0.71, 0.88), Treatment::Irrigate);
        assert_eq!(decide(&config, 0.45, 0.41), Treatment::Monitor);
    }

    #[test]
    fn threshold_policy_prefers_fungicide_when_both_exceed() {
        let config = DiagnosisConfig::default();
        assert_eq!(decide(&config, 0.9, 0.9), Treatment::ApplyFungicide);
    }

    #[test]
    fn comparative_policy_compares_and_ties_to_monitoring() {
        let config = DiagnosisConfig {
            policy: DecisionPolicy::Comparative,
            ..DiagnosisConfig::default()
        };
        assert_eq!(decide(&config, 0.45, 0.41), Treatment::ApplyFungicide);
        assert_eq!(decide(&config, 0.03, 0.98), Treatment::Irrigate);
        assert_eq!(decide(&config, 0.5, 0.5), Treatment::Monitor);
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = DiagnosisConfig {
            policy: DecisionPolicy::Comparative,
            ..DiagnosisConfig::default()
        };
        let json = serde_json::to_string(&config).expect("serialize");
        let back: DiagnosisConfig = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, config);
    }
}
