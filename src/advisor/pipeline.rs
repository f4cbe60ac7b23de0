//! The decision pipeline.
//!
//! A linear state machine per advisory request:
//!
//! ```text
//! Predicted ─▶ Validated                      (accept the classifier)
//! Predicted ─▶ Rejected ─▶ Recovered          (taxonomic fallback)
//! Predicted ─▶ Rejected ─▶ Unrecovered ─▶ Inspecting ─▶ Diagnosed
//!                                        └▶ BlockedRoute
//! ```
//!
//! Each transition is logged with its inputs and outcome for audit. No
//! transition is retried; collaborator failures surface as a
//! [`PipelineError`] carrying the plot and the stage reached.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::advisor::decision::{decide, DiagnosisConfig, Treatment};
use crate::advisor::errors::{PipelineError, SetupError, StoreError};
use crate::advisor::external::{Classifier, Label, PlotSample, SymbolicStore};
use crate::catalog::{vars, AdvisorConfig};
use crate::engine::{BeliefNet, Evidence};
use crate::planner::{a_star, FieldMap, Route};

/// Pipeline states. The terminal state of a run is recorded on its
/// [`Recommendation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Classifier produced a candidate label.
    Predicted,
    /// Symbolic validation accepted the candidate. Terminal.
    Validated,
    /// Symbolic validation rejected the candidate.
    Rejected,
    /// A taxonomic alternative satisfied the facts. Terminal.
    Recovered,
    /// No alternative exists; physical inspection required.
    Unrecovered,
    /// No route to the flagged plot. Terminal.
    BlockedRoute,
    /// Drone dispatched along a computed route.
    Inspecting,
    /// Probabilistic diagnosis completed. Terminal.
    Diagnosed,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Predicted => "predicted",
            Stage::Validated => "validated",
            Stage::Rejected => "rejected",
            Stage::Recovered => "recovered",
            Stage::Unrecovered => "unrecovered",
            Stage::BlockedRoute => "blocked-route",
            Stage::Inspecting => "inspecting",
            Stage::Diagnosed => "diagnosed",
        };
        f.write_str(name)
    }
}

/// Symptoms observed (or assumed) at the flagged plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SymptomReport {
    pub leaf_spots: bool,
    pub yellowing: bool,
}

impl Default for SymptomReport {
    /// The drone scan simulation reports both symptoms present.
    fn default() -> Self {
        Self {
            leaf_spots: true,
            yellowing: true,
        }
    }
}

/// Disease and water-stress posteriors from the inspection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Diagnosis {
    /// `P(disease present | evidence)`.
    pub disease: f64,
    /// `P(water stress | evidence)`.
    pub water_stress: f64,
}

/// The drone route, rendered with location names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutePlan {
    pub waypoints: Vec<String>,
    pub cost_m: f64,
}

impl RoutePlan {
    fn from_route(map: &FieldMap, route: &Route) -> Self {
        Self {
            waypoints: route.path.iter().map(|id| map.name(*id).to_string()).collect(),
            cost_m: route.cost,
        }
    }
}

/// The final recommendation of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "action", content = "label")]
pub enum Decision {
    /// Plant the classifier's candidate crop.
    PlantCandidate(Label),
    /// Plant the taxonomic alternative instead.
    PlantAlternative(Label),
    /// Disease risk dominates: apply a fungicidal treatment.
    ApplyFungicide,
    /// The plants are thirsty, not sick: irrigate.
    Irrigate,
    /// Uncertain or low risk: keep monitoring.
    Monitor,
    /// The flagged plot cannot be reached; no further action possible.
    InspectionImpossible,
}

impl From<Treatment> for Decision {
    fn from(treatment: Treatment) -> Self {
        match treatment {
            Treatment::ApplyFungicide => Decision::ApplyFungicide,
            Treatment::Irrigate => Decision::Irrigate,
            Treatment::Monitor => Decision::Monitor,
        }
    }
}

/// Everything one advisory run produced, for the caller and the audit log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub plot: String,
    /// The classifier's candidate label.
    pub candidate: Label,
    /// The classifier's confidence for the candidate, in [0, 1].
    pub confidence: f64,
    /// Terminal state the run reached.
    pub stage: Stage,
    pub alternative: Option<Label>,
    pub route: Option<RoutePlan>,
    pub diagnosis: Option<Diagnosis>,
    pub decision: Decision,
}

/// The decision orchestrator.
///
/// Owns the immutable belief net and farm map, plus the two injected
/// collaborators. One [`Advisor::reasoning_pipeline`] call runs to
/// completion synchronously; the net and map are shared read-only, and the
/// symbolic store is the only mutable collaborator.
#[derive(Debug)]
pub struct Advisor<C, S> {
    classifier: C,
    store: S,
    net: BeliefNet,
    map: FieldMap,
    config: DiagnosisConfig,
}

impl<C: Classifier, S: SymbolicStore> Advisor<C, S> {
    /// Assembles an advisor from already-built components.
    pub fn new(classifier: C, store: S, net: BeliefNet, map: FieldMap, config: DiagnosisConfig) -> Self {
        Self {
            classifier,
            store,
            net,
            map,
            config,
        }
    }

    /// Builds the net and map from a configuration and assembles the
    /// advisor. Construction failures are fatal to startup.
    pub fn from_config(classifier: C, store: S, config: &AdvisorConfig) -> Result<Self, SetupError> {
        let net = BeliefNet::build(&config.network)?;
        let map = FieldMap::build(&config.map)?;
        Ok(Self::new(classifier, store, net, map, config.diagnosis))
    }

    /// The pipeline entry point: classify, validate, and when necessary
    /// inspect and diagnose. Uses the drone simulation's symptom defaults
    /// and the configured humidity estimator.
    pub fn reasoning_pipeline(
        &mut self,
        plot: &str,
        sample: &PlotSample,
    ) -> Result<Recommendation, PipelineError> {
        self.advise(plot, sample, None, None)
    }

    /// Like [`reasoning_pipeline`](Self::reasoning_pipeline), with observed
    /// symptoms and a measured humidity percentage when sensors exist.
    pub fn advise(
        &mut self,
        plot: &str,
        sample: &PlotSample,
        symptoms: Option<SymptomReport>,
        humidity_pct: Option<f64>,
    ) -> Result<Recommendation, PipelineError> {
        let candidate = self
            .classifier
            .predict(sample)
            .map_err(|source| PipelineError::Classifier {
                plot: plot.to_string(),
                source,
            })?;
        let confidence =
            self.classifier
                .predict_proba(sample)
                .map_err(|source| PipelineError::Classifier {
                    plot: plot.to_string(),
                    source,
                })?;
        info!(plot, candidate = %candidate, confidence, "stage {}", Stage::Predicted);

        // Retract-then-assert keeps the fact base to exactly one row per
        // plot across repeated invocations; the order is mandatory.
        self.store
            .retract_facts(plot)
            .map_err(|source| self.store_failure(plot, Stage::Predicted, source))?;
        self.store
            .assert_facts(plot, sample)
            .map_err(|source| self.store_failure(plot, Stage::Predicted, source))?;
        let validated = self
            .store
            .validate(plot, &candidate)
            .map_err(|source| self.store_failure(plot, Stage::Predicted, source))?;

        if validated {
            info!(plot, candidate = %candidate, "stage {}", Stage::Validated);
            return Ok(Recommendation {
                plot: plot.to_string(),
                candidate: candidate.clone(),
                confidence,
                stage: Stage::Validated,
                alternative: None,
                route: None,
                diagnosis: None,
                decision: Decision::PlantCandidate(candidate),
            });
        }
        warn!(plot, candidate = %candidate, "stage {}: biological constraints violated", Stage::Rejected);

        let alternative = self
            .store
            .suggest_alternative(plot, &candidate)
            .map_err(|source| self.store_failure(plot, Stage::Rejected, source))?;
        if let Some(alternative) = alternative {
            info!(plot, alternative = %alternative, "stage {}", Stage::Recovered);
            return Ok(Recommendation {
                plot: plot.to_string(),
                candidate,
                confidence,
                stage: Stage::Recovered,
                alternative: Some(alternative.clone()),
                route: None,
                diagnosis: None,
                decision: Decision::PlantAlternative(alternative),
            });
        }
        info!(plot, "stage {}: dispatching inspection drone", Stage::Unrecovered);

        let Some(route) = a_star(&self.map, self.map.start(), self.map.goal()) else {
            warn!(plot, "stage {}: no route to the flagged plot", Stage::BlockedRoute);
            return Ok(Recommendation {
                plot: plot.to_string(),
                candidate,
                confidence,
                stage: Stage::BlockedRoute,
                alternative: None,
                route: None,
                diagnosis: None,
                decision: Decision::InspectionImpossible,
            });
        };
        let plan = RoutePlan::from_route(&self.map, &route);
        info!(
            plot,
            waypoints = plan.waypoints.join(" -> "),
            cost_m = plan.cost_m,
            "stage {}",
            Stage::Inspecting
        );

        let report = symptoms.unwrap_or_default();
        let humidity_pct =
            humidity_pct.unwrap_or_else(|| self.config.humidity.estimate(sample.rainfall_mm));
        let diagnosis = self
            .diagnose(sample, report, humidity_pct)
            .map_err(|source| {
                warn!(plot, %source, "diagnosis aborted");
                PipelineError::Diagnosis {
                    plot: plot.to_string(),
                    source,
                }
            })?;
        let decision: Decision = decide(&self.config, diagnosis.disease, diagnosis.water_stress).into();
        info!(
            plot,
            disease = diagnosis.disease,
            water_stress = diagnosis.water_stress,
            decision = ?decision,
            "stage {}",
            Stage::Diagnosed
        );

        Ok(Recommendation {
            plot: plot.to_string(),
            candidate,
            confidence,
            stage: Stage::Diagnosed,
            alternative: None,
            route: Some(plan),
            diagnosis: Some(diagnosis),
            decision,
        })
    }

    /// Runs the two posterior queries for the inspection evidence.
    fn diagnose(
        &self,
        sample: &PlotSample,
        report: SymptomReport,
        humidity_pct: f64,
    ) -> Result<Diagnosis, crate::engine::EngineError> {
        let rain_state = u8::from(sample.rainfall_mm > self.config.rain_threshold_mm);
        let humidity_state = u8::from(humidity_pct > self.config.humidity_threshold_pct);
        debug!(
            leaf_spots = report.leaf_spots,
            yellowing = report.yellowing,
            rain_state,
            humidity_state,
            "diagnosis evidence"
        );

        let mut evidence = Evidence::new();
        evidence
            .observe(self.net.var_id(vars::LEAF_SPOTS)?, u8::from(report.leaf_spots))
            .observe(self.net.var_id(vars::YELLOWING)?, u8::from(report.yellowing))
            .observe(self.net.var_id(vars::RAIN)?, rain_state)
            .observe(self.net.var_id(vars::HUMIDITY)?, humidity_state);

        let disease = self.net.query(vars::DISEASE, &evidence)?;
        let water_stress = self.net.query(vars::WATER_STRESS, &evidence)?;
        Ok(Diagnosis {
            disease: disease.p_true(),
            water_stress: water_stress.p_true(),
        })
    }

    fn store_failure(&self, plot: &str, stage: Stage, source: StoreError) -> PipelineError {
        PipelineError::SymbolicStore {
            plot: plot.to_string(),
            stage,
            source,
        }
    }

    /// The injected symbolic store, for callers that need to seed facts.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// The farm map the advisor routes over.
    pub fn map(&self) -> &FieldMap {
        &self.map
    }
}
