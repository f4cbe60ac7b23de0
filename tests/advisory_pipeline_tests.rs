//! End-to-end tests for the advisory pipeline and its two algorithmic
//! cores, exercised through the public API only.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use agrosage::advisor::{
    Advisor, Classifier, ClassifierError, Decision, DiagnosisConfig, Label, MemoryStore,
    PlotSample, RangeClassifier, Stage, StoreError, SymbolicStore,
};
use agrosage::catalog::{
    farm_map, plant_health_network, AdvisorConfig, CptSpec, MapEdgeSpec, MapSpec, NetworkSpec,
};
use agrosage::engine::{BeliefNet, Evidence};
use agrosage::planner::{a_star, FieldMap};

fn paddy_sample() -> PlotSample {
    PlotSample {
        nitrogen: 90.0,
        phosphorus: 40.0,
        potassium: 40.0,
        ph: 5.5,
        rainfall_mm: 200.0,
        temperature_c: 25.0,
    }
}

/// Spots evidence must raise a 10% disease prior.
#[test]
fn two_node_model_spots_raise_disease_posterior() {
    let spec = NetworkSpec {
        variables: vec!["disease".into(), "spots".into()],
        edges: vec![("disease".into(), "spots".into())],
        cpts: vec![
            CptSpec {
                variable: "disease".into(),
                parents: vec![],
                rows: vec![[0.9, 0.1]],
            },
            CptSpec {
                variable: "spots".into(),
                parents: vec!["disease".into()],
                rows: vec![[0.95, 0.05], [0.2, 0.8]],
            },
        ],
    };
    let net = BeliefNet::build(&spec).expect("valid model");

    let prior = net.query("disease", &Evidence::new()).expect("prior");
    assert!((prior.p_true() - 0.1).abs() < 1e-12);

    let mut evidence = Evidence::new();
    evidence.observe(net.var_id("spots").expect("spots"), 1);
    let posterior = net.query("disease", &evidence).expect("posterior");

    assert!(posterior.p_true() > 0.1, "evidence must raise the prior");
    // Exact value: 0.1*0.8 / (0.1*0.8 + 0.9*0.05).
    assert!((posterior.p_true() - 0.64).abs() < 1e-12);
}

/// A three-location line with zero heuristic walks the single path.
#[test]
fn line_map_routes_through_the_middle() {
    let spec = MapSpec {
        locations: vec!["a".into(), "b".into(), "c".into()],
        edges: vec![
            MapEdgeSpec {
                from: "a".into(),
                to: "b".into(),
                cost: 5.0,
            },
            MapEdgeSpec {
                from: "b".into(),
                to: "c".into(),
                cost: 5.0,
            },
        ],
        heuristic: BTreeMap::from([("a".into(), 0.0), ("b".into(), 0.0), ("c".into(), 0.0)]),
        start: "a".into(),
        goal: "c".into(),
    };
    let map = FieldMap::build(&spec).expect("valid map");
    let route = a_star(&map, map.start(), map.goal()).expect("reachable");

    let names: Vec<&str> = route.path.iter().map(|id| map.name(*id)).collect();
    assert_eq!(names, ["a", "b", "c"]);
    assert_eq!(route.cost, 10.0);
}

struct StubClassifier;

impl Classifier for StubClassifier {
    fn predict(&self, _sample: &PlotSample) -> Result<Label, ClassifierError> {
        Ok("rice".into())
    }

    fn predict_proba(&self, _sample: &PlotSample) -> Result<f64, ClassifierError> {
        Ok(0.87)
    }
}

/// Rejects every label, suggests nothing, and counts its calls.
struct RejectingStore {
    retracts: Rc<Cell<usize>>,
    asserts: Rc<Cell<usize>>,
    validations: Rc<Cell<usize>>,
    suggestions: Rc<Cell<usize>>,
}

impl RejectingStore {
    fn new() -> (Self, [Rc<Cell<usize>>; 4]) {
        let counters = [
            Rc::new(Cell::new(0)),
            Rc::new(Cell::new(0)),
            Rc::new(Cell::new(0)),
            Rc::new(Cell::new(0)),
        ];
        let store = Self {
            retracts: counters[0].clone(),
            asserts: counters[1].clone(),
            validations: counters[2].clone(),
            suggestions: counters[3].clone(),
        };
        (store, counters)
    }
}

impl SymbolicStore for RejectingStore {
    fn retract_facts(&mut self, _plot: &str) -> Result<(), StoreError> {
        self.retracts.set(self.retracts.get() + 1);
        Ok(())
    }

    fn assert_facts(&mut self, _plot: &str, _sample: &PlotSample) -> Result<(), StoreError> {
        self.asserts.set(self.asserts.get() + 1);
        Ok(())
    }

    fn validate(&mut self, _plot: &str, _label: &str) -> Result<bool, StoreError> {
        self.validations.set(self.validations.get() + 1);
        Ok(false)
    }

    fn suggest_alternative(
        &mut self,
        _plot: &str,
        _label: &str,
    ) -> Result<Option<Label>, StoreError> {
        self.suggestions.set(self.suggestions.get() + 1);
        Ok(None)
    }
}

/// An always-rejecting validator with no alternative must push the run
/// through inspection: one retract/assert/validate/suggest each, one route.
#[test]
fn unrecoverable_rejection_reaches_inspection_exactly_once() {
    let (store, counters) = RejectingStore::new();
    let mut advisor = Advisor::from_config(StubClassifier, store, &AdvisorConfig::default())
        .expect("valid default config");

    let recommendation = advisor
        .reasoning_pipeline("plot_critical", &paddy_sample())
        .expect("pipeline");

    assert_eq!(recommendation.stage, Stage::Diagnosed);
    let route = recommendation.route.expect("inspection route");
    assert_eq!(
        route.waypoints,
        ["base_station", "plot_a", "plot_c", "critical_plot"]
    );
    assert_eq!(route.cost_m, 27.0);

    for counter in counters {
        assert_eq!(counter.get(), 1, "each store call happens exactly once");
    }
}

/// The full reference system: a paddy sample validates and stops early.
#[test]
fn reference_system_validates_a_paddy_plot() {
    let mut advisor = Advisor::from_config(
        RangeClassifier::default(),
        MemoryStore::default(),
        &AdvisorConfig::default(),
    )
    .expect("valid default config");

    let recommendation = advisor
        .reasoning_pipeline("plot_paddy", &paddy_sample())
        .expect("pipeline");

    assert_eq!(recommendation.candidate, "rice");
    assert_eq!(recommendation.stage, Stage::Validated);
    assert_eq!(recommendation.decision, Decision::PlantCandidate("rice".into()));
    assert!((recommendation.confidence - 1.0).abs() < 1e-12);
}

/// The full reference system: a mid-rainfall plot rejects rice but recovers
/// through the taxonomy.
#[test]
fn reference_system_recovers_with_a_related_crop() {
    let mut advisor = Advisor::from_config(
        RangeClassifier::default(),
        MemoryStore::default(),
        &AdvisorConfig::default(),
    )
    .expect("valid default config");

    // Rice-looking soil, but rainfall outside the rice validation band and
    // inside the maize band.
    let sample = PlotSample {
        rainfall_mm: 120.0,
        ..paddy_sample()
    };
    let recommendation = advisor
        .reasoning_pipeline("plot_border", &sample)
        .expect("pipeline");

    assert_eq!(recommendation.candidate, "rice");
    assert_eq!(recommendation.stage, Stage::Recovered);
    assert_eq!(
        recommendation.decision,
        Decision::PlantAlternative("maize".into())
    );
}

/// The full reference system driven into inspection: no rule fits, the
/// drone flies, and the wet season turns the symptoms into a fungicide
/// call.
#[test]
fn reference_system_diagnoses_an_unrecoverable_plot() {
    let mut advisor = Advisor::from_config(
        RangeClassifier::default(),
        MemoryStore::default(),
        &AdvisorConfig::default(),
    )
    .expect("valid default config");

    // Rice candidate, but rainfall beyond every validation band.
    let sample = PlotSample {
        rainfall_mm: 400.0,
        ..paddy_sample()
    };
    let recommendation = advisor
        .reasoning_pipeline("plot_flooded", &sample)
        .expect("pipeline");

    assert_eq!(recommendation.stage, Stage::Diagnosed);
    assert_eq!(recommendation.decision, Decision::ApplyFungicide);
    let diagnosis = recommendation.diagnosis.expect("diagnosis");
    assert!(diagnosis.disease > diagnosis.water_stress);
}

/// Repeated runs on one plot keep the fact base at a single row.
#[test]
fn repeated_runs_do_not_grow_the_fact_base() {
    let net = BeliefNet::build(&plant_health_network()).expect("net");
    let map = FieldMap::build(&farm_map()).expect("map");
    let mut advisor = Advisor::new(
        StubClassifier,
        MemoryStore::default(),
        net,
        map,
        DiagnosisConfig::default(),
    );

    for _ in 0..5 {
        advisor
            .reasoning_pipeline("plot_repeat", &paddy_sample())
            .expect("pipeline");
    }
    assert_eq!(advisor.store_mut().fact_count(), 1);
}
