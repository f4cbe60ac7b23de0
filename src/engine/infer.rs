//! Exact posterior queries by variable elimination.
//!
//! A query starts from every variable's CPT as a factor, fixes the observed
//! evidence, sums the remaining non-target variables out one by one, and
//! normalizes the residual table over the target. The engine is purely
//! functional over the immutable net and the per-call evidence; elimination
//! order affects only the intermediate table sizes, never the result.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::engine::errors::EngineError;
use crate::engine::factor::Factor;
use crate::engine::model::{BeliefNet, VarId, CARDINALITY};

/// Observed `variable = value` facts a query conditions on.
///
/// Per-query and never persisted; values are 0 or 1.
#[derive(Debug, Clone, Default)]
pub struct Evidence {
    observed: FxHashMap<VarId, u8>,
}

impl Evidence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `var = value`. A later observation of the same variable
    /// replaces the earlier one.
    pub fn observe(&mut self, var: VarId, value: u8) -> &mut Self {
        self.observed.insert(var, value);
        self
    }

    /// The observed value for `var`, if any.
    pub fn value_of(&self, var: VarId) -> Option<u8> {
        self.observed.get(&var).copied()
    }

    pub fn len(&self) -> usize {
        self.observed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observed.is_empty()
    }

    /// Observations in ascending variable order.
    fn sorted(&self) -> Vec<(VarId, u8)> {
        let mut entries: Vec<(VarId, u8)> = self.observed.iter().map(|(v, x)| (*v, *x)).collect();
        entries.sort_unstable_by_key(|(v, _)| *v);
        entries
    }
}

/// A normalized posterior distribution over one binary variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Posterior {
    values: [f64; 2],
}

impl Posterior {
    /// `P(target = value | evidence)`.
    #[inline]
    pub fn probability(&self, value: u8) -> f64 {
        self.values[value as usize]
    }

    /// `P(target = 1 | evidence)`.
    #[inline]
    pub fn p_true(&self) -> f64 {
        self.values[1]
    }

    /// The full distribution, indexed by value.
    pub fn distribution(&self) -> [f64; 2] {
        self.values
    }
}

impl BeliefNet {
    /// Posterior for a variable looked up by name. See [`query`].
    pub fn query(&self, target: &str, evidence: &Evidence) -> Result<Posterior, EngineError> {
        let id = self.var_id(target)?;
        query(self, id, evidence)
    }
}

/// Computes `P(target | evidence)` under the default elimination order
/// (remaining variables in ascending id order).
pub fn query(net: &BeliefNet, target: VarId, evidence: &Evidence) -> Result<Posterior, EngineError> {
    check_inputs(net, target, evidence)?;
    let order = default_order(net, target, evidence);
    run_query(net, target, evidence, &order)
}

/// Computes `P(target | evidence)` under a caller-chosen elimination order.
///
/// The order must cover exactly the non-target, non-evidence variables; any
/// valid order yields the same posterior, so this entry point exists for
/// order-invariance checks and for probing elimination cost.
pub fn query_with_order(
    net: &BeliefNet,
    target: VarId,
    evidence: &Evidence,
    order: &[VarId],
) -> Result<Posterior, EngineError> {
    check_inputs(net, target, evidence)?;
    let mut expected = default_order(net, target, evidence);
    let mut given: Vec<VarId> = order.to_vec();
    expected.sort_unstable();
    given.sort_unstable();
    if expected != given {
        return Err(EngineError::ModelInvalid(
            "elimination order must cover exactly the non-target, non-evidence variables".into(),
        ));
    }
    run_query(net, target, evidence, order)
}

fn check_inputs(net: &BeliefNet, target: VarId, evidence: &Evidence) -> Result<(), EngineError> {
    if target.index() >= net.len() {
        return Err(EngineError::UnknownVariable(format!("#{}", target.0)));
    }
    for (var, value) in evidence.sorted() {
        if var.index() >= net.len() {
            return Err(EngineError::UnknownVariable(format!("#{}", var.0)));
        }
        if value as usize >= CARDINALITY {
            return Err(EngineError::ModelInvalid(format!(
                "evidence value {value} for '{}' is out of range",
                net.variable(var).name()
            )));
        }
    }
    Ok(())
}

/// Remaining variables in ascending id order.
fn default_order(net: &BeliefNet, target: VarId, evidence: &Evidence) -> Vec<VarId> {
    (0..net.len() as u32)
        .map(VarId)
        .filter(|v| *v != target && evidence.value_of(*v).is_none())
        .collect()
}

fn run_query(
    net: &BeliefNet,
    target: VarId,
    evidence: &Evidence,
    order: &[VarId],
) -> Result<Posterior, EngineError> {
    // An observed target conditions on its own value: the posterior is
    // degenerate at the observation whenever the evidence as a whole is
    // satisfiable.
    if let Some(value) = evidence.value_of(target) {
        let mut rest = evidence.clone();
        rest.observed.remove(&target);
        let marginal = eliminate(net, target, &rest, order)?;
        if marginal.probability(value) <= 0.0 {
            return Err(EngineError::Unsatisfiable(describe(net, evidence)));
        }
        let mut values = [0.0; 2];
        values[value as usize] = 1.0;
        return Ok(Posterior { values });
    }
    eliminate(net, target, evidence, order)
}

fn eliminate(
    net: &BeliefNet,
    target: VarId,
    evidence: &Evidence,
    order: &[VarId],
) -> Result<Posterior, EngineError> {
    // Every CPT becomes a factor, immediately reduced by the evidence.
    let observations = evidence.sorted();
    let mut factors: Vec<Factor> = Vec::with_capacity(net.len());
    for idx in 0..net.len() as u32 {
        let mut factor = Factor::from_cpt(net, VarId(idx));
        for &(var, value) in &observations {
            if factor.mentions(var) {
                factor = factor.reduce(var, value);
            }
        }
        factors.push(factor);
    }

    // Sum each remaining variable out of the product of the factors that
    // mention it.
    for &var in order {
        let (mentioning, rest): (Vec<Factor>, Vec<Factor>) =
            factors.into_iter().partition(|f| f.mentions(var));
        factors = rest;
        let mut combined: Option<Factor> = None;
        for factor in mentioning {
            combined = Some(match combined {
                Some(product) => product.product(&factor),
                None => factor,
            });
        }
        if let Some(product) = combined {
            factors.push(product.marginalize(var));
        }
    }

    // What is left mentions only the target (or nothing at all).
    let mut result = Factor {
        vars: SmallVec::from_slice(&[target]),
        values: vec![1.0; CARDINALITY],
    };
    for factor in &factors {
        result = result.product(factor);
    }

    let total: f64 = result.values.iter().sum();
    if !total.is_finite() || total < f64::MIN_POSITIVE {
        return Err(EngineError::Unsatisfiable(describe(net, evidence)));
    }
    Ok(Posterior {
        values: [result.values[0] / total, result.values[1] / total],
    })
}

/// Renders evidence as `name=value` pairs for error messages.
fn describe(net: &BeliefNet, evidence: &Evidence) -> String {
    if evidence.is_empty() {
        return "no evidence".into();
    }
    evidence
        .sorted()
        .iter()
        .map(|(var, value)| format!("{}={value}", net.variable(*var).name()))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{plant_health_network, vars, CptSpec, NetworkSpec};

    const TOL: f64 = 1e-9;

    fn preset() -> BeliefNet {
        BeliefNet::build(&plant_health_network()).expect("valid preset")
    }

    fn assert_close(actual: f64, expected: f64, label: &str) {
        assert!(
            (actual - expected).abs() <= TOL,
            "{label}: expected {expected:.12}, got {actual:.12}"
        );
    }

    #[test]
    fn no_evidence_returns_root_priors() {
        let net = preset();
        let rain = net.query(vars::RAIN, &Evidence::new()).expect("rain prior");
        assert_close(rain.p_true(), 0.3, "rain prior");

        let humidity = net
            .query(vars::HUMIDITY, &Evidence::new())
            .expect("humidity prior");
        assert_close(humidity.p_true(), 0.4, "humidity prior");
    }

    #[test]
    fn no_evidence_marginalizes_hidden_variables() {
        // P(disease=1) = 0.6*0.1 + 0.4*0.4; P(stress=1) = 0.7*0.8 + 0.3*0.1.
        let net = preset();
        let disease = net.query(vars::DISEASE, &Evidence::new()).expect("disease");
        assert_close(disease.p_true(), 0.22, "disease marginal");

        let stress = net
            .query(vars::WATER_STRESS, &Evidence::new())
            .expect("stress");
        assert_close(stress.p_true(), 0.59, "stress marginal");
    }

    #[test]
    fn leaf_spots_raise_disease_posterior() {
        let net = preset();
        let mut evidence = Evidence::new();
        evidence.observe(net.var_id(vars::LEAF_SPOTS).expect("spots"), 1);

        let disease = net.query(vars::DISEASE, &evidence).expect("disease");
        assert_close(disease.p_true(), 0.8186046511627907, "P(disease | spots)");
    }

    #[test]
    fn confirming_water_stress_explains_yellowing_away() {
        let net = preset();
        let mut yellow_only = Evidence::new();
        yellow_only.observe(net.var_id(vars::YELLOWING).expect("yellow"), 1);
        let baseline = net.query(vars::DISEASE, &yellow_only).expect("baseline");

        let mut with_stress = yellow_only.clone();
        with_stress.observe(net.var_id(vars::WATER_STRESS).expect("stress"), 1);
        let explained = net.query(vars::DISEASE, &with_stress).expect("explained");

        assert_close(baseline.p_true(), 0.32676130389064145, "P(disease | yellow)");
        assert_close(
            explained.p_true(),
            0.25090036014405764,
            "P(disease | yellow, stress)",
        );
        assert!(explained.p_true() < baseline.p_true());
    }

    #[test]
    fn wet_season_yellowing_points_at_disease_over_stress() {
        // Yellow leaves with no spots after heavy rain: the stress cause is
        // suppressed, so suspicion shifts to disease.
        let net = preset();
        let mut evidence = Evidence::new();
        evidence
            .observe(net.var_id(vars::LEAF_SPOTS).expect("spots"), 0)
            .observe(net.var_id(vars::YELLOWING).expect("yellow"), 1)
            .observe(net.var_id(vars::RAIN).expect("rain"), 1)
            .observe(net.var_id(vars::HUMIDITY).expect("humidity"), 1);

        let disease = net.query(vars::DISEASE, &evidence).expect("disease");
        let stress = net.query(vars::WATER_STRESS, &evidence).expect("stress");
        assert_close(disease.p_true(), 0.44874274661508706, "wet disease");
        assert_close(stress.p_true(), 0.411605415860735, "wet stress");
        assert!(disease.p_true() > stress.p_true());
    }

    #[test]
    fn dry_season_yellowing_points_at_thirst() {
        let net = preset();
        let mut evidence = Evidence::new();
        evidence
            .observe(net.var_id(vars::LEAF_SPOTS).expect("spots"), 0)
            .observe(net.var_id(vars::YELLOWING).expect("yellow"), 1)
            .observe(net.var_id(vars::RAIN).expect("rain"), 0)
            .observe(net.var_id(vars::HUMIDITY).expect("humidity"), 0);

        let disease = net.query(vars::DISEASE, &evidence).expect("disease");
        let stress = net.query(vars::WATER_STRESS, &evidence).expect("stress");
        assert!(stress.p_true() > 0.9);
        assert!(disease.p_true() < 0.1);
    }

    #[test]
    fn posterior_is_invariant_to_elimination_order() {
        let net = preset();
        let target = net.var_id(vars::DISEASE).expect("disease");
        let mut evidence = Evidence::new();
        evidence
            .observe(net.var_id(vars::YELLOWING).expect("yellow"), 1)
            .observe(net.var_id(vars::RAIN).expect("rain"), 1);

        let baseline = query(&net, target, &evidence).expect("default order");

        let remaining: Vec<VarId> = (0..net.len() as u32)
            .map(VarId)
            .filter(|v| *v != target && evidence.value_of(*v).is_none())
            .collect();
        let mut reversed = remaining.clone();
        reversed.reverse();
        let mut rotated = remaining.clone();
        rotated.rotate_left(1);

        for order in [reversed, rotated] {
            let posterior = query_with_order(&net, target, &evidence, &order).expect("order");
            assert_close(posterior.p_true(), baseline.p_true(), "order invariance");
        }
    }

    #[test]
    fn query_with_order_rejects_incomplete_orders() {
        let net = preset();
        let target = net.var_id(vars::DISEASE).expect("disease");
        let err = query_with_order(&net, target, &Evidence::new(), &[]).expect_err("short order");
        assert!(matches!(err, EngineError::ModelInvalid(_)));
    }

    #[test]
    fn deterministic_chain_gives_degenerate_posterior() {
        // effect copies cause exactly; observing the only other variable
        // pins the target.
        let spec = NetworkSpec {
            variables: vec!["cause".into(), "effect".into()],
            edges: vec![("cause".into(), "effect".into())],
            cpts: vec![
                CptSpec {
                    variable: "cause".into(),
                    parents: vec![],
                    rows: vec![[0.4, 0.6]],
                },
                CptSpec {
                    variable: "effect".into(),
                    parents: vec!["cause".into()],
                    rows: vec![[1.0, 0.0], [0.0, 1.0]],
                },
            ],
        };
        let net = BeliefNet::build(&spec).expect("deterministic chain");
        let mut evidence = Evidence::new();
        evidence.observe(net.var_id("cause").expect("cause"), 1);

        let posterior = net.query("effect", &evidence).expect("effect");
        assert_close(posterior.probability(1), 1.0, "degenerate high");
        assert_close(posterior.probability(0), 0.0, "degenerate low");
    }

    #[test]
    fn observed_target_returns_its_observation() {
        let net = preset();
        let mut evidence = Evidence::new();
        evidence.observe(net.var_id(vars::DISEASE).expect("disease"), 1);

        let posterior = net.query(vars::DISEASE, &evidence).expect("self-conditioned");
        assert_close(posterior.p_true(), 1.0, "observed target");
    }

    #[test]
    fn impossible_evidence_is_reported_not_divided_by() {
        // effect is a hard copy of cause, so cause=1 with effect=0 has zero
        // joint probability.
        let spec = NetworkSpec {
            variables: vec!["cause".into(), "effect".into(), "probe".into()],
            edges: vec![
                ("cause".into(), "effect".into()),
                ("cause".into(), "probe".into()),
            ],
            cpts: vec![
                CptSpec {
                    variable: "cause".into(),
                    parents: vec![],
                    rows: vec![[0.5, 0.5]],
                },
                CptSpec {
                    variable: "effect".into(),
                    parents: vec!["cause".into()],
                    rows: vec![[1.0, 0.0], [0.0, 1.0]],
                },
                CptSpec {
                    variable: "probe".into(),
                    parents: vec!["cause".into()],
                    rows: vec![[0.7, 0.3], [0.2, 0.8]],
                },
            ],
        };
        let net = BeliefNet::build(&spec).expect("valid");
        let mut evidence = Evidence::new();
        evidence
            .observe(net.var_id("cause").expect("cause"), 1)
            .observe(net.var_id("effect").expect("effect"), 0);

        let err = net.query("probe", &evidence).expect_err("unsatisfiable");
        assert!(matches!(err, EngineError::Unsatisfiable(_)), "{err}");
    }

    #[test]
    fn evidence_values_outside_cardinality_are_rejected() {
        let net = preset();
        let mut evidence = Evidence::new();
        evidence.observe(net.var_id(vars::RAIN).expect("rain"), 2);
        let err = net.query(vars::DISEASE, &evidence).expect_err("bad value");
        assert!(matches!(err, EngineError::ModelInvalid(_)));
    }

    #[test]
    fn unknown_target_is_reported_by_name() {
        let net = preset();
        let err = net.query("blight", &Evidence::new()).expect_err("unknown");
        assert!(matches!(err, EngineError::UnknownVariable(name) if name == "blight"));
    }

    #[test]
    fn full_non_target_evidence_matches_hand_computed_conditional() {
        // All five other variables observed; the exact conditional for the
        // disease node follows from Bayes over the two remaining rows.
        let net = preset();
        let mut evidence = Evidence::new();
        evidence
            .observe(net.var_id(vars::RAIN).expect("rain"), 1)
            .observe(net.var_id(vars::HUMIDITY).expect("humidity"), 1)
            .observe(net.var_id(vars::WATER_STRESS).expect("stress"), 0)
            .observe(net.var_id(vars::YELLOWING).expect("yellow"), 1)
            .observe(net.var_id(vars::LEAF_SPOTS).expect("spots"), 1);

        let posterior = net.query(vars::DISEASE, &evidence).expect("disease");
        // P ∝ P(M|H=1) * P(Y=1|S=0,M) * P(F=1|M):
        //   M=0: 0.6 * 0.05 * 0.05,  M=1: 0.4 * 0.7 * 0.8.
        let m0 = 0.6 * 0.05 * 0.05;
        let m1 = 0.4 * 0.7 * 0.8;
        assert_close(posterior.p_true(), m1 / (m0 + m1), "full conditional");
    }
}
