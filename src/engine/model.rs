//! The graphical-model store.
//!
//! A [`BeliefNet`] holds the fixed DAG of binary variables and their
//! conditional probability tables. It is built once from a
//! [`NetworkSpec`](crate::catalog::NetworkSpec), validated eagerly, and
//! shared read-only by all queries afterwards.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::catalog::NetworkSpec;
use crate::engine::errors::EngineError;

/// Every variable is binary.
pub const CARDINALITY: usize = 2;

/// Tolerance for CPT row normalization checks.
const ROW_SUM_TOLERANCE: f64 = 1e-6;

/// A unique identifier for a variable in the belief net.
///
/// Ids are assigned in declaration order, so ascending-id iteration is the
/// deterministic default everywhere.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct VarId(pub u32);

impl VarId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// A declared variable: name, parent list and owned CPT.
#[derive(Debug, Clone)]
pub struct Variable {
    name: Arc<str>,
    /// Parents in significance order (first = most significant in the row
    /// index). Matches the declared edge set exactly.
    parents: SmallVec<[VarId; 2]>,
    /// Row-major table: `rows x CARDINALITY`, one row per parent-value
    /// combination; each row sums to 1.
    cpt: Vec<f64>,
}

impl Variable {
    /// The variable's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parents in significance order.
    pub fn parents(&self) -> &[VarId] {
        &self.parents
    }

    /// Number of parent-value combinations.
    pub fn rows(&self) -> usize {
        1 << self.parents.len()
    }

    /// `P(self = value | parent assignment indexed by row)`.
    #[inline]
    pub fn probability(&self, row: usize, value: u8) -> f64 {
        self.cpt[row * CARDINALITY + value as usize]
    }
}

/// An immutable discrete Bayesian network over binary variables.
#[derive(Debug, Clone)]
pub struct BeliefNet {
    variables: Vec<Variable>,
    index: FxHashMap<Arc<str>, VarId>,
}

impl BeliefNet {
    /// Builds and validates a net from its specification.
    ///
    /// Fails with [`EngineError::ModelInvalid`] if any CPT row does not sum
    /// to 1, if a CPT's parent list disagrees with the declared edges, if
    /// the edge set contains a cycle, or if names are duplicated or
    /// undeclared.
    pub fn build(spec: &NetworkSpec) -> Result<Self, EngineError> {
        let mut index: FxHashMap<Arc<str>, VarId> = FxHashMap::default();
        let mut names: Vec<Arc<str>> = Vec::with_capacity(spec.variables.len());
        for name in &spec.variables {
            let interned: Arc<str> = Arc::from(name.as_str());
            let id = VarId(names.len() as u32);
            if index.insert(interned.clone(), id).is_some() {
                return Err(EngineError::ModelInvalid(format!(
                    "variable '{name}' declared twice"
                )));
            }
            names.push(interned);
        }

        let resolve = |name: &str| -> Result<VarId, EngineError> {
            index
                .get(name)
                .copied()
                .ok_or_else(|| EngineError::UnknownVariable(name.to_string()))
        };

        // Parent lists from the declared edges, in edge-declaration order.
        let mut parents: Vec<SmallVec<[VarId; 2]>> = vec![SmallVec::new(); names.len()];
        for (parent, child) in &spec.edges {
            let p = resolve(parent)?;
            let c = resolve(child)?;
            if parents[c.index()].contains(&p) {
                return Err(EngineError::ModelInvalid(format!(
                    "duplicate edge '{parent}' -> '{child}'"
                )));
            }
            parents[c.index()].push(p);
        }

        detect_cycles(&names, &parents)?;

        // One CPT per variable, matching the declared parent set in order.
        let mut tables: Vec<Option<Vec<f64>>> = vec![None; names.len()];
        for cpt in &spec.cpts {
            let id = resolve(&cpt.variable)?;
            if tables[id.index()].is_some() {
                return Err(EngineError::ModelInvalid(format!(
                    "variable '{}' has more than one CPT",
                    cpt.variable
                )));
            }

            let declared: SmallVec<[VarId; 2]> = cpt
                .parents
                .iter()
                .map(|p| resolve(p))
                .collect::<Result<_, _>>()?;
            if declared != parents[id.index()] {
                return Err(EngineError::ModelInvalid(format!(
                    "CPT parent set for '{}' does not match its declared parents",
                    cpt.variable
                )));
            }

            let expected_rows = 1usize << declared.len();
            if cpt.rows.len() != expected_rows {
                return Err(EngineError::ModelInvalid(format!(
                    "CPT for '{}' has {} rows, expected {expected_rows}",
                    cpt.variable,
                    cpt.rows.len()
                )));
            }

            let mut table = Vec::with_capacity(expected_rows * CARDINALITY);
            for (row_idx, row) in cpt.rows.iter().enumerate() {
                let sum: f64 = row.iter().sum();
                if row.iter().any(|p| !p.is_finite() || *p < 0.0 || *p > 1.0) {
                    return Err(EngineError::ModelInvalid(format!(
                        "CPT for '{}' row {row_idx} contains a probability outside [0, 1]",
                        cpt.variable
                    )));
                }
                if (sum - 1.0).abs() > ROW_SUM_TOLERANCE {
                    return Err(EngineError::ModelInvalid(format!(
                        "CPT for '{}' row {row_idx} sums to {sum}, expected 1",
                        cpt.variable
                    )));
                }
                table.extend_from_slice(row);
            }
            tables[id.index()] = Some(table);
        }

        let mut variables = Vec::with_capacity(names.len());
        for (idx, name) in names.iter().enumerate() {
            let cpt = tables[idx].take().ok_or_else(|| {
                EngineError::ModelInvalid(format!("variable '{name}' has no CPT"))
            })?;
            variables.push(Variable {
                name: name.clone(),
                parents: std::mem::take(&mut parents[idx]),
                cpt,
            });
        }

        Ok(Self { variables, index })
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Whether the net declares no variables.
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Resolves a variable name to its id.
    pub fn var_id(&self, name: &str) -> Result<VarId, EngineError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| EngineError::UnknownVariable(name.to_string()))
    }

    /// The declaration for an id produced by this net.
    pub fn variable(&self, id: VarId) -> &Variable {
        &self.variables[id.index()]
    }

    /// All variables in declaration order.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }
}

/// Rejects cyclic edge sets via Kahn's algorithm.
fn detect_cycles(
    names: &[Arc<str>],
    parents: &[SmallVec<[VarId; 2]>],
) -> Result<(), EngineError> {
    let mut in_degree: Vec<usize> = parents.iter().map(|p| p.len()).collect();
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); names.len()];
    for (child, ps) in parents.iter().enumerate() {
        for p in ps {
            children[p.index()].push(child);
        }
    }

    let mut ready: Vec<usize> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, d)| **d == 0)
        .map(|(i, _)| i)
        .collect();
    let mut visited = 0usize;
    while let Some(node) = ready.pop() {
        visited += 1;
        for &child in &children[node] {
            in_degree[child] -= 1;
            if in_degree[child] == 0 {
                ready.push(child);
            }
        }
    }

    if visited != names.len() {
        let stuck: Vec<&str> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, d)| **d > 0)
            .map(|(i, _)| names[i].as_ref())
            .collect();
        return Err(EngineError::ModelInvalid(format!(
            "dependency cycle involving: {}",
            stuck.join(", ")
        )));
    }
    Ok(())
}
