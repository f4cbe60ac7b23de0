//! Factors for variable elimination.
//!
//! A factor is a function from assignments of a small variable set to a
//! non-negative weight, stored as a flat table with an explicit, sorted
//! domain list. Index convention: the first domain variable is the most
//! significant bit of the table index, matching the CPT row convention.

use smallvec::SmallVec;

use crate::engine::model::{BeliefNet, VarId, CARDINALITY};

/// A factor over a sorted set of binary variables.
#[derive(Debug, Clone)]
pub(crate) struct Factor {
    /// Domain variables in strictly ascending id order.
    pub vars: SmallVec<[VarId; 4]>,
    /// `2^vars.len()` weights; `vars[0]` is the most significant index bit.
    pub values: Vec<f64>,
}

impl Factor {
    /// Builds the factor for one variable's CPT: its domain is the variable
    /// plus its parents, and each entry is `P(var = v | parents)`.
    pub fn from_cpt(net: &BeliefNet, id: VarId) -> Factor {
        let variable = net.variable(id);
        let parents = variable.parents();
        let parent_count = parents.len();

        let mut vars: SmallVec<[VarId; 4]> = parents.iter().copied().collect();
        vars.push(id);
        vars.sort_unstable();

        // For each sorted position, record where its bit comes from:
        // 0 = the variable itself, k+1 = declared parent k.
        let sources: SmallVec<[usize; 4]> = vars
            .iter()
            .map(|v| {
                parents
                    .iter()
                    .position(|p| p == v)
                    .map(|k| k + 1)
                    .unwrap_or(0)
            })
            .collect();

        let mut values = vec![0.0; 1 << vars.len()];
        for row in 0..variable.rows() {
            for value in 0..CARDINALITY {
                let mut idx = 0usize;
                for &src in &sources {
                    let bit = if src == 0 {
                        value
                    } else {
                        // Declared parent k has weight 2^(parent_count-1-k).
                        (row >> (parent_count - src)) & 1
                    };
                    idx = (idx << 1) | bit;
                }
                values[idx] = variable.probability(row, value as u8);
            }
        }
        Factor { vars, values }
    }

    /// Whether the factor's domain mentions `var`.
    pub fn mentions(&self, var: VarId) -> bool {
        self.vars.binary_search(&var).is_ok()
    }

    /// Fixes `var = value`, removing it from the domain.
    pub fn reduce(&self, var: VarId, value: u8) -> Factor {
        let Some(pos) = self.vars.iter().position(|v| *v == var) else {
            return self.clone();
        };
        let arity = self.vars.len();
        let mut vars = self.vars.clone();
        vars.remove(pos);

        let mut values = vec![0.0; self.values.len() >> 1];
        for (idx, weight) in self.values.iter().enumerate() {
            if bit_at(idx, pos, arity) == value as usize {
                values[drop_bit(idx, pos, arity)] = *weight;
            }
        }
        Factor { vars, values }
    }

    /// Sums `var` out of the factor.
    pub fn marginalize(&self, var: VarId) -> Factor {
        let Some(pos) = self.vars.iter().position(|v| *v == var) else {
            return self.clone();
        };
        let arity = self.vars.len();
        let mut vars = self.vars.clone();
        vars.remove(pos);

        let mut values = vec![0.0; self.values.len() >> 1];
        for (idx, weight) in self.values.iter().enumerate() {
            values[drop_bit(idx, pos, arity)] += *weight;
        }
        Factor { vars, values }
    }

    /// Pointwise product over the union of both domains.
    pub fn product(&self, other: &Factor) -> Factor {
        // Merge the two sorted domains, recording each factor's variable
        // positions inside the union.
        let mut vars: SmallVec<[VarId; 4]> = SmallVec::new();
        let mut left_pos: SmallVec<[usize; 4]> = SmallVec::new();
        let mut right_pos: SmallVec<[usize; 4]> = SmallVec::new();
        let (mut i, mut j) = (0usize, 0usize);
        while i < self.vars.len() || j < other.vars.len() {
            let take_left = match (self.vars.get(i), other.vars.get(j)) {
                (Some(a), Some(b)) => a <= b,
                (Some(_), None) => true,
                _ => false,
            };
            if take_left {
                if other.vars.get(j) == self.vars.get(i) {
                    right_pos.push(vars.len());
                    j += 1;
                }
                left_pos.push(vars.len());
                vars.push(self.vars[i]);
                i += 1;
            } else {
                right_pos.push(vars.len());
                vars.push(other.vars[j]);
                j += 1;
            }
        }

        let arity = vars.len();
        let mut values = vec![0.0; 1 << arity];
        for (idx, slot) in values.iter_mut().enumerate() {
            let li = gather_bits(idx, arity, &left_pos);
            let ri = gather_bits(idx, arity, &right_pos);
            *slot = self.values[li] * other.values[ri];
        }
        Factor { vars, values }
    }
}

/// The assignment bit of domain position `pos` inside table index `idx`.
#[inline]
fn bit_at(idx: usize, pos: usize, arity: usize) -> usize {
    (idx >> (arity - 1 - pos)) & 1
}

/// Removes the bit at domain position `pos` from `idx`.
#[inline]
fn drop_bit(idx: usize, pos: usize, arity: usize) -> usize {
    let low_width = arity - 1 - pos;
    let low = idx & ((1 << low_width) - 1);
    let high = idx >> (low_width + 1);
    (high << low_width) | low
}

/// Projects a union-domain index onto a sub-domain given its positions.
#[inline]
fn gather_bits(idx: usize, arity: usize, positions: &[usize]) -> usize {
    let mut out = 0usize;
    for &pos in positions {
        out = (out << 1) | bit_at(idx, pos, arity);
    }
    out
}
