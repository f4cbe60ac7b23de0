//! A* route search over a [`FieldMap`].
//!
//! The frontier holds whole partial paths keyed by `f = g + h`; the first
//! time the goal is popped its path is optimal, provided the heuristic
//! never overestimates. An unreachable goal is a normal `None` return, not
//! an error: the caller reacts to a blocked route without exceptional
//! control flow.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::planner::map::{FieldMap, LocId};

/// A computed route: ordered locations from start to goal and total cost.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub path: Vec<LocId>,
    pub cost: f64,
}

/// One frontier entry: a partial path and its priority keys.
///
/// Ordered by `f`, then accumulated cost `g`, then insertion sequence, so
/// the ordering is total and ties resolve deterministically.
#[derive(Debug)]
struct FrontierEntry {
    f: f64,
    g: f64,
    seq: u64,
    location: LocId,
    path: Vec<LocId>,
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FrontierEntry {}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; invert so the smallest key pops first.
        self.f
            .total_cmp(&other.f)
            .then(self.g.total_cmp(&other.g))
            .then(self.seq.cmp(&other.seq))
            .reverse()
    }
}

/// Finds a minimum-cost route from `start` to `goal`.
///
/// Returns `None` when the goal is unreachable (or either endpoint is not
/// on the map). Pure function of its inputs.
pub fn a_star(map: &FieldMap, start: LocId, goal: LocId) -> Option<Route> {
    if !map.contains(start) || !map.contains(goal) {
        return None;
    }

    let mut frontier = BinaryHeap::new();
    let mut finalized = vec![false; map.len()];
    let mut seq = 0u64;
    frontier.push(FrontierEntry {
        f: map.heuristic(start),
        g: 0.0,
        seq,
        location: start,
        path: vec![start],
    });

    while let Some(entry) = frontier.pop() {
        if entry.location == goal {
            return Some(Route {
                path: entry.path,
                cost: entry.g,
            });
        }
        if finalized[entry.location.index()] {
            continue;
        }
        finalized[entry.location.index()] = true;

        for &(neighbor, cost) in map.neighbors(entry.location) {
            if finalized[neighbor.index()] {
                continue;
            }
            let g = entry.g + cost;
            let mut path = entry.path.clone();
            path.push(neighbor);
            seq += 1;
            frontier.push(FrontierEntry {
                f: g + map.heuristic(neighbor),
                g,
                seq,
                location: neighbor,
                path,
            });
        }
    }

    None
}
