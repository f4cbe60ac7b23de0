//! The farm location graph.
//!
//! A [`FieldMap`] is the immutable, validated form of a
//! [`MapSpec`](crate::catalog::MapSpec): named locations, undirected
//! weighted edges and a per-location heuristic estimate toward the goal.
//! Built once at startup and shared read-only by every search.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::catalog::{MapSpec, SpecError};

/// A unique identifier for a location on the farm map.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct LocId(pub u32);

impl LocId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// An immutable weighted location graph with a heuristic table.
#[derive(Debug, Clone)]
pub struct FieldMap {
    names: Vec<Arc<str>>,
    index: FxHashMap<Arc<str>, LocId>,
    /// Outgoing edges per location, sorted by neighbor id for determinism.
    adjacency: Vec<Vec<(LocId, f64)>>,
    /// Estimated remaining cost to `goal` per location. Admissibility (no
    /// overestimate) is a precondition on the data, not verified here.
    heuristic: Vec<f64>,
    start: LocId,
    goal: LocId,
}

impl FieldMap {
    /// Builds and validates a map from its specification.
    pub fn build(spec: &MapSpec) -> Result<Self, SpecError> {
        let mut index: FxHashMap<Arc<str>, LocId> = FxHashMap::default();
        let mut names: Vec<Arc<str>> = Vec::with_capacity(spec.locations.len());
        for name in &spec.locations {
            let interned: Arc<str> = Arc::from(name.as_str());
            let id = LocId(names.len() as u32);
            if index.insert(interned.clone(), id).is_some() {
                return Err(SpecError::DuplicateLocation(name.clone()));
            }
            names.push(interned);
        }

        let resolve = |name: &str| -> Result<LocId, SpecError> {
            index
                .get(name)
                .copied()
                .ok_or_else(|| SpecError::UnknownLocation(name.to_string()))
        };

        let mut adjacency: Vec<Vec<(LocId, f64)>> = vec![Vec::new(); names.len()];
        for edge in &spec.edges {
            let from = resolve(&edge.from)?;
            let to = resolve(&edge.to)?;
            if !edge.cost.is_finite() || edge.cost < 0.0 {
                return Err(SpecError::InvalidCost {
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                    cost: edge.cost,
                });
            }
            adjacency[from.index()].push((to, edge.cost));
            adjacency[to.index()].push((from, edge.cost));
        }
        for neighbors in &mut adjacency {
            neighbors.sort_unstable_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));
        }

        let mut heuristic = vec![f64::NAN; names.len()];
        for (name, estimate) in &spec.heuristic {
            let id = resolve(name)?;
            if !estimate.is_finite() || *estimate < 0.0 {
                return Err(SpecError::InvalidHeuristic(name.clone()));
            }
            heuristic[id.index()] = *estimate;
        }
        if let Some(missing) = heuristic.iter().position(|h| h.is_nan()) {
            return Err(SpecError::InvalidHeuristic(names[missing].to_string()));
        }

        let start = resolve(&spec.start)?;
        let goal = resolve(&spec.goal)?;

        Ok(Self {
            names,
            index,
            adjacency,
            heuristic,
            start,
            goal,
        })
    }

    /// Number of locations.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Resolves a location name to its id.
    pub fn loc_id(&self, name: &str) -> Option<LocId> {
        self.index.get(name).copied()
    }

    /// The name for an id produced by this map.
    pub fn name(&self, id: LocId) -> &str {
        &self.names[id.index()]
    }

    /// Outgoing edges of a location, sorted by neighbor id.
    pub fn neighbors(&self, id: LocId) -> &[(LocId, f64)] {
        &self.adjacency[id.index()]
    }

    /// Estimated remaining cost from a location to the goal.
    pub fn heuristic(&self, id: LocId) -> f64 {
        self.heuristic[id.index()]
    }

    /// The designated route start (drone base station).
    pub fn start(&self) -> LocId {
        self.start
    }

    /// The designated route goal (flagged plot).
    pub fn goal(&self) -> LocId {
        self.goal
    }

    #[inline]
    pub(crate) fn contains(&self, id: LocId) -> bool {
        id.index() < self.names.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{farm_map, MapEdgeSpec, MapSpec};
    use std::collections::BTreeMap;

    #[test]
    fn build_accepts_preset_map() {
        let map = FieldMap::build(&farm_map()).expect("valid preset");
        assert_eq!(map.len(), 7);
        assert_eq!(map.name(map.start()), "base_station");
        assert_eq!(map.name(map.goal()), "critical_plot");
        assert_eq!(map.heuristic(map.goal()), 0.0);
    }

    #[test]
    fn edges_are_undirected() {
        let map = FieldMap::build(&farm_map()).expect("valid preset");
        let a = map.loc_id("plot_a").expect("plot_a");
        let base = map.loc_id("base_station").expect("base");
        assert!(map.neighbors(base).iter().any(|(n, c)| *n == a && *c == 10.0));
        assert!(map.neighbors(a).iter().any(|(n, c)| *n == base && *c == 10.0));
    }

    #[test]
    fn build_rejects_negative_cost() {
        let mut spec = farm_map();
        spec.edges.push(MapEdgeSpec {
            from: "plot_a".into(),
            to: "plot_b".into(),
            cost: -1.0,
        });
        let err = FieldMap::build(&spec).expect_err("negative cost");
        assert!(matches!(err, SpecError::InvalidCost { .. }));
    }

    #[test]
    fn build_rejects_unknown_edge_endpoint() {
        let mut spec = farm_map();
        spec.edges.push(MapEdgeSpec {
            from: "plot_a".into(),
            to: "greenhouse".into(),
            cost: 3.0,
        });
        let err = FieldMap::build(&spec).expect_err("unknown endpoint");
        assert!(matches!(err, SpecError::UnknownLocation(name) if name == "greenhouse"));
    }

    #[test]
    fn build_rejects_missing_heuristic_entry() {
        let spec = MapSpec {
            locations: vec!["a".into(), "b".into()],
            edges: vec![MapEdgeSpec {
                from: "a".into(),
                to: "b".into(),
                cost: 1.0,
            }],
            heuristic: BTreeMap::from([("a".into(), 1.0)]),
            start: "a".into(),
            goal: "b".into(),
        };
        let err = FieldMap::build(&spec).expect_err("missing heuristic");
        assert!(matches!(err, SpecError::InvalidHeuristic(name) if name == "b"));
    }

    #[test]
    fn build_rejects_duplicate_location() {
        let mut spec = farm_map();
        spec.locations.push("plot_a".into());
        let err = FieldMap::build(&spec).expect_err("duplicate");
        assert!(matches!(err, SpecError::DuplicateLocation(_)));
    }
}
