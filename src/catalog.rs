//! Static specifications for the advisory core.
//!
//! Everything the system needs at startup is described by plain serde
//! structs: the plant-health network ([`NetworkSpec`]), the farm map
//! ([`MapSpec`]) and the diagnosis configuration. Specs are loaded once,
//! turned into immutable runtime structures and shared read-only by all
//! queries afterwards.
//!
//! The built-in presets ([`plant_health_network`], [`farm_map`]) carry the
//! production network and map shipped with the advisor.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::advisor::decision::DiagnosisConfig;

/// Variable names of the built-in plant-health network.
///
/// The advisor queries the network through these names; a custom network
/// supplied via [`AdvisorConfig`] must declare all six.
pub mod vars {
    /// Root: abundant rainfall (0 = scarce, 1 = abundant).
    pub const RAIN: &str = "rain";
    /// Root: high ambient humidity (0 = low, 1 = high).
    pub const HUMIDITY: &str = "humidity";
    /// Hidden: water stress, driven by rainfall.
    pub const WATER_STRESS: &str = "water_stress";
    /// Hidden: fungal disease presence, driven by humidity.
    pub const DISEASE: &str = "disease";
    /// Observable: leaf yellowing (common effect of stress and disease).
    pub const YELLOWING: &str = "yellowing";
    /// Observable: leaf spots (effect of disease only).
    pub const LEAF_SPOTS: &str = "leaf_spots";
}

/// Errors raised while reading or checking a static specification.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SpecError {
    /// An edge or heuristic entry references an undeclared location.
    #[error("unknown location '{0}' in map specification")]
    UnknownLocation(String),

    /// Edge costs must be finite and non-negative.
    #[error("invalid cost {cost} on edge '{from}' - '{to}'")]
    InvalidCost { from: String, to: String, cost: f64 },

    /// Every location needs a heuristic estimate; it must be finite and >= 0.
    #[error("missing or invalid heuristic for location '{0}'")]
    InvalidHeuristic(String),

    /// A location was declared more than once.
    #[error("duplicate location '{0}' in map specification")]
    DuplicateLocation(String),

    /// Configuration file could not be read.
    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file is not valid JSON for [`AdvisorConfig`].
    #[error("cannot parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One conditional probability table.
///
/// `rows` holds one row per parent-value combination, ordered
/// lexicographically with the first-listed parent varying slowest; each row
/// is `[P(var = 0), P(var = 1)]` and must sum to 1. A root variable has an
/// empty parent list and exactly one row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CptSpec {
    /// The variable this table belongs to.
    pub variable: String,
    /// Parents in significance order (first = most significant).
    #[serde(default)]
    pub parents: Vec<String>,
    /// Probability rows, `2^parents.len()` of them.
    pub rows: Vec<[f64; 2]>,
}

/// Specification of a discrete Bayesian network with binary variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Variable names; order fixes the internal id assignment.
    pub variables: Vec<String>,
    /// Directed `parent -> child` edges; must form a DAG.
    pub edges: Vec<(String, String)>,
    /// One CPT per variable, consistent with the declared edges.
    pub cpts: Vec<CptSpec>,
}

/// One undirected weighted edge of the farm map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapEdgeSpec {
    pub from: String,
    pub to: String,
    /// Travel cost in meters, >= 0.
    pub cost: f64,
}

/// Specification of the farm location graph used for drone routing.
///
/// The heuristic estimates remaining cost to `goal` per location; search
/// optimality requires it to never overestimate. That property is a
/// precondition on the data and is not verified here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapSpec {
    pub locations: Vec<String>,
    pub edges: Vec<MapEdgeSpec>,
    pub heuristic: BTreeMap<String, f64>,
    /// Drone base station; inspection routes start here.
    pub start: String,
    /// Flagged plot; inspection routes end here.
    pub goal: String,
}

/// Complete advisor configuration: network, map and diagnosis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorConfig {
    pub network: NetworkSpec,
    pub map: MapSpec,
    #[serde(default)]
    pub diagnosis: DiagnosisConfig,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            network: plant_health_network(),
            map: farm_map(),
            diagnosis: DiagnosisConfig::default(),
        }
    }
}

/// Loads an [`AdvisorConfig`] from a JSON file.
pub fn load_config(path: &Path) -> Result<AdvisorConfig, SpecError> {
    let source = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&source)?)
}

/// The built-in plant-health network.
///
/// Structure:
///
/// ```text
/// rain ──▶ water_stress ──▶ yellowing ◀── disease ◀── humidity
///                                             │
///                                             ▼
///                                        leaf_spots
/// ```
///
/// `yellowing` is the v-structure: both water stress and disease cause it,
/// which is what lets wet-season yellowing shift suspicion toward disease
/// (explaining away the stress cause).
pub fn plant_health_network() -> NetworkSpec {
    NetworkSpec {
        variables: vec![
            vars::RAIN.into(),
            vars::HUMIDITY.into(),
            vars::WATER_STRESS.into(),
            vars::DISEASE.into(),
            vars::YELLOWING.into(),
            vars::LEAF_SPOTS.into(),
        ],
        edges: vec![
            (vars::RAIN.into(), vars::WATER_STRESS.into()),
            (vars::HUMIDITY.into(), vars::DISEASE.into()),
            (vars::WATER_STRESS.into(), vars::YELLOWING.into()),
            (vars::DISEASE.into(), vars::YELLOWING.into()),
            (vars::DISEASE.into(), vars::LEAF_SPOTS.into()),
        ],
        cpts: vec![
            // Scarce summer rainfall is the common case.
            CptSpec {
                variable: vars::RAIN.into(),
                parents: vec![],
                rows: vec![[0.7, 0.3]],
            },
            CptSpec {
                variable: vars::HUMIDITY.into(),
                parents: vec![],
                rows: vec![[0.6, 0.4]],
            },
            // Scarce rain -> 80% stress; abundant rain -> 10% stress.
            CptSpec {
                variable: vars::WATER_STRESS.into(),
                parents: vec![vars::RAIN.into()],
                rows: vec![[0.2, 0.8], [0.9, 0.1]],
            },
            // Low humidity -> 10% disease; high humidity -> 40% disease.
            CptSpec {
                variable: vars::DISEASE.into(),
                parents: vec![vars::HUMIDITY.into()],
                rows: vec![[0.9, 0.1], [0.6, 0.4]],
            },
            // Rows: (stress, disease) in (0,0), (0,1), (1,0), (1,1) order.
            CptSpec {
                variable: vars::YELLOWING.into(),
                parents: vec![vars::WATER_STRESS.into(), vars::DISEASE.into()],
                rows: vec![[0.95, 0.05], [0.3, 0.7], [0.2, 0.8], [0.05, 0.95]],
            },
            CptSpec {
                variable: vars::LEAF_SPOTS.into(),
                parents: vec![vars::DISEASE.into()],
                rows: vec![[0.95, 0.05], [0.2, 0.8]],
            },
        ],
    }
}

/// The built-in farm map: base station, plots and warehouse, with
/// straight-line heuristic estimates toward the critical plot.
pub fn farm_map() -> MapSpec {
    let edge = |from: &str, to: &str, cost: f64| MapEdgeSpec {
        from: from.into(),
        to: to.into(),
        cost,
    };
    MapSpec {
        locations: vec![
            "base_station".into(),
            "plot_a".into(),
            "plot_b".into(),
            "plot_c".into(),
            "plot_d".into(),
            "warehouse".into(),
            "critical_plot".into(),
        ],
        edges: vec![
            edge("base_station", "plot_a", 10.0),
            edge("base_station", "plot_b", 15.0),
            edge("plot_a", "plot_c", 12.0),
            edge("plot_a", "plot_d", 25.0),
            edge("plot_b", "plot_d", 10.0),
            edge("plot_b", "warehouse", 20.0),
            edge("plot_c", "critical_plot", 5.0),
            edge("plot_d", "critical_plot", 15.0),
            edge("warehouse", "critical_plot", 30.0),
        ],
        heuristic: BTreeMap::from([
            ("base_station".into(), 30.0),
            ("plot_a".into(), 20.0),
            ("plot_b".into(), 25.0),
            ("plot_c".into(), 5.0),
            ("plot_d".into(), 12.0),
            ("warehouse".into(), 28.0),
            ("critical_plot".into(), 0.0),
        ]),
        start: "base_station".into(),
        goal: "critical_plot".into(),
    }
}
