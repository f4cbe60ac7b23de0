//! Drone route planning over the farm map.
//!
//! - **map**: Immutable location graph with heuristic table
//! - **search**: A* minimum-cost route search

pub mod map;
pub mod search;

pub use map::{FieldMap, LocId};
pub use search::{a_star, Route};
