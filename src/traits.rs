//! Core seams shared by the planner components.
//!
//! These stay intentionally small: a distance lookup that the route
//! optimizer can query without knowing how distances were produced, and a
//! tour planner so the dispatch engine can swap routing heuristics.

use std::hash::Hash;

use crate::location::Location;
use crate::tour::Tour;

/// Key type usable as a graph vertex or ledger key.
pub trait Id: Clone + Eq + Hash {}

impl<T> Id for T where T: Clone + Eq + Hash {}

/// Provides the distance between two vertices.
///
/// Implementations must be symmetric and return `0.0` for `from == to`.
/// Pairs the implementation knows nothing about yield `f64::INFINITY`.
pub trait DistanceLookup<V> {
    fn distance(&self, from: &V, to: &V) -> f64;
}

/// Orders a vehicle's stops into a closed tour starting and ending at the depot.
///
/// Planners must be pure: the same inputs always yield the same tour, and
/// every stop appears in the output exactly once.
pub trait TourPlanner: Send + Sync {
    fn plan(
        &self,
        depot: &Location,
        stops: &[Location],
        distances: &dyn DistanceLookup<Location>,
    ) -> Tour;
}
