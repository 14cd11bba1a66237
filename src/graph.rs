//! Weighted distance graph.
//!
//! Adjacency is a hash map of hash maps (outer keyed by vertex, inner keyed by
//! neighbour) so weight lookup is average O(1). Undirected edges are stored in
//! both directions. Self-loops are never stored; the distance from a vertex
//! to itself is zero.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::error::GraphError;
use crate::location::Location;
use crate::ruler::Ruler;
use crate::traits::{DistanceLookup, Id};

#[derive(Debug, Clone)]
pub struct DistanceGraph<V: Id> {
    edges: HashMap<V, HashMap<V, f64>>,
}

impl<V: Id> Default for DistanceGraph<V> {
    fn default() -> Self {
        Self {
            edges: HashMap::new(),
        }
    }
}

impl<V: Id> DistanceGraph<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vertex(&mut self, vertex: V) {
        self.edges.entry(vertex).or_default();
    }

    /// Add an undirected edge, mirroring it so `weight(a, b) == weight(b, a)`.
    pub fn add_edge(&mut self, a: V, b: V, weight: f64) -> Result<(), GraphError> {
        Self::check_weight(weight)?;
        self.insert_one_way(a.clone(), b.clone(), weight);
        self.insert_one_way(b, a, weight);
        Ok(())
    }

    /// Add a one-way edge.
    pub fn add_directed_edge(&mut self, from: V, to: V, weight: f64) -> Result<(), GraphError> {
        Self::check_weight(weight)?;
        self.insert_one_way(from, to, weight);
        Ok(())
    }

    fn check_weight(weight: f64) -> Result<(), GraphError> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(GraphError::InvalidWeight(weight));
        }
        Ok(())
    }

    fn insert_one_way(&mut self, from: V, to: V, weight: f64) {
        self.add_vertex(to.clone());
        if from == to {
            self.add_vertex(from);
            return;
        }
        self.edges.entry(from).or_default().insert(to, weight);
    }

    /// Remove a vertex and every edge touching it.
    pub fn remove_vertex(&mut self, vertex: &V) {
        if self.edges.remove(vertex).is_some() {
            for neighbours in self.edges.values_mut() {
                neighbours.remove(vertex);
            }
        }
    }

    /// Remove the edge in both directions.
    pub fn remove_edge(&mut self, a: &V, b: &V) {
        if let Some(neighbours) = self.edges.get_mut(a) {
            neighbours.remove(b);
        }
        if let Some(neighbours) = self.edges.get_mut(b) {
            neighbours.remove(a);
        }
    }

    /// Edge weight, `Some(0.0)` for a known vertex to itself.
    pub fn weight(&self, a: &V, b: &V) -> Option<f64> {
        if a == b {
            return self.edges.contains_key(a).then_some(0.0);
        }
        self.edges.get(a)?.get(b).copied()
    }

    pub fn contains_vertex(&self, vertex: &V) -> bool {
        self.edges.contains_key(vertex)
    }

    pub fn neighbors(&self, vertex: &V) -> impl Iterator<Item = (&V, f64)> {
        self.edges
            .get(vertex)
            .into_iter()
            .flat_map(|neighbours| neighbours.iter().map(|(v, w)| (v, *w)))
    }

    pub fn degree(&self, vertex: &V) -> usize {
        self.edges.get(vertex).map_or(0, HashMap::len)
    }

    pub fn vertex_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of undirected edges (stored pairs halved).
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(HashMap::len).sum::<usize>() / 2
    }
}

impl DistanceGraph<Location> {
    /// Complete graph over `locations`, measuring every pair once with `ruler`.
    pub fn from_locations(locations: &[Location], ruler: &Ruler) -> Self {
        let weights: Vec<(usize, usize, f64)> = (0..locations.len())
            .into_par_iter()
            .flat_map_iter(|i| {
                ((i + 1)..locations.len()).map(move |j| {
                    let d = ruler.distance(locations[i].coordinate(), locations[j].coordinate());
                    (i, j, d)
                })
            })
            .collect();

        let mut graph = Self::new();
        for location in locations {
            graph.add_vertex(location.clone());
        }
        for (i, j, d) in weights {
            // ruler output is finite and non-negative
            let weight = if d.is_finite() && d >= 0.0 { d } else { 0.0 };
            graph.insert_one_way(locations[i].clone(), locations[j].clone(), weight);
            graph.insert_one_way(locations[j].clone(), locations[i].clone(), weight);
        }

        tracing::debug!(
            vertices = graph.vertex_count(),
            edges = graph.edge_count(),
            "built distance graph"
        );
        graph
    }
}

impl<V: Id> DistanceLookup<V> for DistanceGraph<V> {
    fn distance(&self, from: &V, to: &V) -> f64 {
        self.weight(from, to).unwrap_or(f64::INFINITY)
    }
}
