//! Route ordering heuristics.
//!
//! The default planner is convex-hull insertion: wrap the stops in their
//! convex hull (Jarvis march), then repeatedly insert the interior point whose
//! cheapest insertion has the lowest new-cost / prior-edge-cost ratio. It is a
//! deterministic O(n²) approximation of the travelling-salesperson tour, not
//! an optimum. Nearest neighbour is available as a cheaper alternative.

use serde::{Deserialize, Serialize};

use crate::location::{Coordinate, Location};
use crate::tour::Tour;
use crate::traits::{DistanceLookup, TourPlanner};

/// Turn direction of an ordered triplet, on (longitude, latitude) axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Collinear,
    Clockwise,
    CounterClockwise,
}

pub fn orientation(p: Coordinate, q: Coordinate, r: Coordinate) -> Orientation {
    let cross = (q.lat - p.lat) * (r.long - q.long) - (q.long - p.long) * (r.lat - q.lat);
    if cross > 0.0 {
        Orientation::Clockwise
    } else if cross < 0.0 {
        Orientation::CounterClockwise
    } else {
        Orientation::Collinear
    }
}

fn squared_gap(a: Coordinate, b: Coordinate) -> f64 {
    (a.lat - b.lat).powi(2) + (a.long - b.long).powi(2)
}

/// Convex hull of `points` in counter-clockwise order (gift wrapping).
///
/// The march starts from the westernmost point (southernmost on ties, then
/// first seen). Collinear candidates resolve to the farthest one, so only
/// extreme points are returned. Fewer than three points are returned as is.
pub fn convex_hull(points: &[Location]) -> Vec<Location> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }
    let coords: Vec<Coordinate> = points.iter().map(Location::coordinate).collect();

    let start = (1..n).fold(0, |best, i| {
        let (c, b) = (coords[i], coords[best]);
        if c.long < b.long || (c.long == b.long && c.lat < b.lat) {
            i
        } else {
            best
        }
    });

    let mut hull = Vec::new();
    let mut p = start;
    loop {
        if hull.contains(&points[p]) {
            break;
        }
        hull.push(points[p].clone());

        let mut q = (p + 1) % n;
        for i in 0..n {
            if i == p {
                continue;
            }
            match orientation(coords[p], coords[i], coords[q]) {
                Orientation::CounterClockwise => q = i,
                Orientation::Collinear
                    if squared_gap(coords[p], coords[i]) > squared_gap(coords[p], coords[q]) =>
                {
                    q = i
                }
                _ => {}
            }
        }

        p = q;
        if p == start || hull.len() >= n {
            break;
        }
    }

    hull
}

/// Depot first, then distinct stops in first-seen order.
fn distinct_points(depot: &Location, stops: &[Location]) -> Vec<Location> {
    let mut points = vec![depot.clone()];
    for stop in stops {
        if !points.contains(stop) {
            points.push(stop.clone());
        }
    }
    points
}

/// Ratio used to rank insertions; guarded against zero-length prior edges.
fn insertion_ratio(new_cost: f64, prior_cost: f64) -> f64 {
    if prior_cost > 0.0 {
        new_cost / prior_cost
    } else if new_cost > 0.0 {
        f64::INFINITY
    } else {
        1.0
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConvexHullInsertion;

impl TourPlanner for ConvexHullInsertion {
    fn plan(
        &self,
        depot: &Location,
        stops: &[Location],
        distances: &dyn DistanceLookup<Location>,
    ) -> Tour {
        let points = distinct_points(depot, stops);
        if points.len() <= 3 {
            return Tour::through(depot, points.into_iter().skip(1));
        }

        let mut tour = convex_hull(&points);
        let mut remaining: Vec<Location> = points.into_iter().filter(|p| !tour.contains(p)).collect();
        let d = |a: &Location, b: &Location| distances.distance(a, b);

        while !remaining.is_empty() {
            // (ratio, index into remaining, insert position)
            let mut best: Option<(f64, usize, usize)> = None;

            for (i, point) in remaining.iter().enumerate() {
                let mut cheapest: Option<(f64, usize)> = None;
                for j in 0..tour.len() {
                    let (u, v) = (&tour[j], &tour[(j + 1) % tour.len()]);
                    let cost = d(u, point) + d(point, v) - d(u, v);
                    if cheapest.is_none_or(|(c, _)| cost < c) {
                        cheapest = Some((cost, j));
                    }
                }
                let Some((_, j)) = cheapest else {
                    continue;
                };

                let (u, v) = (&tour[j], &tour[(j + 1) % tour.len()]);
                let ratio = insertion_ratio(d(u, point) + d(point, v), d(u, v));
                if best.is_none_or(|(r, _, _)| ratio < r) {
                    best = Some((ratio, i, j + 1));
                }
            }

            let Some((_, i, at)) = best else {
                break;
            };
            let point = remaining.remove(i);
            tour.insert(at, point);
        }

        if let Some(offset) = tour.iter().position(|p| p == depot) {
            tour.rotate_left(offset);
        }
        tour.push(depot.clone());
        Tour::new(tour)
    }
}

/// Greedy tour: always drive to the closest unvisited stop.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestNeighbor;

impl TourPlanner for NearestNeighbor {
    fn plan(
        &self,
        depot: &Location,
        stops: &[Location],
        distances: &dyn DistanceLookup<Location>,
    ) -> Tour {
        let mut remaining = distinct_points(depot, stops).split_off(1);
        let mut order = Vec::with_capacity(remaining.len());
        let mut current = depot.clone();

        while !remaining.is_empty() {
            let mut nearest = 0;
            for i in 1..remaining.len() {
                if distances.distance(&current, &remaining[i])
                    < distances.distance(&current, &remaining[nearest])
                {
                    nearest = i;
                }
            }
            current = remaining.remove(nearest);
            order.push(current.clone());
        }

        Tour::through(depot, order)
    }
}

/// Selectable tour heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TourMethod {
    #[default]
    ConvexHull,
    NearestNeighbor,
}

impl TourMethod {
    pub fn planner(self) -> Box<dyn TourPlanner> {
        match self {
            TourMethod::ConvexHull => Box::new(ConvexHullInsertion),
            TourMethod::NearestNeighbor => Box::new(NearestNeighbor),
        }
    }
}
