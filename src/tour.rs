//! Closed visiting sequences.

use serde::{Deserialize, Serialize};

use crate::location::Location;
use crate::traits::DistanceLookup;

/// An ordered sequence of stops that starts and ends at the depot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tour {
    stops: Vec<Location>,
}

impl Tour {
    /// Wraps an already-ordered sequence; the first and last entries are the depot.
    pub fn new(stops: Vec<Location>) -> Self {
        Self { stops }
    }

    /// Depot, then `stops` in the given order, then the depot again.
    pub fn through(depot: &Location, stops: impl IntoIterator<Item = Location>) -> Self {
        let mut sequence = vec![depot.clone()];
        sequence.extend(stops);
        sequence.push(depot.clone());
        Self { stops: sequence }
    }

    pub fn stops(&self) -> &[Location] {
        &self.stops
    }

    pub fn into_stops(self) -> Vec<Location> {
        self.stops
    }

    /// Consecutive (from, to) pairs, including the return to the depot.
    pub fn legs(&self) -> impl Iterator<Item = (&Location, &Location)> {
        self.stops.windows(2).map(|pair| (&pair[0], &pair[1]))
    }

    pub fn is_closed(&self) -> bool {
        self.stops.len() >= 2 && self.stops.first() == self.stops.last()
    }

    /// Stops strictly between the departure and the return.
    pub fn interior(&self) -> &[Location] {
        if self.stops.len() < 2 {
            return &[];
        }
        &self.stops[1..self.stops.len() - 1]
    }

    pub fn total_distance(&self, distances: &dyn DistanceLookup<Location>) -> f64 {
        self.legs().map(|(from, to)| distances.distance(from, to)).sum()
    }
}
