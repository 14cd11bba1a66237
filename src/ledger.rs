//! Append-only records of completed trips and the distance they covered.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::location::Location;
use crate::package::PackageId;
use crate::tour::Tour;
use crate::truck::VehicleId;

/// One driven edge of a tour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    pub from: Location,
    pub to: Location,
    pub distance: f64,
    pub arrive_at: NaiveDateTime,
}

/// A completed load-and-deliver cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRecord {
    pub vehicle: VehicleId,
    /// One-based trip number for this vehicle.
    pub trip_index: usize,
    pub departed_at: NaiveDateTime,
    pub returned_at: NaiveDateTime,
    /// Package ids in load order.
    pub manifest: Vec<PackageId>,
    /// Package ids in the order they were handed over.
    pub delivery_order: Vec<PackageId>,
    pub tour: Tour,
    pub legs: Vec<Leg>,
    /// Total distance driven, return leg included.
    pub distance: f64,
}

impl TripRecord {
    pub fn carries(&self, package_id: PackageId) -> bool {
        self.manifest.contains(&package_id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TripLedger {
    trips: Vec<TripRecord>,
}

impl TripLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&mut self, trip: TripRecord) {
        self.trips.push(trip);
    }

    /// Trips in the order they were recorded.
    pub fn trips(&self) -> &[TripRecord] {
        &self.trips
    }

    pub fn len(&self) -> usize {
        self.trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }

    pub fn for_vehicle(&self, vehicle: VehicleId) -> impl Iterator<Item = &TripRecord> {
        self.trips.iter().filter(move |t| t.vehicle == vehicle)
    }

    /// Latest trip of `vehicle` that had left the depot by `at`.
    pub fn latest_departed_by(&self, vehicle: VehicleId, at: NaiveDateTime) -> Option<&TripRecord> {
        self.for_vehicle(vehicle)
            .filter(|t| t.departed_at <= at)
            .max_by_key(|t| (t.departed_at, t.trip_index))
    }

    pub fn trip_carrying(&self, package_id: PackageId) -> Option<&TripRecord> {
        self.trips.iter().find(|t| t.carries(package_id))
    }
}

/// Distance driven per vehicle, trip by trip.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MileageLedger {
    per_vehicle: BTreeMap<VehicleId, Vec<f64>>,
}

impl MileageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a trip and return its one-based trip number.
    pub(crate) fn record(&mut self, vehicle: VehicleId, distance: f64) -> usize {
        let trips = self.per_vehicle.entry(vehicle).or_default();
        trips.push(distance);
        trips.len()
    }

    pub fn trips(&self, vehicle: VehicleId) -> &[f64] {
        self.per_vehicle.get(&vehicle).map_or(&[], Vec::as_slice)
    }

    /// Distance of trip number `trip` (one-based).
    pub fn trip(&self, vehicle: VehicleId, trip: usize) -> Option<f64> {
        self.trips(vehicle).get(trip.checked_sub(1)?).copied()
    }

    pub fn vehicle_total(&self, vehicle: VehicleId) -> f64 {
        self.trips(vehicle).iter().sum()
    }

    pub fn total(&self) -> f64 {
        self.per_vehicle.values().flatten().sum()
    }
}
