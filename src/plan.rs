//! The finished plan and every query served from it.
//!
//! A [`DispatchPlan`] only exists once planning has run to completion, so
//! queries can never observe a half-written ledger.

use std::collections::BTreeMap;

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::classify::PackageViews;
use crate::config::DispatchConfig;
use crate::dependency::DependencyChain;
use crate::dispatch::{AppliedCorrection, UnassignedPackage};
use crate::error::TimeParseError;
use crate::graph::DistanceGraph;
use crate::ledger::{MileageLedger, TripLedger, TripRecord};
use crate::location::Location;
use crate::package::{Package, PackageId, PackageStatus};
use crate::snapshot::{PackageView, Snapshot};
use crate::time::parse_time_of_day;
use crate::truck::VehicleId;

/// One trip of one vehicle, as a driver would read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePlan {
    pub vehicle: VehicleId,
    pub trip: usize,
    pub departed_at: NaiveDateTime,
    pub returned_at: NaiveDateTime,
    pub mileage: f64,
    /// Package ids in delivery order.
    pub packages: Vec<PackageId>,
}

impl From<&TripRecord> for RoutePlan {
    fn from(trip: &TripRecord) -> Self {
        Self {
            vehicle: trip.vehicle,
            trip: trip.trip_index,
            departed_at: trip.departed_at,
            returned_at: trip.returned_at,
            mileage: trip.distance,
            packages: trip.delivery_order.clone(),
        }
    }
}

pub struct DispatchPlan {
    pub(crate) config: DispatchConfig,
    pub(crate) locations: Vec<Location>,
    pub(crate) graph: DistanceGraph<Location>,
    pub(crate) packages: BTreeMap<PackageId, Package>,
    pub(crate) trips: TripLedger,
    pub(crate) mileage: MileageLedger,
    pub(crate) chains: Vec<DependencyChain>,
    pub(crate) views: PackageViews,
    pub(crate) unassigned: Vec<UnassignedPackage>,
    pub(crate) corrections: Vec<AppliedCorrection>,
}

impl DispatchPlan {
    // ========================================================================
    // Run state
    // ========================================================================

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn depot(&self) -> &Location {
        &self.locations[0]
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn graph(&self) -> &DistanceGraph<Location> {
        &self.graph
    }

    pub fn trips(&self) -> &[TripRecord] {
        self.trips.trips()
    }

    pub fn ledger(&self) -> &TripLedger {
        &self.trips
    }

    pub fn chains(&self) -> &[DependencyChain] {
        &self.chains
    }

    pub fn views(&self) -> &PackageViews {
        &self.views
    }

    pub fn unassigned(&self) -> &[UnassignedPackage] {
        &self.unassigned
    }

    pub fn corrections(&self) -> &[AppliedCorrection] {
        &self.corrections
    }

    // ========================================================================
    // Package lookups
    // ========================================================================

    pub fn package(&self, id: PackageId) -> Option<&Package> {
        self.packages.get(&id)
    }

    /// All packages by ascending id.
    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    /// Case-insensitive substring match on the street address.
    pub fn by_address(&self, fragment: &str) -> Vec<&Package> {
        let needle = fragment.to_lowercase();
        self.filter(|p| p.destination().street().to_lowercase().contains(&needle))
    }

    pub fn by_city(&self, city: &str) -> Vec<&Package> {
        self.filter(|p| p.destination().city().eq_ignore_ascii_case(city.trim()))
    }

    pub fn by_postal_code(&self, postal_code: &str) -> Vec<&Package> {
        self.filter(|p| p.destination().postal_code() == postal_code.trim())
    }

    pub fn by_weight(&self, weight: f64) -> Vec<&Package> {
        self.filter(|p| (p.weight() - weight).abs() < 1e-9)
    }

    pub fn by_deadline(&self, deadline: NaiveTime) -> Vec<&Package> {
        self.filter(|p| p.deadline() == deadline)
    }

    /// Packages that were in `status` at `at`.
    pub fn with_status_at(&self, status: PackageStatus, at: NaiveDateTime) -> Vec<PackageView> {
        let snapshot = self.snapshot(at);
        match status {
            PackageStatus::Delivered => snapshot.delivered,
            PackageStatus::EnRoute => snapshot.en_route.into_values().flatten().collect(),
            PackageStatus::AtDepot => snapshot.at_depot,
        }
    }

    /// Delivered after their deadline.
    pub fn late_deliveries(&self) -> Vec<&Package> {
        self.filter(|p| p.delivered_at().is_some_and(|d| d > self.config.at(p.deadline())))
    }

    pub fn last_delivery(&self) -> Option<NaiveDateTime> {
        self.packages.values().filter_map(Package::delivered_at).max()
    }

    fn filter(&self, keep: impl Fn(&Package) -> bool) -> Vec<&Package> {
        self.packages.values().filter(|p| keep(p)).collect()
    }

    // ========================================================================
    // Mileage and route plans
    // ========================================================================

    pub fn total_mileage(&self) -> f64 {
        self.mileage.total()
    }

    pub fn vehicle_mileage(&self, vehicle: VehicleId) -> f64 {
        self.mileage.vehicle_total(vehicle)
    }

    /// Distance of one trip; `trip` is one-based.
    pub fn trip_distance(&self, vehicle: VehicleId, trip: usize) -> Option<f64> {
        self.mileage.trip(vehicle, trip)
    }

    pub fn route_plans(&self, vehicle: VehicleId) -> Vec<RoutePlan> {
        self.trips.for_vehicle(vehicle).map(RoutePlan::from).collect()
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    pub fn snapshot(&self, at: NaiveDateTime) -> Snapshot {
        Snapshot::capture(self.packages.values(), &self.trips, &self.corrections, at)
    }

    /// Snapshot at a time of day on the service date.
    pub fn snapshot_at(&self, time: NaiveTime) -> Snapshot {
        self.snapshot(self.config.at(time))
    }

    /// Snapshot at a clock reading such as `10:30 AM` or `13:15`.
    pub fn snapshot_at_str(&self, time: &str) -> Result<Snapshot, TimeParseError> {
        Ok(self.snapshot_at(parse_time_of_day(time)?))
    }
}
