//! Point-in-time reconstruction of package state.
//!
//! A snapshot is derived from the finished trip ledger and the delivery
//! timestamps alone; nothing is re-simulated and no package is mutated.

use std::collections::BTreeMap;

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::dispatch::AppliedCorrection;
use crate::ledger::TripLedger;
use crate::location::Location;
use crate::package::{Package, PackageId, PackageStatus};
use crate::truck::VehicleId;

/// Read-only copy of a package as it stood at the snapshot time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageView {
    pub id: PackageId,
    pub destination: Location,
    pub weight: f64,
    pub deadline: NaiveTime,
    pub status: PackageStatus,
    pub delivered_at: Option<NaiveDateTime>,
    pub vehicle: Option<VehicleId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub at: NaiveDateTime,
    /// Most recent delivery first.
    pub delivered: Vec<PackageView>,
    /// Per vehicle, in delivery order.
    pub en_route: BTreeMap<VehicleId, Vec<PackageView>>,
    /// By package id.
    pub at_depot: Vec<PackageView>,
}

impl Snapshot {
    /// Rebuild the state of every package at `at`.
    pub fn capture<'a>(
        packages: impl IntoIterator<Item = &'a Package>,
        trips: &TripLedger,
        corrections: &[AppliedCorrection],
        at: NaiveDateTime,
    ) -> Self {
        let packages: Vec<&Package> = packages.into_iter().collect();

        let mut vehicles: Vec<VehicleId> = trips.trips().iter().map(|t| t.vehicle).collect();
        vehicles.sort_unstable();
        vehicles.dedup();
        let active: Vec<_> = vehicles
            .into_iter()
            .filter_map(|v| trips.latest_departed_by(v, at))
            .collect();

        let mut snapshot = Snapshot {
            at,
            delivered: Vec::new(),
            en_route: BTreeMap::new(),
            at_depot: Vec::new(),
        };

        for package in packages {
            let destination = corrections
                .iter()
                .find(|c| c.package_id == package.id() && at < c.effective_at)
                .map_or_else(|| package.destination().clone(), |c| c.previous.clone());
            let mut view = PackageView {
                id: package.id(),
                destination,
                weight: package.weight(),
                deadline: package.deadline(),
                status: PackageStatus::AtDepot,
                delivered_at: None,
                vehicle: None,
            };

            if let Some(delivered_at) = package.delivered_at().filter(|d| *d <= at) {
                view.status = PackageStatus::Delivered;
                view.delivered_at = Some(delivered_at);
                view.vehicle = package.vehicle();
                snapshot.delivered.push(view);
            } else if let Some(trip) = active.iter().find(|t| t.carries(package.id())) {
                view.status = PackageStatus::EnRoute;
                view.vehicle = Some(trip.vehicle);
                snapshot.en_route.entry(trip.vehicle).or_default().push(view);
            } else {
                snapshot.at_depot.push(view);
            }
        }

        let delivery_rank = |id: PackageId| {
            trips
                .trip_carrying(id)
                .and_then(|t| t.delivery_order.iter().position(|p| *p == id))
        };
        snapshot
            .delivered
            .sort_by(|a, b| b.delivered_at.cmp(&a.delivered_at).then(b.id.cmp(&a.id)));
        for views in snapshot.en_route.values_mut() {
            views.sort_by_key(|v| delivery_rank(v.id));
        }
        snapshot.at_depot.sort_by_key(|v| v.id);

        snapshot
    }

    pub fn len(&self) -> usize {
        self.delivered.len() + self.en_route.values().map(Vec::len).sum::<usize>() + self.at_depot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn en_route_count(&self) -> usize {
        self.en_route.values().map(Vec::len).sum()
    }

    pub fn status_of(&self, id: PackageId) -> Option<PackageStatus> {
        self.view(id).map(|v| v.status)
    }

    pub fn view(&self, id: PackageId) -> Option<&PackageView> {
        self.delivered
            .iter()
            .chain(self.en_route.values().flatten())
            .chain(&self.at_depot)
            .find(|v| v.id == id)
    }
}
