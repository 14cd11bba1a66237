//! The dispatch engine ("hub").
//!
//! Planning runs in passes until every assignable package is delivered:
//!
//! 1. Collect the packages still at the depot.
//! 2. Load each truck in id order from a deadline-ordered queue. A package
//!    in a dependency chain only loads together with its whole chain.
//! 3. Trucks left empty while work remains wait one idle step.
//! 4. Plan every loaded truck's tour (in parallel), then walk the tours leg
//!    by leg, stamping deliveries and recording the trip.
//!
//! Packages whose constraints can never be met are detected up front and
//! reported as [`UnassignedPackage`] instead of being looped on forever.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap, HashSet};

use chrono::{NaiveDateTime, NaiveTime, TimeDelta};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classify::classify;
use crate::config::DispatchConfig;
use crate::dependency::{DependencyChain, resolve_chains};
use crate::error::DispatchError;
use crate::graph::DistanceGraph;
use crate::ledger::{Leg, MileageLedger, TripLedger, TripRecord};
use crate::location::Location;
use crate::package::{Package, PackageId, PackageStatus};
use crate::plan::DispatchPlan;
use crate::time::travel_time;
use crate::tour::Tour;
use crate::traits::TourPlanner;
use crate::truck::{Truck, VehicleId};

// ============================================================================
// Reporting types
// ============================================================================

/// Why a package was left out of planning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnassignedReason {
    /// Required vehicle id is not part of the fleet.
    UnknownVehicle(VehicleId),
    /// Declares a dependency on a package that was never supplied.
    UnknownDependency(PackageId),
    /// The chain does not fit on any vehicle allowed to carry it.
    ChainExceedsCapacity { chain_len: usize, capacity: usize },
    /// Chain members require different vehicles.
    ConflictingVehicles,
    /// Flagged invalid-address with no correction configured.
    NoAddressCorrection,
    /// Another member of the same chain cannot be delivered.
    BlockedByChainMember(PackageId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnassignedPackage {
    pub package_id: PackageId,
    pub reason: UnassignedReason,
}

/// An address correction applied when the package was loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedCorrection {
    pub package_id: PackageId,
    pub previous: Location,
    pub corrected: Location,
    pub effective_at: NaiveDateTime,
}

/// Why a loadability check failed. Only logged.
#[derive(Debug, Error)]
enum Rejection {
    #[error("restricted to vehicle {required}")]
    WrongVehicle { required: VehicleId },
    #[error("not at the depot until {arrival}")]
    NotArrived { arrival: NaiveTime },
    #[error("address correction not known until {effective_at}")]
    AwaitingCorrection { effective_at: NaiveTime },
    #[error("address invalid and no correction configured")]
    NoCorrection,
    #[error("needs {needed} slots, {room} free")]
    NoRoom { needed: usize, room: usize },
}

// ============================================================================
// Engine
// ============================================================================

pub struct DispatchEngine {
    config: DispatchConfig,
    locations: Vec<Location>,
    graph: DistanceGraph<Location>,
    packages: BTreeMap<PackageId, Package>,
    trucks: Vec<Truck>,
    /// Next departure per truck, indexed like `trucks`.
    clocks: Vec<NaiveDateTime>,
    chains: Vec<DependencyChain>,
    chain_of: HashMap<PackageId, usize>,
    unassigned: Vec<UnassignedPackage>,
    excluded: HashSet<PackageId>,
    /// Latest arrival or correction time; past it nothing else gets released.
    release_horizon: NaiveDateTime,
    planner: Box<dyn TourPlanner>,
    trips: TripLedger,
    mileage: MileageLedger,
    corrections: Vec<AppliedCorrection>,
}

impl DispatchEngine {
    /// Validate the inputs, build the distance graph and resolve chains.
    ///
    /// `locations[0]` is the depot.
    pub fn new(
        locations: Vec<Location>,
        packages: impl IntoIterator<Item = Package>,
        config: DispatchConfig,
    ) -> Result<Self, DispatchError> {
        config.validate()?;
        if locations.is_empty() {
            return Err(DispatchError::NoLocations);
        }

        let known: HashSet<&Location> = locations.iter().collect();
        let mut by_id = BTreeMap::new();
        for package in packages {
            if !known.contains(package.destination()) {
                return Err(DispatchError::UnknownDestination {
                    package_id: package.id(),
                    address: package.destination().to_string(),
                });
            }
            let id = package.id();
            if by_id.insert(id, package).is_some() {
                return Err(DispatchError::DuplicatePackage(id));
            }
        }
        if by_id.is_empty() {
            return Err(DispatchError::NoPackages);
        }

        for correction in &config.corrections {
            if !known.contains(&correction.destination) {
                return Err(DispatchError::UnknownCorrectionTarget {
                    package_id: correction.package_id,
                    address: correction.destination.to_string(),
                });
            }
            match by_id.get(&correction.package_id) {
                None => tracing::warn!(
                    package_id = correction.package_id,
                    "address correction targets an unknown package; ignoring"
                ),
                Some(p) if !p.has_invalid_address() => tracing::warn!(
                    package_id = correction.package_id,
                    "address correction targets a package not flagged invalid; ignoring"
                ),
                Some(_) => {}
            }
        }
        let graph = DistanceGraph::from_locations(&locations, &config.ruler);

        let chains = resolve_chains(by_id.values());
        let mut chain_of = HashMap::new();
        for (index, chain) in chains.iter().enumerate() {
            for id in chain.members() {
                chain_of.insert(*id, index);
                if let Some(package) = by_id.get_mut(id) {
                    package.set_in_dependency_chain(true);
                }
            }
        }

        let trucks: Vec<Truck> = (1..)
            .zip(&config.vehicles)
            .map(|(id, spec)| Truck::new(id, spec.capacity, spec.speed))
            .collect();
        let start = config.at(config.day_start);
        let clocks = vec![start; trucks.len()];

        let mut engine = Self {
            planner: config.tour_method.planner(),
            release_horizon: start,
            config,
            locations,
            graph,
            packages: by_id,
            trucks,
            clocks,
            chains,
            chain_of,
            unassigned: Vec::new(),
            excluded: HashSet::new(),
            trips: TripLedger::new(),
            mileage: MileageLedger::new(),
            corrections: Vec::new(),
        };
        engine.exclude_unsatisfiable();
        engine.release_horizon = engine.compute_release_horizon(start);
        Ok(engine)
    }

    pub fn depot(&self) -> &Location {
        &self.locations[0]
    }

    pub fn graph(&self) -> &DistanceGraph<Location> {
        &self.graph
    }

    pub fn trucks(&self) -> &[Truck] {
        &self.trucks
    }

    pub fn chains(&self) -> &[DependencyChain] {
        &self.chains
    }

    /// Packages that will not be planned, known before the first pass.
    pub fn unassigned(&self) -> &[UnassignedPackage] {
        &self.unassigned
    }

    /// Run planning to completion.
    pub fn run(mut self) -> Result<DispatchPlan, DispatchError> {
        tracing::info!(
            packages = self.packages.len(),
            vehicles = self.trucks.len(),
            chains = self.chains.len(),
            unassigned = self.unassigned.len(),
            "planning started"
        );

        let idle_step =
            TimeDelta::try_seconds(self.config.idle_step_secs).ok_or(DispatchError::InvalidIdleStep {
                seconds: self.config.idle_step_secs,
            })?;
        let mut pass = 0usize;

        loop {
            let pending = self.pending();
            if pending.is_empty() {
                break;
            }
            pass += 1;

            let views = classify(pending.iter().map(|id| &self.packages[id]), self.config.end_of_day);
            tracing::debug!(
                pass,
                pending = pending.len(),
                priority = views.priority.len(),
                delayed = views.delayed.len(),
                dependent = views.dependent.len(),
                invalid_address = views.invalid_address.len(),
                standard = views.standard.len(),
                "loading pass"
            );

            let mut loaded_any = false;
            for index in 0..self.trucks.len() {
                loaded_any |= self.load_truck(index)?;
            }

            // Static exclusion leaves every pending package loadable once the
            // horizon has passed, so this only fires on broken engine state.
            if !loaded_any && self.stalled() {
                let at = self.clocks.iter().min().copied().unwrap_or(self.release_horizon);
                return Err(DispatchError::Deadlock { at, pending });
            }

            if !self.pending().is_empty() {
                for (truck, clock) in self.trucks.iter().zip(self.clocks.iter_mut()) {
                    if truck.is_empty() {
                        *clock = clock.checked_add_signed(idle_step).ok_or(DispatchError::ClockOverflow {
                            vehicle: truck.id(),
                            at: *clock,
                        })?;
                    }
                }
            }

            self.deliver_loaded()?;
        }

        tracing::info!(
            passes = pass,
            trips = self.trips.len(),
            mileage = self.mileage.total(),
            "planning finished"
        );

        let views = classify(self.packages.values(), self.config.end_of_day);
        Ok(DispatchPlan {
            config: self.config,
            locations: self.locations,
            graph: self.graph,
            packages: self.packages,
            trips: self.trips,
            mileage: self.mileage,
            chains: self.chains,
            views,
            unassigned: self.unassigned,
            corrections: self.corrections,
        })
    }

    /// Every vehicle clock is at or past the last release.
    fn stalled(&self) -> bool {
        self.clocks.iter().all(|c| *c >= self.release_horizon)
    }

    /// Packages still at the depot, excluding unassignable ones.
    fn pending(&self) -> Vec<PackageId> {
        self.packages
            .values()
            .filter(|p| p.status() == PackageStatus::AtDepot && !self.excluded.contains(&p.id()))
            .map(Package::id)
            .collect()
    }

    // ------------------------------------------------------------------------
    // Static checks
    // ------------------------------------------------------------------------

    fn exclude_unsatisfiable(&mut self) {
        let fleet = self.trucks.len();
        let mut reasons: BTreeMap<PackageId, UnassignedReason> = BTreeMap::new();

        for package in self.packages.values() {
            let reason = if let Some(vehicle) = package
                .required_vehicle()
                .filter(|v| *v == 0 || *v as usize > fleet)
            {
                Some(UnassignedReason::UnknownVehicle(vehicle))
            } else if let Some(dep) = package
                .directives()
                .dependencies
                .iter()
                .find(|dep| !self.packages.contains_key(*dep))
            {
                Some(UnassignedReason::UnknownDependency(*dep))
            } else if package.has_invalid_address() && self.config.correction_for(package.id()).is_none() {
                Some(UnassignedReason::NoAddressCorrection)
            } else {
                None
            };
            if let Some(reason) = reason {
                reasons.insert(package.id(), reason);
            }
        }

        for chain in &self.chains {
            let members: Vec<&Package> = chain
                .members()
                .iter()
                .filter_map(|id| self.packages.get(id))
                .collect();

            let chain_reason = self.chain_problem(&members);
            let blocker = members.iter().map(|p| p.id()).find(|id| reasons.contains_key(id));

            for member in &members {
                if reasons.contains_key(&member.id()) {
                    continue;
                }
                if let Some(blocker) = blocker {
                    reasons.insert(member.id(), UnassignedReason::BlockedByChainMember(blocker));
                } else if let Some(reason) = &chain_reason {
                    reasons.insert(member.id(), reason.clone());
                }
            }
        }

        for (package_id, reason) in reasons {
            tracing::warn!(package_id, ?reason, "package cannot be planned; excluding");
            self.excluded.insert(package_id);
            self.unassigned.push(UnassignedPackage { package_id, reason });
        }
    }

    fn chain_problem(&self, members: &[&Package]) -> Option<UnassignedReason> {
        let required: BTreeSet<VehicleId> = members.iter().filter_map(|p| p.required_vehicle()).collect();
        if required.len() > 1 {
            return Some(UnassignedReason::ConflictingVehicles);
        }

        let capacity = match required.first() {
            Some(vehicle) => self
                .trucks
                .iter()
                .find(|t| t.id() == *vehicle)
                .map_or(0, Truck::capacity),
            None => self.trucks.iter().map(Truck::capacity).max().unwrap_or(0),
        };
        if members.len() > capacity {
            return Some(UnassignedReason::ChainExceedsCapacity {
                chain_len: members.len(),
                capacity,
            });
        }
        None
    }

    fn compute_release_horizon(&self, start: NaiveDateTime) -> NaiveDateTime {
        let arrivals = self
            .packages
            .values()
            .filter(|p| !self.excluded.contains(&p.id()))
            .filter_map(Package::has_delay);
        let corrections = self.config.corrections.iter().map(|c| c.effective_at);

        arrivals
            .chain(corrections)
            .map(|time| self.config.at(time))
            .fold(start, NaiveDateTime::max)
    }

    // ------------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------------

    /// Fill one truck from the deadline queue. Returns whether anything loaded.
    fn load_truck(&mut self, index: usize) -> Result<bool, DispatchError> {
        let mut queue: BinaryHeap<Reverse<(NaiveTime, PackageId)>> = self
            .pending()
            .into_iter()
            .map(|id| Reverse((self.packages[&id].deadline(), id)))
            .collect();
        let mut loaded = false;

        while !self.trucks[index].is_full() {
            let Some(Reverse((_, id))) = queue.pop() else {
                break;
            };
            if self.packages[&id].status() != PackageStatus::AtDepot {
                // already boarded with its chain
                continue;
            }

            let chain = self.chain_of.get(&id).copied();
            let group: Vec<PackageId> = match chain {
                Some(c) => self.chains[c]
                    .members()
                    .iter()
                    .copied()
                    .filter(|m| self.packages.contains_key(m))
                    .collect(),
                None => vec![id],
            };

            if let Err(rejection) = self.check_group(index, &group) {
                tracing::trace!(
                    vehicle = self.trucks[index].id(),
                    package_id = id,
                    %rejection,
                    "package not loadable"
                );
                continue;
            }

            for member in group {
                self.load_package(index, member)?;
            }
            loaded = true;
        }

        Ok(loaded)
    }

    fn check_group(&self, index: usize, group: &[PackageId]) -> Result<(), Rejection> {
        let truck = &self.trucks[index];
        let clock = self.clocks[index];

        for id in group {
            let package = &self.packages[id];
            if let Some(required) = package.required_vehicle().filter(|v| *v != truck.id()) {
                return Err(Rejection::WrongVehicle { required });
            }
            if let Some(arrival) = package.has_delay().filter(|a| self.config.at(*a) > clock) {
                return Err(Rejection::NotArrived { arrival });
            }
            if package.has_invalid_address() {
                match self.config.correction_for(*id) {
                    Some(c) if self.config.at(c.effective_at) > clock => {
                        return Err(Rejection::AwaitingCorrection {
                            effective_at: c.effective_at,
                        });
                    }
                    Some(_) => {}
                    None => return Err(Rejection::NoCorrection),
                }
            }
        }

        let room = truck.remaining_capacity();
        if group.len() > room {
            return Err(Rejection::NoRoom {
                needed: group.len(),
                room,
            });
        }
        Ok(())
    }

    fn load_package(&mut self, index: usize, id: PackageId) -> Result<(), DispatchError> {
        let truck = &mut self.trucks[index];
        let Some(package) = self.packages.get_mut(&id) else {
            return Ok(());
        };

        let correction = self
            .config
            .correction_for(id)
            .filter(|_| package.has_invalid_address());
        if let Some(correction) = correction {
            self.corrections.push(AppliedCorrection {
                package_id: id,
                previous: package.destination().clone(),
                corrected: correction.destination.clone(),
                effective_at: self.config.at(correction.effective_at),
            });
            package.redirect(correction.destination.clone());
        }

        package.mark_en_route(truck.id())?;
        truck.load(id)?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Delivery
    // ------------------------------------------------------------------------

    fn deliver_loaded(&mut self) -> Result<(), DispatchError> {
        let mut jobs: Vec<(usize, Vec<Location>)> = Vec::new();
        for (index, truck) in self.trucks.iter_mut().enumerate() {
            if truck.is_empty() {
                continue;
            }
            truck.begin_routing();
            let stops = truck
                .manifest()
                .iter()
                .map(|id| self.packages[id].destination().clone())
                .collect();
            jobs.push((index, stops));
        }
        if jobs.is_empty() {
            return Ok(());
        }

        let depot = &self.locations[0];
        let planner = self.planner.as_ref();
        let graph = &self.graph;
        let tours: Vec<(usize, Tour)> = jobs
            .into_par_iter()
            .map(|(index, stops)| (index, planner.plan(depot, &stops, graph)))
            .collect();

        for (index, tour) in tours {
            self.walk_tour(index, tour)?;
        }
        Ok(())
    }

    fn walk_tour(&mut self, index: usize, tour: Tour) -> Result<(), DispatchError> {
        let truck = &mut self.trucks[index];
        truck.begin_delivery();
        let vehicle = truck.id();
        let speed = truck.speed();
        let manifest = truck.manifest().to_vec();

        let departed_at = self.clocks[index];
        let mut clock = departed_at;
        let mut distance = 0.0;
        let mut legs = Vec::with_capacity(tour.stops().len().saturating_sub(1));
        let mut delivery_order = Vec::with_capacity(manifest.len());

        for (from, to) in tour.legs() {
            let leg_distance = self.graph.weight(from, to).ok_or_else(|| DispatchError::MissingEdge {
                from: from.to_string(),
                to: to.to_string(),
            })?;
            clock = travel_time(leg_distance, speed)
                .and_then(|t| clock.checked_add_signed(t))
                .ok_or(DispatchError::ClockOverflow { vehicle, at: clock })?;
            distance += leg_distance;

            for id in &manifest {
                let Some(package) = self.packages.get_mut(id) else {
                    continue;
                };
                if package.status() == PackageStatus::EnRoute && package.destination() == to {
                    package.mark_delivered(clock)?;
                    delivery_order.push(*id);
                }
            }

            legs.push(Leg {
                from: from.clone(),
                to: to.clone(),
                distance: leg_distance,
                arrive_at: clock,
            });
        }

        let missing: Vec<PackageId> = manifest
            .iter()
            .copied()
            .filter(|id| self.packages[id].status() != PackageStatus::Delivered)
            .collect();
        if !missing.is_empty() {
            return Err(DispatchError::IncompleteTour { vehicle, missing });
        }

        let trip_index = self.mileage.record(vehicle, distance);
        tracing::debug!(
            vehicle,
            trip = trip_index,
            departed = %departed_at,
            returned = %clock,
            distance,
            packages = manifest.len(),
            "trip completed"
        );

        self.trips.append(TripRecord {
            vehicle,
            trip_index,
            departed_at,
            returned_at: clock,
            manifest,
            delivery_order,
            tour,
            legs,
            distance,
        });
        self.clocks[index] = clock;
        self.trucks[index].reset();
        Ok(())
    }
}

/// Plan the delivery of `packages` from `locations[0]` with `config`.
pub fn plan(
    locations: Vec<Location>,
    packages: impl IntoIterator<Item = Package>,
    config: DispatchConfig,
) -> Result<DispatchPlan, DispatchError> {
    DispatchEngine::new(locations, packages, config)?.run()
}
