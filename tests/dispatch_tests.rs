//! Dispatch engine tests
//!
//! Whole-day planning runs checked against the engine's invariants:
//! lifecycle, exclusive loading, vehicle restrictions, chains, delays,
//! address corrections and ledger consistency.

mod fixtures;

use std::collections::{BTreeSet, HashMap, HashSet};

use depot_dispatch::config::AddressCorrection;
use depot_dispatch::traits::DistanceLookup;
use depot_dispatch::{DispatchError, DispatchPlan, Location, PackageStatus, plan};

use fixtures::*;

// ============================================================================
// Test Fixtures
// ============================================================================

/// Index of "410 S State St" in `all_locations()`.
const CORRECTED_SITE: usize = 16;

fn day_packages() -> Vec<TestPackage> {
    vec![
        TestPackage::new(1, 1).deadline(10, 30),
        TestPackage::new(2, 2).weight(44.0),
        TestPackage::new(3, 3).notes("truck=2"),
        TestPackage::new(4, 4),
        TestPackage::new(5, 5),
        TestPackage::new(6, 6).deadline(10, 30).notes("arrival=\"9:05 am\""),
        TestPackage::new(7, 7),
        TestPackage::new(8, 8),
        TestPackage::new(9, 9).notes("ADDRESS_INVALID"),
        TestPackage::new(10, 10),
        TestPackage::new(11, 11),
        TestPackage::new(12, 12),
        TestPackage::new(13, 13).deadline(10, 30).notes("dep=14,15"),
        TestPackage::new(14, 14).deadline(10, 30),
        TestPackage::new(15, 15).deadline(9, 0),
        TestPackage::new(16, 13).deadline(10, 30).notes("dep=13,19"),
        TestPackage::new(17, 17),
        TestPackage::new(18, 18).notes("truck=2"),
        TestPackage::new(19, 19),
        TestPackage::new(20, 20).deadline(10, 30).notes("dep=13,15"),
        TestPackage::new(21, 1),
        TestPackage::new(22, 2),
        TestPackage::new(23, 3),
        TestPackage::new(24, 4),
        TestPackage::new(25, 5).deadline(10, 30).notes("arrival=\"9:05 am\""),
        TestPackage::new(26, 6),
        TestPackage::new(27, 7),
        TestPackage::new(28, 8).notes("arrival=\"9:05 am\""),
        TestPackage::new(29, 10).deadline(10, 30),
        TestPackage::new(30, 11).deadline(10, 30),
        TestPackage::new(31, 12).deadline(10, 30),
        TestPackage::new(32, 14).notes("arrival=\"9:05 am\""),
        TestPackage::new(33, CORRECTED_SITE),
        TestPackage::new(34, 17).deadline(10, 30),
        TestPackage::new(35, 18),
        TestPackage::new(36, 19).notes("truck=2"),
        TestPackage::new(37, 20).deadline(10, 30),
        TestPackage::new(38, 20).notes("truck=2"),
        TestPackage::new(39, 1),
        TestPackage::new(40, 2).deadline(10, 30),
    ]
}

fn plan_day() -> DispatchPlan {
    let locations = all_locations();
    let packages = build_all(&day_packages(), &locations);
    let correction = AddressCorrection {
        package_id: 9,
        destination: locations[CORRECTED_SITE].clone(),
        effective_at: hm(10, 20),
    };
    plan(locations, packages, config(2, 16).with_correction(correction)).unwrap()
}

// ============================================================================
// Lifecycle and loading
// ============================================================================

#[test]
fn test_every_package_delivered() {
    let plan = plan_day();
    assert!(plan.unassigned().is_empty());
    assert_eq!(plan.packages().count(), 40);
    for package in plan.packages() {
        assert_eq!(package.status(), PackageStatus::Delivered, "package {}", package.id());
    }
}

#[test]
fn test_delivered_timestamp_iff_delivered() {
    let plan = plan_day();
    for package in plan.packages() {
        assert_eq!(
            package.delivered_at().is_some(),
            package.status() == PackageStatus::Delivered
        );
        assert!(package.vehicle().is_some());
    }
}

#[test]
fn test_no_package_loaded_twice() {
    let plan = plan_day();
    let mut seen = HashSet::new();
    for trip in plan.trips() {
        for id in &trip.manifest {
            assert!(seen.insert(*id), "package {id} appears on more than one trip");
        }
    }
    assert_eq!(seen.len(), 40);
}

#[test]
fn test_manifest_never_exceeds_capacity() {
    let plan = plan_day();
    for trip in plan.trips() {
        assert!(trip.manifest.len() <= 16);
        assert!(!trip.manifest.is_empty());
    }
}

#[test]
fn test_required_vehicle_respected() {
    let plan = plan_day();
    for trip in plan.trips().iter().filter(|t| t.vehicle == 1) {
        for id in [3, 18, 36, 38] {
            assert!(!trip.carries(id), "package {id} must never ride on vehicle 1");
        }
    }
    for id in [3, 18, 36, 38] {
        assert_eq!(plan.package(id).unwrap().vehicle(), Some(2));
    }
}

#[test]
fn test_required_vehicle_waits_even_when_other_truck_has_room() {
    let locations = all_locations();
    let packages = build_all(
        &[
            TestPackage::new(1, 1).deadline(9, 0).notes("truck=2"),
            TestPackage::new(2, 2),
        ],
        &locations,
    );
    let plan = plan(locations, packages, config(2, 16)).unwrap();
    assert!(plan.route_plans(1).iter().all(|r| !r.packages.contains(&1)));
    assert_eq!(plan.package(1).unwrap().vehicle(), Some(2));
}

#[test]
fn test_delayed_packages_leave_after_arrival() {
    let plan = plan_day();
    for id in [6, 25, 28, 32] {
        let trip = plan.ledger().trip_carrying(id).unwrap();
        assert!(trip.departed_at.time() >= hm(9, 5), "package {id} left at {}", trip.departed_at);
    }
}

#[test]
fn test_address_correction_applied_after_effective_time() {
    let plan = plan_day();
    let locations = all_locations();

    let corrected = plan.package(9).unwrap();
    assert_eq!(corrected.destination(), &locations[CORRECTED_SITE]);
    let trip = plan.ledger().trip_carrying(9).unwrap();
    assert!(trip.departed_at.time() >= hm(10, 20));

    assert_eq!(plan.corrections().len(), 1);
    assert_eq!(plan.corrections()[0].previous, locations[9]);
}

// ============================================================================
// Dependency chains
// ============================================================================

#[test]
fn test_chains_are_disjoint_and_cover_dependency_packages() {
    let plan = plan_day();
    let mut union = BTreeSet::new();
    for chain in plan.chains() {
        for id in chain.members() {
            assert!(union.insert(*id), "package {id} is in two chains");
        }
    }

    let views = plan.views();
    let involved: BTreeSet<_> = views.dependent.union(&views.depended_on).copied().collect();
    assert_eq!(union, involved);
    assert_eq!(union, BTreeSet::from([13, 14, 15, 16, 19, 20]));
}

#[test]
fn test_chain_members_share_one_trip() {
    let plan = plan_day();
    for chain in plan.chains() {
        let first = *chain.members().first().unwrap();
        let trip = plan.ledger().trip_carrying(first).unwrap();
        for id in chain.members() {
            assert!(trip.carries(*id), "chain member {id} split from {first}");
            assert!(plan.package(*id).unwrap().in_dependency_chain());
        }
    }
}

#[test]
fn test_mutual_chain_larger_than_capacity_is_rejected_whole() {
    let locations = all_locations();
    let packages = build_all(
        &[
            TestPackage::new(1, 1).notes("dep=2"),
            TestPackage::new(2, 2).notes("dep=1"),
            TestPackage::new(3, 3),
        ],
        &locations,
    );
    let plan = plan(locations, packages, config(1, 1)).unwrap();

    let unassigned: Vec<_> = plan.unassigned().iter().map(|u| u.package_id).collect();
    assert_eq!(unassigned, vec![1, 2]);
    for trip in plan.trips() {
        assert!(!trip.carries(1) && !trip.carries(2));
    }
    assert_eq!(plan.package(1).unwrap().status(), PackageStatus::AtDepot);
    assert_eq!(plan.package(3).unwrap().status(), PackageStatus::Delivered);
}

// ============================================================================
// Ledger consistency
// ============================================================================

#[test]
fn test_leg_distances_match_graph() {
    let plan = plan_day();
    for trip in plan.trips() {
        let recomputed: f64 = trip
            .tour
            .legs()
            .map(|(from, to)| plan.graph().weight(from, to).unwrap())
            .sum();
        let recorded: f64 = trip.legs.iter().map(|leg| leg.distance).sum();
        assert!((recomputed - recorded).abs() < 1e-9);
        assert!((trip.distance - recorded).abs() < 1e-9);
        assert!((trip.tour.total_distance(plan.graph()) - recorded).abs() < 1e-9);
    }
}

#[test]
fn test_tours_start_and_end_at_depot() {
    let plan = plan_day();
    for trip in plan.trips() {
        assert!(trip.tour.is_closed());
        assert_eq!(&trip.tour.stops()[0], plan.depot());
        assert_eq!(trip.legs.last().unwrap().to, *plan.depot());
    }
}

#[test]
fn test_delivery_times_non_decreasing_along_trip() {
    let plan = plan_day();
    for trip in plan.trips() {
        let stamps: Vec<_> = trip
            .delivery_order
            .iter()
            .map(|id| plan.package(*id).unwrap().delivered_at().unwrap())
            .collect();
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
        assert!(stamps.iter().all(|s| *s > trip.departed_at && *s <= trip.returned_at));
        assert_eq!(trip.delivery_order.len(), trip.manifest.len());
    }
}

#[test]
fn test_vehicle_clock_continues_from_return() {
    let plan = plan_day();
    for vehicle in [1, 2] {
        let trips: Vec<_> = plan.ledger().for_vehicle(vehicle).collect();
        for pair in trips.windows(2) {
            assert!(pair[1].departed_at >= pair[0].returned_at);
        }
    }
}

#[test]
fn test_mileage_totals_add_up() {
    let plan = plan_day();
    let per_vehicle = plan.vehicle_mileage(1) + plan.vehicle_mileage(2);
    assert!((plan.total_mileage() - per_vehicle).abs() < 1e-9);

    for vehicle in [1, 2] {
        let routes = plan.route_plans(vehicle);
        let sum: f64 = routes.iter().map(|r| r.mileage).sum();
        assert!((sum - plan.vehicle_mileage(vehicle)).abs() < 1e-9);
        for route in &routes {
            assert_eq!(plan.trip_distance(vehicle, route.trip), Some(route.mileage));
        }
    }
    assert_eq!(plan.trip_distance(1, 0), None);
}

#[test]
fn test_leg_distance_matches_lookup_trait() {
    let plan = plan_day();
    let leg = &plan.trips()[0].legs[0];
    assert_eq!(plan.graph().distance(&leg.from, &leg.to), leg.distance);
}

// ============================================================================
// Queries
// ============================================================================

#[test]
fn test_lookups() {
    let plan = plan_day();

    let on_state: HashSet<_> = plan.by_address("410 s state").iter().map(|p| p.id()).collect();
    assert_eq!(on_state, HashSet::from([9, 33]));

    let west_valley: Vec<_> = plan.by_city("west valley city").iter().map(|p| p.id()).collect();
    assert_eq!(west_valley, vec![4, 10, 13, 16, 24, 29]);

    assert!(plan.by_postal_code("84107").iter().any(|p| p.id() == 19));
    assert_eq!(plan.by_weight(44.0).len(), 1);
    assert_eq!(plan.by_deadline(hm(9, 0)).len(), 1);
    assert!(plan.by_address("no such street").is_empty());
    assert!(plan.package(999).is_none());
}

#[test]
fn test_status_at_partitions_packages() {
    let plan = plan_day();
    let at = service_date().and_time(hm(9, 30));
    let counts: HashMap<_, _> = [PackageStatus::AtDepot, PackageStatus::EnRoute, PackageStatus::Delivered]
        .into_iter()
        .map(|s| (s, plan.with_status_at(s, at).len()))
        .collect();
    assert_eq!(counts.values().sum::<usize>(), 40);
    assert!(counts[&PackageStatus::EnRoute] + counts[&PackageStatus::Delivered] > 0);
}

#[test]
fn test_planning_is_deterministic() {
    let first = plan_day();
    let second = plan_day();
    assert_eq!(first.trips(), second.trips());
}

// ============================================================================
// Configuration errors
// ============================================================================

#[test]
fn test_zero_capacity_aborts_before_planning() {
    let locations = all_locations();
    let packages = build_all(&[TestPackage::new(1, 1)], &locations);
    let result = plan(locations, packages, config(2, 0));
    assert!(matches!(result, Err(DispatchError::ZeroCapacity { vehicle: 1 })));
}

#[test]
fn test_correction_to_unknown_location_aborts() {
    let locations = sample_locations(3);
    let packages = build_all(&[TestPackage::new(1, 1).notes("ADDRESS_INVALID")], &locations);
    let elsewhere: Location = SITES[10].location();
    let correction = AddressCorrection {
        package_id: 1,
        destination: elsewhere,
        effective_at: hm(10, 20),
    };
    let result = plan(locations, packages, config(1, 4).with_correction(correction));
    assert!(matches!(
        result,
        Err(DispatchError::UnknownCorrectionTarget { package_id: 1, .. })
    ));
}
