//! Test fixtures for depot-dispatch.
//!
//! Provides:
//! - Salt Lake City delivery sites with approximate coordinates
//! - A package builder with sensible defaults

#![allow(dead_code)]

pub mod salt_lake_locations;

pub use salt_lake_locations::*;

use chrono::{NaiveDate, NaiveTime};
use depot_dispatch::ruler::{DistanceMethod, DistanceUnit, Ruler};
use depot_dispatch::{DispatchConfig, Location, Package, PackageId};

pub fn service_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

pub fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// Fixed date, great-circle miles, `trucks` trucks of `capacity`.
pub fn config(trucks: usize, capacity: usize) -> DispatchConfig {
    DispatchConfig {
        service_date: service_date(),
        ruler: Ruler::new(DistanceMethod::GreatCircle, DistanceUnit::Miles),
        ..DispatchConfig::with_fleet(trucks, capacity, 18.0)
    }
}

/// Builder for test packages. Destinations index into [`all_locations`].
#[derive(Clone, Debug)]
pub struct TestPackage {
    id: PackageId,
    site: usize,
    weight: f64,
    deadline: NaiveTime,
    notes: String,
}

impl TestPackage {
    pub fn new(id: PackageId, site: usize) -> Self {
        Self {
            id,
            site,
            weight: 2.0,
            deadline: hm(17, 0),
            notes: String::new(),
        }
    }

    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn deadline(mut self, h: u32, m: u32) -> Self {
        self.deadline = hm(h, m);
        self
    }

    pub fn notes(mut self, notes: &str) -> Self {
        self.notes = notes.to_string();
        self
    }

    pub fn build(&self, locations: &[Location]) -> Package {
        Package::new(
            self.id,
            locations[self.site].clone(),
            self.weight,
            self.deadline,
            self.notes.clone(),
        )
    }
}

pub fn build_all(packages: &[TestPackage], locations: &[Location]) -> Vec<Package> {
    packages.iter().map(|p| p.build(locations)).collect()
}
