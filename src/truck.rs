//! Delivery vehicles.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::package::PackageId;

/// One-based vehicle identifier.
pub type VehicleId = u32;

/// Where a truck is in its load/deliver cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TruckPhase {
    /// Parked at the depot with nothing aboard.
    Idle,
    Loading,
    RouteOptimizing,
    Delivering,
    /// Back at the depot, manifest cleared.
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("vehicle {vehicle} is full")]
    Full { vehicle: VehicleId },
    #[error("package {package_id} is already aboard vehicle {vehicle}")]
    AlreadyAboard {
        vehicle: VehicleId,
        package_id: PackageId,
    },
}

#[derive(Debug, Clone)]
pub struct Truck {
    id: VehicleId,
    capacity: usize,
    speed: f64,
    manifest: Vec<PackageId>,
    phase: TruckPhase,
}

impl Truck {
    pub fn new(id: VehicleId, capacity: usize, speed: f64) -> Self {
        Self {
            id,
            capacity,
            speed,
            manifest: Vec::with_capacity(capacity),
            phase: TruckPhase::Idle,
        }
    }

    pub fn id(&self) -> VehicleId {
        self.id
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Average speed in distance units per hour.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Package ids in load order.
    pub fn manifest(&self) -> &[PackageId] {
        &self.manifest
    }

    pub fn phase(&self) -> TruckPhase {
        self.phase
    }

    pub fn is_full(&self) -> bool {
        self.manifest.len() >= self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.manifest.is_empty()
    }

    pub fn remaining_capacity(&self) -> usize {
        self.capacity.saturating_sub(self.manifest.len())
    }

    pub fn load(&mut self, package_id: PackageId) -> Result<(), LoadError> {
        if self.is_full() {
            return Err(LoadError::Full { vehicle: self.id });
        }
        if self.manifest.contains(&package_id) {
            return Err(LoadError::AlreadyAboard {
                vehicle: self.id,
                package_id,
            });
        }
        self.phase = TruckPhase::Loading;
        self.manifest.push(package_id);
        Ok(())
    }

    pub(crate) fn begin_routing(&mut self) {
        self.phase = TruckPhase::RouteOptimizing;
    }

    pub(crate) fn begin_delivery(&mut self) {
        self.phase = TruckPhase::Delivering;
    }

    /// Clear the manifest after a completed trip.
    pub(crate) fn reset(&mut self) {
        self.manifest.clear();
        self.phase = TruckPhase::Reset;
    }
}
