//! Error types raised by the planner.

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::package::{PackageId, PackageStatus};
use crate::truck::{LoadError, VehicleId};

/// Errors that abort planning.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The fleet is empty.
    #[error("fleet has no vehicles")]
    NoVehicles,
    /// A vehicle was configured without room for any package.
    #[error("vehicle {vehicle} has zero capacity")]
    ZeroCapacity {
        /// One-based vehicle id.
        vehicle: VehicleId,
    },
    /// A vehicle speed is zero, negative or not finite.
    #[error("vehicle {vehicle} has invalid speed {speed}")]
    InvalidSpeed {
        /// One-based vehicle id.
        vehicle: VehicleId,
        /// Configured speed.
        speed: f64,
    },
    /// The idle clock increment must move time forward by at most one day.
    #[error("idle step must be between 1s and one day, got {seconds}s")]
    InvalidIdleStep {
        /// Configured increment.
        seconds: i64,
    },
    /// No locations were supplied, so there is no depot.
    #[error("no locations supplied")]
    NoLocations,
    /// No packages were supplied.
    #[error("no packages supplied")]
    NoPackages,
    /// Two package records share an id.
    #[error("duplicate package id {0}")]
    DuplicatePackage(PackageId),
    /// A package is addressed to a location outside the location list.
    #[error("package {package_id} is addressed to unknown location {address}")]
    UnknownDestination {
        /// Affected package.
        package_id: PackageId,
        /// Display form of the destination.
        address: String,
    },
    /// An address correction points at a location outside the location list.
    #[error("address correction for package {package_id} targets unknown location {address}")]
    UnknownCorrectionTarget {
        /// Package the correction belongs to.
        package_id: PackageId,
        /// Display form of the corrected destination.
        address: String,
    },
    /// Every vehicle clock passed the release horizon and nothing could be loaded.
    #[error("planning stalled at {at} with {} packages pending", pending.len())]
    Deadlock {
        /// Earliest vehicle clock when the stall was detected.
        at: NaiveDateTime,
        /// Packages that could not be loaded.
        pending: Vec<PackageId>,
    },
    /// A vehicle clock left the representable date range.
    #[error("clock of vehicle {vehicle} overflowed after {at}")]
    ClockOverflow {
        /// Vehicle whose clock was advanced.
        vehicle: VehicleId,
        /// Last representable clock reading.
        at: NaiveDateTime,
    },
    /// A tour leg has no edge in the distance graph.
    #[error("no distance known from {from} to {to}")]
    MissingEdge {
        /// Display form of the leg start.
        from: String,
        /// Display form of the leg end.
        to: String,
    },
    /// A tour left loaded packages undelivered.
    #[error("tour for vehicle {vehicle} missed packages {missing:?}")]
    IncompleteTour {
        /// Vehicle whose tour was walked.
        vehicle: VehicleId,
        /// Packages still en route after the walk.
        missing: Vec<PackageId>,
    },
    /// A package lifecycle rule was broken.
    #[error(transparent)]
    Lifecycle(#[from] PackageError),
    /// A truck refused a package the loading pass accepted.
    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Illegal package status transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackageError {
    /// The requested transition does not follow AtDepot → EnRoute → Delivered.
    #[error("package {package_id} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        /// Affected package.
        package_id: PackageId,
        /// Current status.
        from: PackageStatus,
        /// Requested status.
        to: PackageStatus,
    },
}

/// Errors raised while editing a distance graph.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// Edge weights must be finite and non-negative.
    #[error("edge weight {0} is negative or not finite")]
    InvalidWeight(f64),
}

/// A time-of-day string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognised time of day {input:?}")]
pub struct TimeParseError {
    /// The rejected input.
    pub input: String,
}
