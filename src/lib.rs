//! depot-dispatch core
//!
//! Plans and simulates a day of package deliveries from a single depot with
//! a fleet of capacity-limited trucks, then answers "what was the state at
//! time T" queries from the recorded trips.

pub mod classify;
pub mod config;
pub mod dependency;
pub mod dispatch;
pub mod error;
pub mod graph;
pub mod ledger;
pub mod location;
pub mod package;
pub mod plan;
pub mod ruler;
pub mod snapshot;
pub mod time;
pub mod tour;
pub mod traits;
pub mod truck;
pub mod tsp;

pub use config::{AddressCorrection, DispatchConfig, VehicleSpec};
pub use dispatch::{DispatchEngine, UnassignedPackage, UnassignedReason, plan};
pub use error::DispatchError;
pub use location::{Coordinate, Location};
pub use package::{Package, PackageId, PackageStatus};
pub use plan::{DispatchPlan, RoutePlan};
pub use snapshot::{PackageView, Snapshot};
pub use truck::VehicleId;
