//! Package categorisation into overlapping views.
//!
//! Each package is tested independently against every predicate and listed
//! in every view it matches. Views hold ids, never mutable packages.

use std::collections::BTreeSet;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::package::{Package, PackageId};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageViews {
    /// Deadline before the end of the business day.
    pub priority: BTreeSet<PackageId>,
    /// Arrive at the depot after the day starts.
    pub delayed: BTreeSet<PackageId>,
    /// Declare one or more dependencies.
    pub dependent: BTreeSet<PackageId>,
    /// Named as a dependency by some other package.
    pub depended_on: BTreeSet<PackageId>,
    /// Carry the invalid-address flag.
    pub invalid_address: BTreeSet<PackageId>,
    /// Restricted to one vehicle.
    pub vehicle_restricted: BTreeSet<PackageId>,
    /// No special handling at all.
    pub standard: BTreeSet<PackageId>,
}

impl PackageViews {
    pub fn is_special(&self, id: PackageId) -> bool {
        !self.standard.contains(&id)
    }
}

pub fn classify<'a>(
    packages: impl IntoIterator<Item = &'a Package>,
    end_of_day: NaiveTime,
) -> PackageViews {
    let mut views = PackageViews::default();

    for package in packages {
        let id = package.id();
        let mut special = false;

        if package.has_delay().is_some() {
            views.delayed.insert(id);
            special = true;
        }
        if package.has_dependency() {
            views.dependent.insert(id);
            views
                .depended_on
                .extend(package.directives().dependencies.iter().copied());
            special = true;
        }
        if package.has_invalid_address() {
            views.invalid_address.insert(id);
            special = true;
        }
        if package.has_priority(end_of_day) {
            views.priority.insert(id);
            special = true;
        }
        if package.required_vehicle().is_some() {
            views.vehicle_restricted.insert(id);
            special = true;
        }
        if !special {
            views.standard.insert(id);
        }
    }

    views
}
