//! Dependency-chain resolution.
//!
//! Every package that names dependencies contributes one set: its own id plus
//! the ids it depends on. Sets that share any id are merged transitively, so
//! the resulting chains are pairwise disjoint. Only dependency-bearing
//! packages enter the pool; the work is quadratic in their count rather than
//! in the size of the whole package set.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::package::{Package, PackageId};

/// Packages that must be loaded onto the same vehicle in the same pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyChain {
    members: BTreeSet<PackageId>,
}

impl DependencyChain {
    pub fn new(members: BTreeSet<PackageId>) -> Self {
        Self { members }
    }

    /// Member ids in ascending order.
    pub fn members(&self) -> &BTreeSet<PackageId> {
        &self.members
    }

    pub fn contains(&self, id: PackageId) -> bool {
        self.members.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Resolve the chains declared by `packages`.
///
/// Chains come back ordered by their smallest member.
pub fn resolve_chains<'a>(packages: impl IntoIterator<Item = &'a Package>) -> Vec<DependencyChain> {
    let mut declared: Vec<(PackageId, &[PackageId])> = packages
        .into_iter()
        .filter(|p| p.has_dependency())
        .map(|p| (p.id(), p.directives().dependencies.as_slice()))
        .collect();
    declared.sort_by_key(|(id, _)| *id);

    let pool = declared
        .into_iter()
        .map(|(id, deps)| {
            let mut set: BTreeSet<PackageId> = deps.iter().copied().collect();
            set.insert(id);
            set
        })
        .collect();

    merge_overlapping(pool)
        .into_iter()
        .map(DependencyChain::new)
        .collect()
}

/// Merge every group of intersecting sets into their union.
pub fn merge_overlapping(mut pool: Vec<BTreeSet<PackageId>>) -> Vec<BTreeSet<PackageId>> {
    let mut merged = Vec::new();

    // pop from the front so chains keep the pool's order
    pool.reverse();
    while let Some(mut current) = pool.pop() {
        expand(&mut current, &pool);
        pool.retain(|set| !set.is_subset(&current));
        merged.push(current);
    }

    merged.sort_by_key(|set| set.first().copied());
    merged
}

/// Union `current` with every set in `pool` it intersects, to a fixpoint.
fn expand(current: &mut BTreeSet<PackageId>, pool: &[BTreeSet<PackageId>]) {
    loop {
        let mut grew = false;
        for set in pool {
            if !set.is_subset(current) && !set.is_disjoint(current) {
                current.extend(set.iter().copied());
                grew = true;
            }
        }
        if !grew {
            break;
        }
    }
}
