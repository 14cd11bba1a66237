//! Salt Lake City valley delivery sites.
//!
//! Coordinates are approximate street positions, good enough for distance
//! and routing tests. Index 0 is the depot.

use depot_dispatch::{Coordinate, Location};

/// A site that can be declared as a constant.
#[derive(Debug, Clone, Copy)]
pub struct Site {
    pub name: &'static str,
    pub street: &'static str,
    pub city: &'static str,
    pub postal_code: &'static str,
    pub lat: f64,
    pub long: f64,
}

impl Site {
    pub const fn new(
        name: &'static str,
        street: &'static str,
        city: &'static str,
        postal_code: &'static str,
        lat: f64,
        long: f64,
    ) -> Self {
        Self {
            name,
            street,
            city,
            postal_code,
            lat,
            long,
        }
    }

    pub fn location(&self) -> Location {
        Location::new(
            self.name,
            self.street,
            self.city,
            "UT",
            self.postal_code,
            Coordinate::new(self.lat, self.long),
        )
    }
}

// ============================================================================
// Depot
// ============================================================================

pub const DEPOT: Site = Site::new(
    "Western Governors University",
    "4001 South 700 East",
    "Salt Lake City",
    "84107",
    40.6852,
    -111.8709,
);

// ============================================================================
// Delivery sites
// ============================================================================

pub const SITES: &[Site] = &[
    Site::new("International Peace Gardens", "1060 Dalton Ave S", "Salt Lake City", "84104", 40.7436, -111.9220),
    Site::new("Sugar House Park", "1330 2100 S", "Salt Lake City", "84106", 40.7232, -111.8467),
    Site::new("Salt Lake City Streets and Sanitation", "2530 S 500 E", "Salt Lake City", "84106", 40.7115, -111.8772),
    Site::new("Deker Lake", "2300 Parkway Blvd", "West Valley City", "84119", 40.7195, -111.9510),
    Site::new("Salt Lake City Ottinger Hall", "233 Canyon Rd", "Salt Lake City", "84103", 40.7755, -111.8869),
    Site::new("Columbus Library", "2530 S 500 E", "Salt Lake City", "84106", 40.7119, -111.8780),
    Site::new("Taylorsville City Offices", "2600 Taylorsville Blvd", "Salt Lake City", "84118", 40.6686, -111.9387),
    Site::new("South Salt Lake Police", "2835 Main St", "Salt Lake City", "84115", 40.7066, -111.8912),
    Site::new("Council Hall", "300 State St", "Salt Lake City", "84103", 40.7682, -111.8876),
    Site::new("Redwood Park", "3060 Lester St", "West Valley City", "84119", 40.7021, -111.9396),
    Site::new("Salt Lake County Mental Health", "3148 S 1100 W", "Salt Lake City", "84119", 40.7003, -111.9243),
    Site::new("Salt Lake County/United Police Dept", "3365 S 900 W", "Salt Lake City", "84119", 40.6961, -111.9202),
    Site::new("West Valley Prosecutor", "3575 W Valley Central Station bus Loop", "West Valley City", "84119", 40.6912, -111.9826),
    Site::new("Housing Auth. of Salt Lake County", "3595 Main St", "Salt Lake City", "84115", 40.6912, -111.8913),
    Site::new("Utah DMV Administrative Office", "380 W 2880 S", "Salt Lake City", "84115", 40.7057, -111.9003),
    Site::new("Third District Juvenile Court", "410 S State St", "Salt Lake City", "84111", 40.7606, -111.8882),
    Site::new("Cottonwood Regional Softball Complex", "4300 S 1300 E", "Millcreek", "84117", 40.6793, -111.8556),
    Site::new("Holiday City Office", "4580 S 2300 E", "Holladay", "84117", 40.6718, -111.8238),
    Site::new("Murray City Museum", "5025 State St", "Murray", "84107", 40.6536, -111.8882),
    Site::new("Valley Regional Softball Complex", "5100 South 2700 West", "Salt Lake City", "84118", 40.6529, -111.9571),
];

// ============================================================================
// Combined
// ============================================================================

/// Depot first, then every delivery site.
pub fn all_locations() -> Vec<Location> {
    std::iter::once(&DEPOT).chain(SITES).map(Site::location).collect()
}

/// Depot plus the first `count` delivery sites.
pub fn sample_locations(count: usize) -> Vec<Location> {
    all_locations().into_iter().take(count + 1).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sites_in_salt_lake_valley() {
        for loc in all_locations() {
            let c = loc.coordinate();
            assert!(c.lat > 40.6 && c.lat < 40.8, "{} lat out of range: {}", loc.name(), c.lat);
            assert!(c.long > -112.0 && c.long < -111.8, "{} long out of range: {}", loc.name(), c.long);
        }
    }

    #[test]
    fn test_sites_are_distinct() {
        let all = all_locations();
        let unique: std::collections::HashSet<_> = all.iter().collect();
        assert_eq!(unique.len(), all.len());
    }
}
