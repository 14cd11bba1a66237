//! Delivery locations.
//!
//! A [`Location`] is identified by its full field tuple. Coordinates are
//! compared bitwise so locations can key hash maps.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub long: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, long: f64) -> Self {
        Self { lat, long }
    }

    fn bits(&self) -> (u64, u64) {
        (self.lat.to_bits(), self.long.to_bits())
    }
}

/// A named street address with its coordinate.
///
/// Immutable once created. By convention the first location handed to the
/// dispatch engine is the depot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    name: String,
    street: String,
    city: String,
    region: String,
    postal_code: String,
    coordinate: Coordinate,
}

impl Location {
    pub fn new(
        name: impl Into<String>,
        street: impl Into<String>,
        city: impl Into<String>,
        region: impl Into<String>,
        postal_code: impl Into<String>,
        coordinate: Coordinate,
    ) -> Self {
        Self {
            name: name.into(),
            street: street.into(),
            city: city.into(),
            region: region.into(),
            postal_code: postal_code.into(),
            coordinate,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn street(&self) -> &str {
        &self.street
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn postal_code(&self) -> &str {
        &self.postal_code
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.street == other.street
            && self.city == other.city
            && self.region == other.region
            && self.postal_code == other.postal_code
            && self.coordinate.bits() == other.coordinate.bits()
    }
}

impl Eq for Location {}

impl Hash for Location {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.street.hash(state);
        self.city.hash(state);
        self.region.hash(state);
        self.postal_code.hash(state);
        self.coordinate.bits().hash(state);
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}",
            self.street, self.city, self.region, self.postal_code
        )
    }
}
