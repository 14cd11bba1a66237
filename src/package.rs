//! Packages and their handling directives.
//!
//! The free-text annotation carried by each package is parsed exactly once,
//! at construction, into typed [`Directives`]. Status and delivery time are
//! only mutated by the dispatch engine through the crate-private lifecycle
//! methods, which enforce AtDepot → EnRoute → Delivered.

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::PackageError;
use crate::location::Location;
use crate::time::parse_time_of_day;
use crate::truck::VehicleId;

/// Stable package identifier.
pub type PackageId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PackageStatus {
    AtDepot,
    EnRoute,
    Delivered,
}

/// Machine-readable handling directives extracted from a package annotation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directives {
    /// The only vehicle allowed to carry the package.
    pub required_vehicle: Option<VehicleId>,
    /// Time the package reaches the depot.
    pub arrival: Option<NaiveTime>,
    /// Packages that must travel on the same vehicle and trip.
    pub dependencies: Vec<PackageId>,
    /// The recorded address is wrong until a correction arrives.
    pub invalid_address: bool,
}

impl Directives {
    /// Parse an annotation such as `dep=13,15 truck=2 arrival="9:05 am"`.
    ///
    /// Unknown tokens are ignored. Malformed values are skipped with a
    /// warning instead of failing the whole record.
    pub fn parse(notes: &str) -> Self {
        let mut directives = Directives::default();

        for token in tokenize(notes) {
            let (key, value) = match token.split_once('=') {
                Some((key, value)) => (key.trim().to_ascii_lowercase(), Some(value.trim())),
                None => (token.trim().to_ascii_lowercase(), None),
            };

            match (key.as_str(), value) {
                ("address_invalid" | "invalid_address", _) => directives.invalid_address = true,
                ("dep" | "deps", Some(value)) => {
                    for raw in value.split(',').map(str::trim).filter(|raw| !raw.is_empty()) {
                        match raw.parse::<PackageId>() {
                            Ok(id) if !directives.dependencies.contains(&id) => {
                                directives.dependencies.push(id)
                            }
                            Ok(_) => {}
                            Err(_) => tracing::warn!(notes, raw, "skipping malformed dependency id"),
                        }
                    }
                }
                ("truck" | "vehicle", Some(value)) => match value.parse::<VehicleId>() {
                    Ok(id) => directives.required_vehicle = Some(id),
                    Err(_) => tracing::warn!(notes, value, "skipping malformed vehicle id"),
                },
                ("arrival" | "delay", Some(value)) => match parse_time_of_day(value) {
                    Ok(time) => directives.arrival = Some(time),
                    Err(err) => tracing::warn!(notes, %err, "skipping malformed arrival time"),
                },
                _ => {}
            }
        }

        directives
    }
}

/// Split on whitespace, keeping double-quoted runs together.
fn tokenize(notes: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for ch in notes.chars() {
        match ch {
            '"' => quoted = !quoted,
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    id: PackageId,
    destination: Location,
    weight: f64,
    deadline: NaiveTime,
    notes: String,
    directives: Directives,
    status: PackageStatus,
    delivered_at: Option<NaiveDateTime>,
    vehicle: Option<VehicleId>,
    in_dependency_chain: bool,
}

impl Package {
    pub fn new(
        id: PackageId,
        destination: Location,
        weight: f64,
        deadline: NaiveTime,
        notes: impl Into<String>,
    ) -> Self {
        let notes = notes.into();
        let mut directives = Directives::parse(&notes);
        directives.dependencies.retain(|dep| *dep != id);

        Self {
            id,
            destination,
            weight,
            deadline,
            notes,
            directives,
            status: PackageStatus::AtDepot,
            delivered_at: None,
            vehicle: None,
            in_dependency_chain: false,
        }
    }

    pub fn id(&self) -> PackageId {
        self.id
    }

    pub fn destination(&self) -> &Location {
        &self.destination
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn deadline(&self) -> NaiveTime {
        self.deadline
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn directives(&self) -> &Directives {
        &self.directives
    }

    pub fn status(&self) -> PackageStatus {
        self.status
    }

    pub fn delivered_at(&self) -> Option<NaiveDateTime> {
        self.delivered_at
    }

    /// Vehicle the package was loaded onto, once loaded.
    pub fn vehicle(&self) -> Option<VehicleId> {
        self.vehicle
    }

    pub fn in_dependency_chain(&self) -> bool {
        self.in_dependency_chain
    }

    pub fn has_delay(&self) -> Option<NaiveTime> {
        self.directives.arrival
    }

    pub fn has_dependency(&self) -> bool {
        !self.directives.dependencies.is_empty()
    }

    pub fn has_invalid_address(&self) -> bool {
        self.directives.invalid_address
    }

    pub fn required_vehicle(&self) -> Option<VehicleId> {
        self.directives.required_vehicle
    }

    /// Deadline strictly earlier than the end of the business day.
    pub fn has_priority(&self, end_of_day: NaiveTime) -> bool {
        self.deadline < end_of_day
    }

    pub(crate) fn set_in_dependency_chain(&mut self, member: bool) {
        self.in_dependency_chain = member;
    }

    pub(crate) fn redirect(&mut self, destination: Location) {
        self.destination = destination;
    }

    pub(crate) fn mark_en_route(&mut self, vehicle: VehicleId) -> Result<(), PackageError> {
        self.transition(PackageStatus::AtDepot, PackageStatus::EnRoute)?;
        self.vehicle = Some(vehicle);
        Ok(())
    }

    pub(crate) fn mark_delivered(&mut self, at: NaiveDateTime) -> Result<(), PackageError> {
        self.transition(PackageStatus::EnRoute, PackageStatus::Delivered)?;
        self.delivered_at = Some(at);
        Ok(())
    }

    fn transition(&mut self, from: PackageStatus, to: PackageStatus) -> Result<(), PackageError> {
        if self.status != from {
            return Err(PackageError::InvalidTransition {
                package_id: self.id,
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}
