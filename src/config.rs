//! Planning configuration.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::DispatchError;
use crate::location::Location;
use crate::package::PackageId;
use crate::ruler::Ruler;
use crate::truck::VehicleId;
use crate::tsp::TourMethod;

pub const DEFAULT_CAPACITY: usize = 16;

/// Distance units per hour.
pub const DEFAULT_SPEED: f64 = 18.0;

pub const DEFAULT_FLEET_SIZE: usize = 2;

/// Longest idle step accepted, one day.
pub const MAX_IDLE_STEP_SECS: i64 = 86_400;

/// One vehicle of the fleet. Vehicle ids follow list order, starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleSpec {
    pub capacity: usize,
    pub speed: f64,
}

impl Default for VehicleSpec {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            speed: DEFAULT_SPEED,
        }
    }
}

/// A destination fix that becomes known partway through the day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressCorrection {
    pub package_id: PackageId,
    pub destination: Location,
    /// Time of day from which the corrected address may be used.
    pub effective_at: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub vehicles: Vec<VehicleSpec>,
    pub ruler: Ruler,
    pub tour_method: TourMethod,
    /// Calendar day all times of day are anchored to.
    pub service_date: NaiveDate,
    /// First departure clock of every vehicle.
    pub day_start: NaiveTime,
    /// Value of the `EOD` deadline; deadlines before it are priority.
    pub end_of_day: NaiveTime,
    /// Clock advance for a vehicle that could load nothing.
    pub idle_step_secs: i64,
    pub corrections: Vec<AddressCorrection>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            vehicles: vec![VehicleSpec::default(); DEFAULT_FLEET_SIZE],
            ruler: Ruler::default(),
            tour_method: TourMethod::default(),
            service_date: Local::now().date_naive(),
            day_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN),
            end_of_day: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN),
            idle_step_secs: 60,
            corrections: Vec::new(),
        }
    }
}

impl DispatchConfig {
    /// `count` identical vehicles.
    pub fn with_fleet(count: usize, capacity: usize, speed: f64) -> Self {
        Self {
            vehicles: vec![VehicleSpec { capacity, speed }; count],
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_correction(mut self, correction: AddressCorrection) -> Self {
        self.corrections.push(correction);
        self
    }

    /// Anchor a time of day to the service date.
    pub fn at(&self, time: NaiveTime) -> NaiveDateTime {
        self.service_date.and_time(time)
    }

    pub fn correction_for(&self, package_id: PackageId) -> Option<&AddressCorrection> {
        self.corrections.iter().find(|c| c.package_id == package_id)
    }

    /// Reject fleets and clocks that cannot make progress.
    pub fn validate(&self) -> Result<(), DispatchError> {
        if self.vehicles.is_empty() {
            return Err(DispatchError::NoVehicles);
        }
        for (vehicle, spec) in (1 as VehicleId..).zip(&self.vehicles) {
            if spec.capacity == 0 {
                return Err(DispatchError::ZeroCapacity { vehicle });
            }
            if !spec.speed.is_finite() || spec.speed <= 0.0 {
                return Err(DispatchError::InvalidSpeed {
                    vehicle,
                    speed: spec.speed,
                });
            }
        }
        if !(1..=MAX_IDLE_STEP_SECS).contains(&self.idle_step_secs) {
            return Err(DispatchError::InvalidIdleStep {
                seconds: self.idle_step_secs,
            });
        }
        Ok(())
    }
}
