//! Distance calculator ("ruler") between geographic coordinates.
//!
//! Three formulas are available, trading accuracy for speed: a planar
//! approximation that ignores curvature, great-circle distance on a sphere of
//! mean Earth radius, and Vincenty's iterative solution on the WGS-84
//! ellipsoid. Results are converted from meters into the configured unit.

use serde::{Deserialize, Serialize};

use crate::location::Coordinate;

/// WGS-84 semi-major axis in meters.
const EARTH_SEMI_MAJOR_M: f64 = 6_378_137.0;

/// WGS-84 semi-minor axis in meters.
const EARTH_SEMI_MINOR_M: f64 = 6_356_752.314245;

/// WGS-84 flattening.
const EARTH_FLATTENING: f64 = 1.0 / 298.257223563;

/// Vincenty stops iterating once lambda moves less than this (~0.06mm).
const VINCENTY_TOLERANCE: f64 = 1e-12;

const VINCENTY_MAX_ITERATIONS: usize = 1_000;

fn mean_radius_m() -> f64 {
    0.5 * (EARTH_SEMI_MAJOR_M + EARTH_SEMI_MINOR_M)
}

/// Formula used to compute distances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DistanceMethod {
    /// Flat-earth approximation (fast, inaccurate over long spans).
    Planar,
    /// Great-circle distance on a sphere.
    GreatCircle,
    /// Vincenty's inverse formula on the ellipsoid.
    #[default]
    Ellipsoidal,
}

/// Output unit of a [`Ruler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DistanceUnit {
    Meters,
    Kilometers,
    #[default]
    Miles,
    Feet,
    Yards,
}

impl DistanceUnit {
    /// Multiplier converting meters into this unit.
    pub fn per_meter(self) -> f64 {
        match self {
            DistanceUnit::Meters => 1.0,
            DistanceUnit::Kilometers => 0.001,
            DistanceUnit::Miles => 0.000621371,
            DistanceUnit::Feet => 3.28084,
            DistanceUnit::Yards => 1.09361,
        }
    }

    pub fn abbreviation(self) -> &'static str {
        match self {
            DistanceUnit::Meters => "m",
            DistanceUnit::Kilometers => "km",
            DistanceUnit::Miles => "mi",
            DistanceUnit::Feet => "ft",
            DistanceUnit::Yards => "yd",
        }
    }
}

/// Pure distance function parameterised by method, unit and optional rounding.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Ruler {
    pub method: DistanceMethod,
    pub unit: DistanceUnit,
    /// Decimal places to round results to. `None` keeps full precision.
    #[serde(default)]
    pub precision: Option<u8>,
}

impl Ruler {
    pub fn new(method: DistanceMethod, unit: DistanceUnit) -> Self {
        Self {
            method,
            unit,
            precision: None,
        }
    }

    pub fn with_precision(mut self, places: u8) -> Self {
        self.precision = Some(places);
        self
    }

    /// Distance between two coordinates in this ruler's unit.
    pub fn distance(&self, from: Coordinate, to: Coordinate) -> f64 {
        let meters = match self.method {
            DistanceMethod::Planar => planar_m(from, to),
            DistanceMethod::GreatCircle => great_circle_m(from, to),
            DistanceMethod::Ellipsoidal => vincenty_m(from, to),
        };
        let converted = meters * self.unit.per_meter();
        match self.precision {
            Some(places) => {
                let scale = 10f64.powi(i32::from(places));
                (converted * scale).round() / scale
            }
            None => converted,
        }
    }
}

/// Pythagorean distance on an equirectangular projection.
fn planar_m(from: Coordinate, to: Coordinate) -> f64 {
    let meters_per_degree = 2.0 * std::f64::consts::PI * mean_radius_m() / 360.0;
    let mean_lat = ((from.lat + to.lat) / 2.0).to_radians();
    let dx = (to.long - from.long) * mean_lat.cos();
    let dy = to.lat - from.lat;
    (dx * dx + dy * dy).sqrt() * meters_per_degree
}

/// Haversine form of the great-circle distance.
///
/// Same result as the spherical law of cosines, without its rounding error
/// on short spans where `cos` of the central angle is close to 1.
fn great_circle_m(from: Coordinate, to: Coordinate) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_long = (to.long - from.long).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_long / 2.0).sin().powi(2);
    2.0 * mean_radius_m() * a.sqrt().min(1.0).asin()
}

/// Vincenty's inverse solution on the WGS-84 ellipsoid.
///
/// Coincident points short-circuit to zero before any division by `sin σ`.
/// Nearly antipodal points may not converge; the estimate after the
/// iteration cap is returned in that case.
fn vincenty_m(from: Coordinate, to: Coordinate) -> f64 {
    let a = EARTH_SEMI_MAJOR_M;
    let b = EARTH_SEMI_MINOR_M;
    let f = EARTH_FLATTENING;

    let u1 = ((1.0 - f) * from.lat.to_radians().tan()).atan();
    let u2 = ((1.0 - f) * to.lat.to_radians().tan()).atan();
    let (sin_u1, cos_u1) = u1.sin_cos();
    let (sin_u2, cos_u2) = u2.sin_cos();

    let l = (to.long - from.long).to_radians();
    let mut lambda = l;

    let mut sin_sigma;
    let mut cos_sigma;
    let mut sigma;
    let mut cos_sq_alpha;
    let mut cos_2sigma_m;
    let mut iterations = 0;

    loop {
        let (sin_lambda, cos_lambda) = lambda.sin_cos();
        sin_sigma = ((cos_u2 * sin_lambda).powi(2)
            + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2))
        .sqrt();
        if sin_sigma == 0.0 {
            return 0.0;
        }
        cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        sigma = sin_sigma.atan2(cos_sigma);

        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        // equatorial line: cos²α = 0
        cos_2sigma_m = if cos_sq_alpha != 0.0 {
            cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
        } else {
            0.0
        };
        let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));

        let previous = lambda;
        lambda = l
            + (1.0 - c)
                * f
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))));

        iterations += 1;
        if (lambda - previous).abs() <= VINCENTY_TOLERANCE {
            break;
        }
        if iterations >= VINCENTY_MAX_ITERATIONS {
            tracing::debug!(?from, ?to, "vincenty did not converge, using last estimate");
            break;
        }
    }

    let u_sq = cos_sq_alpha * (a * a - b * b) / (b * b);
    let big_a = 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
    let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
    let delta_sigma = big_b
        * sin_sigma
        * (cos_2sigma_m
            + big_b / 4.0
                * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))
                    - big_b / 6.0
                        * cos_2sigma_m
                        * (-3.0 + 4.0 * sin_sigma.powi(2))
                        * (-3.0 + 4.0 * cos_2sigma_m.powi(2))));

    b * big_a * (sigma - delta_sigma)
}
