//! Geographic coordinates and distance functions.

use crate::TrackingError;
use cgmath::Vector2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mean Earth radius in km.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Approximate length of one degree of arc in km. Used to convert planar
/// coordinate-degree steps into travelled distance.
pub const KM_PER_DEGREE: f64 = 111.32;

/// A planar vector in coordinate degrees, `x` being longitude and `y` latitude.
pub type Vector2d = Vector2<f64>;

/// A WGS-84 coordinate in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate, rejecting non-finite or out of range values.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, TrackingError> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        if valid {
            Ok(Self {
                latitude,
                longitude,
            })
        } else {
            Err(TrackingError::InvalidCoordinate {
                latitude,
                longitude,
            })
        }
    }

    /// Creates a coordinate from literals known to be in range.
    pub(crate) const fn new_unchecked(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// The latitude in degrees.
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// The longitude in degrees.
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// The coordinate as a planar vector.
    pub(crate) fn to_vector(self) -> Vector2d {
        Vector2d::new(self.longitude, self.latitude)
    }

    /// Converts a planar vector back into a coordinate. Values are clamped
    /// into range so jitter near the poles or the antimeridian stays valid.
    pub(crate) fn from_vector(v: Vector2d) -> Self {
        Self {
            latitude: v.y.clamp(-90.0, 90.0),
            longitude: v.x.clamp(-180.0, 180.0),
        }
    }
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = TrackingError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Self::new(raw.latitude, raw.longitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// Computes the great-circle distance between two coordinates in km.
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (0.5 * d_lat).sin().powi(2) + lat1.cos() * lat2.cos() * (0.5 * d_lon).sin().powi(2);
    // Rounding can push `h` just outside [0, 1] for antipodal points
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}
