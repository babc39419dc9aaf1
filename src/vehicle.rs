use crate::geo::{Coordinate, Vector2d};
use crate::route::Route;
use crate::status::{progress_percent, VehicleStatus};
use crate::VehicleId;
use cgmath::prelude::*;

pub(crate) use motion::{Advance, MotionModel};
pub use motion::ARRIVAL_EPSILON_DEG;

mod motion;

/// A simulated bus looping along its route.
#[derive(Clone, Debug)]
pub struct Vehicle {
    /// The vehicle's ID
    pub(crate) id: VehicleId,
    /// The human readable bus ID, e.g. "001".
    code: String,
    /// The route number shown to passengers, e.g. "138".
    label: String,
    /// The route the vehicle shuttles along.
    route: Route,
    /// The current position.
    position: Coordinate,
    /// The most recently sampled speed in km/h.
    speed_kmh: f64,
    /// The distance covered since the vehicle last left the start of its route, in km.
    distance_traveled_km: f64,
}

/// The attributes of a simulated vehicle.
#[derive(Clone, Debug, Default)]
pub struct VehicleAttributes {
    /// The human readable bus ID.
    pub code: String,
    /// The route number.
    pub label: String,
}

impl Vehicle {
    /// Creates a new vehicle at the start of its route.
    pub(crate) fn new(id: VehicleId, attributes: VehicleAttributes, route: Route) -> Self {
        Self {
            id,
            code: attributes.code,
            label: attributes.label,
            position: route.start(),
            route,
            speed_kmh: 0.0,
            distance_traveled_km: 0.0,
        }
    }

    /// Gets the vehicle's ID.
    pub fn id(&self) -> VehicleId {
        self.id
    }

    /// The human readable bus ID.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The route number.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    /// The current position of the vehicle.
    pub fn position(&self) -> Coordinate {
        self.position
    }

    /// The vehicle's speed in km/h.
    pub fn speed_kmh(&self) -> f64 {
        self.speed_kmh
    }

    /// The distance covered on the current lap in km.
    pub fn distance_traveled_km(&self) -> f64 {
        self.distance_traveled_km
    }

    /// The percentage of the route completed on the current lap.
    pub fn progress_percent(&self) -> f64 {
        progress_percent(self.distance_traveled_km, self.route.total_distance_km())
    }

    pub fn status(&self) -> VehicleStatus {
        VehicleStatus::from_speed(self.speed_kmh)
    }

    /// The planar offset from the vehicle to the end of its route, in degrees.
    pub(crate) fn heading_vector(&self) -> Vector2d {
        self.route.end().to_vector() - self.position.to_vector()
    }

    /// The planar distance left to the end of the route, in degrees.
    ///
    /// This is a coordinate-delta magnitude, not a geodesic distance.
    pub fn distance_remaining_deg(&self) -> f64 {
        self.heading_vector().magnitude()
    }
}
