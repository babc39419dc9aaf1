pub use cgmath;
pub use config::{FleetConfig, RouteConfig, SimulationConfig, VehicleConfig};
pub use error::{GeocodeError, TrackingError};
pub use geo::{haversine_km, Coordinate, KM_PER_DEGREE};
pub use geocode::{PlaceKey, PlaceLabeler, ReverseGeocoder, FALLBACK_PLACE_LABEL};
pub use live::LiveSimulation;
pub use route::Route;
pub use scheduler::{ObserverProvider, SnapshotSink, TickSource, TrackingScheduler};
pub use simulation::Simulation;
use slotmap::{new_key_type, SlotMap};
pub use slotmap::Key;
pub use snapshot::{SnapshotBoard, TrackingSnapshot};
pub use status::{EtaBand, VehicleStatus};
pub use util::Interval;
pub use vehicle::{Vehicle, VehicleAttributes, ARRIVAL_EPSILON_DEG};

mod config;
mod error;
pub mod geo;
mod geocode;
mod live;
mod route;
mod scheduler;
mod simulation;
mod snapshot;
pub mod status;
mod util;
mod vehicle;

new_key_type! {
    /// Unique ID of a [Vehicle].
    pub struct VehicleId;
}

type VehicleSet = SlotMap<VehicleId, Vehicle>;
