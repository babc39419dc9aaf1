use crate::config::SimulationConfig;
use crate::geo::Coordinate;
use crate::route::Route;
use crate::snapshot::TrackingSnapshot;
use crate::vehicle::{Advance, MotionModel, Vehicle, VehicleAttributes};
use crate::{TrackingError, VehicleId, VehicleSet};
use itertools::Itertools;
use rand::Rng;

/// A simulation of a fixed fleet of vehicles shuttling along their routes.
#[derive(Clone, Debug)]
pub struct Simulation {
    /// The vehicles being simulated.
    vehicles: VehicleSet,
    /// The movement rules.
    motion: MotionModel,
    /// The number of ticks simulated so far.
    frame: usize,
}

impl Simulation {
    /// Creates an empty simulation.
    pub fn new(config: &SimulationConfig) -> Result<Self, TrackingError> {
        Ok(Self {
            vehicles: VehicleSet::default(),
            motion: MotionModel::new(config)?,
            frame: 0,
        })
    }

    /// Seeds the fleet with one vehicle per route, numbered "001", "002", ...
    /// in order.
    ///
    /// Routes carry no route numbers, so each vehicle's label repeats its
    /// code. Use [Simulation::add_vehicle] to give vehicles their own labels.
    pub fn initialize(&mut self, routes: impl IntoIterator<Item = Route>) -> Vec<VehicleId> {
        routes
            .into_iter()
            .map(|route| {
                let code = format!("{:03}", self.vehicles.len() + 1);
                let attributes = VehicleAttributes {
                    label: code.clone(),
                    code,
                };
                self.add_vehicle(attributes, route)
            })
            .collect_vec()
    }

    /// Adds a vehicle at the start of the given route.
    pub fn add_vehicle(&mut self, attributes: VehicleAttributes, route: Route) -> VehicleId {
        let id = self
            .vehicles
            .insert_with_key(|id| Vehicle::new(id, attributes, route));
        log::debug!("Added vehicle {}", self.vehicles[id].code());
        id
    }

    /// Advances every vehicle by one tick and returns their snapshots.
    ///
    /// Vehicles are independent of one another. Proximity metrics are only
    /// computed when an `observer` is given.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        observer: Option<Coordinate>,
        rng: &mut R,
    ) -> Vec<TrackingSnapshot> {
        self.frame += 1;
        for vehicle in self.vehicles.values_mut() {
            match self.motion.advance(vehicle, rng) {
                Advance::Moved(km) => log::trace!("Vehicle {} moved {:.3} km", vehicle.code(), km),
                Advance::Looped => log::debug!(
                    "Vehicle {} reached {}, returning to {}",
                    vehicle.code(),
                    vehicle.route().end_name(),
                    vehicle.route().start_name()
                ),
            }
        }
        self.snapshots(observer)
    }

    /// Gets the current snapshots of all vehicles, without advancing the simulation.
    pub fn snapshots(&self, observer: Option<Coordinate>) -> Vec<TrackingSnapshot> {
        self.vehicles
            .values()
            .map(|vehicle| TrackingSnapshot::capture(vehicle, self.frame, observer))
            .collect_vec()
    }

    /// Gets the current snapshot of a single vehicle.
    pub fn snapshot(
        &self,
        vehicle_id: VehicleId,
        observer: Option<Coordinate>,
    ) -> Option<TrackingSnapshot> {
        self.vehicles
            .get(vehicle_id)
            .map(|vehicle| TrackingSnapshot::capture(vehicle, self.frame, observer))
    }

    /// Gets the current simulation frame index.
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Returns an iterator over all the vehicles in the simulation.
    pub fn iter_vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.values()
    }

    /// Gets a reference to the vehicle with the given ID.
    pub fn get_vehicle(&self, vehicle_id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(vehicle_id)
    }
}
