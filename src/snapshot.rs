use crate::geo::{haversine_km, Coordinate};
use crate::status::{eta_minutes, EtaBand, VehicleStatus};
use crate::vehicle::Vehicle;
use crate::VehicleId;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// The externally visible state of one vehicle at the end of a tick.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrackingSnapshot {
    pub vehicle_id: VehicleId,
    /// The human readable bus ID.
    pub code: String,
    /// The route number.
    pub label: String,
    /// The simulation frame that produced this snapshot.
    pub frame: usize,
    pub position: Coordinate,
    pub speed_kmh: f64,
    pub progress_percent: f64,
    pub status: VehicleStatus,
    /// The great-circle distance to the observer in km, if there is one.
    pub distance_to_observer_km: Option<f64>,
    /// The time until the vehicle reaches the observer in minutes, if there is one.
    pub eta_minutes: Option<f64>,
    pub eta_band: EtaBand,
}

impl TrackingSnapshot {
    /// Captures the state of a vehicle, with proximity metrics relative to `observer`.
    pub fn capture(vehicle: &Vehicle, frame: usize, observer: Option<Coordinate>) -> Self {
        let distance = observer
            .map(|observer| haversine_km(observer, vehicle.position()))
            .filter(|km| km.is_finite());
        let eta = distance
            .map(|km| eta_minutes(km, vehicle.speed_kmh()))
            .filter(|min| min.is_finite());
        let (distance, eta) = match eta {
            Some(eta) => (distance, Some(eta)),
            None => (None, None),
        };

        Self {
            vehicle_id: vehicle.id(),
            code: vehicle.code().to_owned(),
            label: vehicle.label().to_owned(),
            frame,
            position: vehicle.position(),
            speed_kmh: vehicle.speed_kmh(),
            progress_percent: vehicle.progress_percent(),
            status: vehicle.status(),
            distance_to_observer_km: distance,
            eta_minutes: eta,
            eta_band: eta.map_or(EtaBand::Far, EtaBand::from_minutes),
        }
    }

    /// The arrival time rounded up to whole minutes, as shown to passengers.
    pub fn eta_display_minutes(&self) -> Option<u64> {
        self.eta_minutes.map(|min| min.max(0.0).ceil() as u64)
    }
}

impl fmt::Display for TrackingSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Bus #{} ({}) at {} | {:.1} km/h {} | {:.0}%",
            self.label, self.code, self.position, self.speed_kmh, self.status, self.progress_percent
        )?;
        if let (Some(km), Some(min)) = (self.distance_to_observer_km, self.eta_display_minutes()) {
            write!(f, " | {:.2} km away, ETA {} min {}", km, min, self.eta_band)?;
        }
        Ok(())
    }
}

/// The most recently published batch of snapshots.
///
/// Batches are swapped in whole, so readers on other threads always see
/// every vehicle as of the same frame.
#[derive(Clone)]
pub struct SnapshotBoard {
    latest: Arc<RwLock<Arc<[TrackingSnapshot]>>>,
}

impl Default for SnapshotBoard {
    fn default() -> Self {
        Self {
            latest: Arc::new(RwLock::new(Arc::from(Vec::<TrackingSnapshot>::new()))),
        }
    }
}

impl SnapshotBoard {
    /// Creates an empty board.
    pub fn new() -> Self {
        Default::default()
    }

    /// Replaces the current batch.
    pub fn publish(&self, batch: &[TrackingSnapshot]) {
        let batch: Arc<[TrackingSnapshot]> = batch.into();
        *self.latest.write().unwrap_or_else(PoisonError::into_inner) = batch;
    }

    /// Gets the current batch.
    pub fn latest(&self) -> Arc<[TrackingSnapshot]> {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Gets the current snapshot of a single vehicle.
    pub fn get(&self, vehicle_id: VehicleId) -> Option<TrackingSnapshot> {
        self.latest()
            .iter()
            .find(|snapshot| snapshot.vehicle_id == vehicle_id)
            .cloned()
    }

    /// The frame of the current batch, if anything has been published.
    pub fn frame(&self) -> Option<usize> {
        self.latest().first().map(|snapshot| snapshot.frame)
    }
}
