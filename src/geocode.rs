//! Reverse geocoding for display, isolated from the simulation.

use crate::geo::Coordinate;
use crate::snapshot::TrackingSnapshot;
use crate::{GeocodeError, TrackingError};
use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

/// The label shown when a place cannot be looked up.
pub const FALLBACK_PLACE_LABEL: &str = "Unknown location";

/// Coordinates are grouped to this many decimal places (roughly 110 m) when caching labels.
const KEY_SCALE: f64 = 1e3;

/// The most lookups that may wait for the geocoder at once.
const QUEUE_DEPTH: usize = 16;

/// Turns a coordinate into a human readable place name.
pub trait ReverseGeocoder: Send + 'static {
    fn reverse(&self, at: Coordinate) -> Result<String, GeocodeError>;
}

/// Identifies a lookup: a vehicle at a coordinate rounded to 1e-3 degrees.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PlaceKey {
    pub code: String,
    lat: i64,
    lon: i64,
}

impl PlaceKey {
    pub fn new(code: &str, at: Coordinate) -> Self {
        Self {
            code: code.to_owned(),
            lat: (at.latitude() * KEY_SCALE).round() as i64,
            lon: (at.longitude() * KEY_SCALE).round() as i64,
        }
    }
}

/// State shared between the labeler and its lookup worker.
#[derive(Default)]
struct Places {
    /// The most recent label resolved for each vehicle. Failures are not cached.
    labels: HashMap<String, (PlaceKey, String)>,
    /// Lookups queued or being resolved.
    pending: HashSet<PlaceKey>,
}

type Request = (PlaceKey, Coordinate);

/// Labels vehicle positions with place names.
///
/// Lookups never block the caller. A position that has not been resolved yet
/// reads as [FALLBACK_PLACE_LABEL] while a single background worker asks the
/// geocoder; later calls for the same place return the resolved label. When
/// the worker is busy, further lookups are dropped rather than queued without
/// bound. Only the latest place of each vehicle is kept.
pub struct PlaceLabeler {
    requests: SyncSender<Request>,
    places: Arc<Mutex<Places>>,
}

impl PlaceLabeler {
    /// Creates a labeler and starts its lookup worker.
    ///
    /// The worker exits once the labeler is dropped and any lookup in
    /// progress has returned.
    pub fn new(geocoder: impl ReverseGeocoder) -> Result<Self, TrackingError> {
        let (requests, queue) = mpsc::sync_channel(QUEUE_DEPTH);
        let places = Arc::new(Mutex::new(Places::default()));
        let shared = places.clone();
        thread::Builder::new()
            .name("reverse-geocode".into())
            .spawn(move || resolve_all(geocoder, queue, shared))?;
        Ok(Self { requests, places })
    }

    /// Labels the position of a snapshot.
    pub fn label_for(&self, snapshot: &TrackingSnapshot) -> String {
        self.lookup(&snapshot.code, snapshot.position)
    }

    /// Labels the position of the vehicle with the given code.
    pub fn lookup(&self, code: &str, at: Coordinate) -> String {
        let key = PlaceKey::new(code, at);
        let mut places = lock(&self.places);
        if let Some((place, label)) = places.labels.get(code) {
            if *place == key {
                return label.clone();
            }
        }

        if places.pending.insert(key.clone()) {
            let err = match self.requests.try_send((key.clone(), at)) {
                Ok(()) => None,
                Err(TrySendError::Full(_)) => Some(GeocodeError::Unavailable("geocoder busy".into())),
                Err(TrySendError::Disconnected(_)) => Some(GeocodeError::Disconnected),
            };
            if let Some(err) = err {
                places.pending.remove(&key);
                log::debug!("Skipped place lookup for {} at {}: {}", code, at, err);
            }
        }
        FALLBACK_PLACE_LABEL.to_owned()
    }

    /// Whether no lookups are queued or in progress.
    pub fn is_idle(&self) -> bool {
        lock(&self.places).pending.is_empty()
    }
}

/// Resolves queued lookups one at a time until the labeler goes away.
fn resolve_all(geocoder: impl ReverseGeocoder, queue: Receiver<Request>, places: Arc<Mutex<Places>>) {
    for (key, at) in queue {
        let result = panic::catch_unwind(AssertUnwindSafe(|| geocoder.reverse(at)))
            .unwrap_or_else(|_| Err(GeocodeError::Unavailable("geocoder panicked".into())));

        let mut places = lock(&places);
        places.pending.remove(&key);
        match result {
            Ok(label) => {
                places.labels.insert(key.code.clone(), (key, label));
            }
            Err(err) => log::debug!("No place label for {} at {}: {}", key.code, at, err),
        }
    }
}

fn lock(places: &Mutex<Places>) -> MutexGuard<'_, Places> {
    places.lock().unwrap_or_else(PoisonError::into_inner)
}
