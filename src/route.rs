use crate::geo::{haversine_km, Coordinate};
use crate::TrackingError;
use serde::Serialize;

/// A fixed straight-line route between two named stops.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Route {
    start: Coordinate,
    end: Coordinate,
    start_name: String,
    end_name: String,
    total_distance_km: f64,
}

impl Route {
    /// Creates a route with the given nominal length in km.
    ///
    /// A route whose start and end coincide is degenerate; it is accepted
    /// but its length is forced to zero so progress reports as complete.
    pub fn new(
        start: Coordinate,
        end: Coordinate,
        start_name: impl Into<String>,
        end_name: impl Into<String>,
        total_distance_km: f64,
    ) -> Result<Self, TrackingError> {
        if !total_distance_km.is_finite() || total_distance_km < 0.0 {
            return Err(TrackingError::InvalidRouteDistance(total_distance_km));
        }

        Ok(Self::build(start, end, start_name.into(), end_name.into(), total_distance_km))
    }

    /// Creates a route whose length is the great-circle distance between its ends.
    pub fn straight(
        start: Coordinate,
        end: Coordinate,
        start_name: impl Into<String>,
        end_name: impl Into<String>,
    ) -> Self {
        let distance = haversine_km(start, end);
        Self::build(start, end, start_name.into(), end_name.into(), distance)
    }

    fn build(
        start: Coordinate,
        end: Coordinate,
        start_name: String,
        end_name: String,
        total_distance_km: f64,
    ) -> Self {
        let total_distance_km = if start == end {
            log::warn!(
                "Route {} -> {} starts and ends at {}; treating it as zero length",
                start_name,
                end_name,
                start
            );
            0.0
        } else {
            total_distance_km
        };

        Self {
            start,
            end,
            start_name,
            end_name,
            total_distance_km,
        }
    }

    /// The coordinates of the first stop.
    pub fn start(&self) -> Coordinate {
        self.start
    }

    /// The coordinates of the last stop.
    pub fn end(&self) -> Coordinate {
        self.end
    }

    pub fn start_name(&self) -> &str {
        &self.start_name
    }

    pub fn end_name(&self) -> &str {
        &self.end_name
    }

    /// The nominal length of the route in km.
    pub fn total_distance_km(&self) -> f64 {
        self.total_distance_km
    }

    /// Whether the route has zero length.
    pub fn is_degenerate(&self) -> bool {
        self.total_distance_km == 0.0
    }
}
