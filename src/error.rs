/// Errors raised while building or driving a fleet simulation.
#[derive(Debug, thiserror::Error)]
pub enum TrackingError {
    #[error("Invalid coordinate: ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("Invalid route distance: {0} km")]
    InvalidRouteDistance(f64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Scheduler is already running")]
    AlreadyRunning,

    #[error("Tick failed: {0}")]
    TickFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors reported by a reverse-geocoding collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeocodeError {
    #[error("Lookup timed out")]
    Timeout,

    #[error("Lookup unavailable: {0}")]
    Unavailable(String),

    #[error("Lookup worker disconnected")]
    Disconnected,
}
