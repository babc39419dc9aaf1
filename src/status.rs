//! Classification of vehicle speed and arrival time, and the derived metrics
//! behind them.

use serde::Serialize;
use std::fmt;

/// Vehicles slower than this are reported as stopped, in km/h.
pub const STOPPED_BELOW_KMH: f64 = 5.0;

/// Vehicles slower than this (and not stopped) are reported as slow, in km/h.
pub const SLOW_BELOW_KMH: f64 = 20.0;

/// Average speed assumed for ETA purposes when a vehicle reports no speed, in km/h.
pub const FALLBACK_SPEED_KMH: f64 = 30.0;

/// Arrival times below this are imminent, in minutes.
pub const IMMINENT_BELOW_MIN: f64 = 1.0;

/// Upper bound (inclusive) of the near band, in minutes.
pub const NEAR_UP_TO_MIN: f64 = 5.0;

/// Upper bound (inclusive) of the approaching band, in minutes.
pub const APPROACHING_UP_TO_MIN: f64 = 15.0;

/// The movement status of a vehicle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleStatus {
    Stopped,
    Slow,
    Moving,
}

impl VehicleStatus {
    /// Classifies a speed in km/h.
    pub fn from_speed(speed_kmh: f64) -> Self {
        if speed_kmh.is_nan() || speed_kmh < STOPPED_BELOW_KMH {
            Self::Stopped
        } else if speed_kmh < SLOW_BELOW_KMH {
            Self::Slow
        } else {
            Self::Moving
        }
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Stopped => "STOPPED",
            Self::Slow => "SLOW",
            Self::Moving => "MOVING",
        })
    }
}

/// A coarse bucket for how soon a vehicle reaches the observer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EtaBand {
    Imminent,
    Near,
    Approaching,
    Far,
}

impl EtaBand {
    /// Classifies an arrival time in minutes. Unknown times are far.
    pub fn from_minutes(minutes: f64) -> Self {
        if minutes.is_nan() {
            Self::Far
        } else if minutes < IMMINENT_BELOW_MIN {
            Self::Imminent
        } else if minutes <= NEAR_UP_TO_MIN {
            Self::Near
        } else if minutes <= APPROACHING_UP_TO_MIN {
            Self::Approaching
        } else {
            Self::Far
        }
    }
}

impl fmt::Display for EtaBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Imminent => "IMMINENT",
            Self::Near => "NEAR",
            Self::Approaching => "APPROACHING",
            Self::Far => "FAR",
        })
    }
}

/// Computes route progress as a percentage in `[0, 100]`.
///
/// Zero-length routes are always complete; undefined ratios report no progress.
pub fn progress_percent(distance_traveled_km: f64, total_distance_km: f64) -> f64 {
    if total_distance_km == 0.0 {
        return 100.0;
    }
    let percent = distance_traveled_km / total_distance_km * 100.0;
    if percent.is_finite() {
        percent.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Computes the time in minutes to cover `distance_km` at `speed_kmh`.
pub fn eta_minutes(distance_km: f64, speed_kmh: f64) -> f64 {
    let speed = if speed_kmh > 0.0 {
        speed_kmh
    } else {
        FALLBACK_SPEED_KMH
    };
    distance_km / speed * 60.0
}
