//! Simulation parameters and fleet definitions, loadable from JSON.

use crate::geo::Coordinate;
use crate::route::Route;
use crate::simulation::Simulation;
use crate::util::Interval;
use crate::vehicle::{VehicleAttributes, ARRIVAL_EPSILON_DEG};
use crate::TrackingError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// The tunable parameters of the simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// The planar distance each vehicle moves per tick, in degrees.
    pub step_deg: f64,
    /// The maximum positional noise added on each axis per tick, in degrees.
    pub jitter_deg: f64,
    /// The band vehicle speeds are sampled from, in km/h.
    pub speed_band_kmh: Interval<f64>,
    /// The period between ticks in ms.
    pub tick_interval_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            step_deg: 0.0005,
            jitter_deg: 0.0002,
            speed_band_kmh: Interval::new(20.0, 55.0),
            tick_interval_ms: 2000,
        }
    }
}

impl SimulationConfig {
    /// Checks that the parameters let every vehicle reach the end of its route.
    ///
    /// The jitter must stay inside the arrival radius and below the step,
    /// otherwise vehicles could wander around the end forever.
    pub fn validate(&self) -> Result<(), TrackingError> {
        let invalid = |msg: String| Err(TrackingError::InvalidConfig(msg));
        let jitter_reach = self.jitter_deg * std::f64::consts::SQRT_2;

        if !self.step_deg.is_finite() || self.step_deg <= 0.0 {
            return invalid(format!("step_deg must be positive, got {}", self.step_deg));
        }
        if !self.jitter_deg.is_finite() || self.jitter_deg < 0.0 {
            return invalid(format!(
                "jitter_deg must not be negative, got {}",
                self.jitter_deg
            ));
        }
        if jitter_reach >= ARRIVAL_EPSILON_DEG || jitter_reach >= self.step_deg {
            return invalid(format!(
                "jitter_deg {} is too large for step_deg {} and arrival radius {}",
                self.jitter_deg, self.step_deg, ARRIVAL_EPSILON_DEG
            ));
        }
        let band = self.speed_band_kmh;
        if !band.is_well_formed() || band.min <= 0.0 {
            return invalid(format!("speed_band_kmh must be positive, got {:?}", band));
        }
        if self.tick_interval_ms == 0 {
            return invalid("tick_interval_ms must be positive".into());
        }
        Ok(())
    }

    /// The period between ticks.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// The definition of a route in a fleet file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteConfig {
    pub start: Coordinate,
    pub end: Coordinate,
    pub start_name: String,
    pub end_name: String,
    /// The nominal length in km. The great-circle distance is used when absent.
    #[serde(default)]
    pub total_distance_km: Option<f64>,
}

impl RouteConfig {
    /// Builds the route.
    pub fn build(&self) -> Result<Route, TrackingError> {
        match self.total_distance_km {
            Some(km) => Route::new(
                self.start,
                self.end,
                &self.start_name,
                &self.end_name,
                km,
            ),
            None => Ok(Route::straight(
                self.start,
                self.end,
                &self.start_name,
                &self.end_name,
            )),
        }
    }
}

/// The definition of a vehicle in a fleet file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VehicleConfig {
    /// The human readable bus ID.
    pub code: String,
    /// The route number.
    pub label: String,
    pub route: RouteConfig,
}

/// A fleet of vehicles together with the simulation parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FleetConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// A fixed observer for proximity and ETA metrics.
    #[serde(default)]
    pub observer: Option<Coordinate>,
    pub vehicles: Vec<VehicleConfig>,
}

/// The built-in fleet: three Colombo bus routes.
static DEFAULT_FLEET: Lazy<Vec<VehicleConfig>> = Lazy::new(|| {
    let route = |start: (f64, f64), end: (f64, f64), names: (&str, &str), km: f64| RouteConfig {
        start: Coordinate::new_unchecked(start.0, start.1),
        end: Coordinate::new_unchecked(end.0, end.1),
        start_name: names.0.into(),
        end_name: names.1.into(),
        total_distance_km: Some(km),
    };
    vec![
        VehicleConfig {
            code: "001".into(),
            label: "138".into(),
            route: route(
                (6.9271, 79.8612),
                (6.8406, 79.8636),
                ("Colombo Fort", "Mount Lavinia"),
                15.2,
            ),
        },
        VehicleConfig {
            code: "002".into(),
            label: "100".into(),
            route: route(
                (6.9344, 79.8428),
                (6.8480, 79.9265),
                ("Pettah", "Maharagama"),
                16.8,
            ),
        },
        VehicleConfig {
            code: "003".into(),
            label: "177".into(),
            route: route(
                (6.9114, 79.8489),
                (6.9333, 79.9833),
                ("Kollupitiya", "Kaduwela"),
                17.5,
            ),
        },
    ]
});

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            observer: None,
            vehicles: DEFAULT_FLEET.clone(),
        }
    }
}

impl FleetConfig {
    /// Parses and validates a fleet definition.
    pub fn from_json(json: &str) -> Result<Self, TrackingError> {
        let config: Self = serde_json::from_str(json)?;
        config.simulation.validate()?;
        Ok(config)
    }

    /// Reads a fleet definition from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TrackingError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Creates a simulation populated with the configured vehicles.
    pub fn build_simulation(&self) -> Result<Simulation, TrackingError> {
        let mut sim = Simulation::new(&self.simulation)?;
        for vehicle in &self.vehicles {
            let attributes = VehicleAttributes {
                code: vehicle.code.clone(),
                label: vehicle.label.clone(),
            };
            sim.add_vehicle(attributes, vehicle.route.build()?);
        }
        Ok(sim)
    }
}
