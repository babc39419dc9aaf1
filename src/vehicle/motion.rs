use super::Vehicle;
use crate::config::SimulationConfig;
use crate::geo::{Coordinate, Vector2d, KM_PER_DEGREE};
use crate::TrackingError;
use cgmath::prelude::*;
use rand::Rng;
use rand_distr::{Distribution, Uniform};

/// A vehicle closer than this to the end of its route has arrived, in degrees.
pub const ARRIVAL_EPSILON_DEG: f64 = 0.001;

/// The movement rules applied to every vehicle on each tick.
#[derive(Clone, Debug)]
pub struct MotionModel {
    /// The planar step taken towards the end of the route, in degrees.
    step_deg: f64,
    /// Per-axis positional noise, absent when the configured amplitude is zero.
    jitter: Option<Uniform<f64>>,
    /// The band speeds are sampled from.
    speed: Uniform<f64>,
}

/// The outcome of advancing a vehicle by one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Advance {
    /// The vehicle moved forward by the given distance in km.
    Moved(f64),
    /// The vehicle had arrived and was returned to the start of its route.
    Looped,
}

impl MotionModel {
    /// Creates the motion model for a validated configuration.
    pub fn new(config: &SimulationConfig) -> Result<Self, TrackingError> {
        config.validate()?;
        let jitter = (config.jitter_deg > 0.0)
            .then(|| Uniform::new_inclusive(-config.jitter_deg, config.jitter_deg));
        let band = config.speed_band_kmh;
        Ok(Self {
            step_deg: config.step_deg,
            jitter,
            speed: Uniform::new_inclusive(band.min, band.max),
        })
    }

    /// Advances the vehicle by one tick and resamples its speed.
    ///
    /// Movement is planar: the vehicle steps along the raw coordinate delta
    /// towards the end of its route, never overshooting it, and then wanders
    /// by the jitter amplitude on each axis.
    pub fn advance<R: Rng + ?Sized>(&self, vehicle: &mut Vehicle, rng: &mut R) -> Advance {
        let delta = vehicle.heading_vector();
        let remaining = delta.magnitude();

        let outcome = if remaining.is_nan() || remaining < ARRIVAL_EPSILON_DEG {
            vehicle.position = vehicle.route.start();
            vehicle.distance_traveled_km = 0.0;
            Advance::Looped
        } else {
            let step = f64::min(self.step_deg, remaining);
            let mut next = vehicle.position.to_vector() + delta * (step / remaining);
            if let Some(jitter) = &self.jitter {
                next += Vector2d::new(jitter.sample(rng), jitter.sample(rng));
            }
            vehicle.position = Coordinate::from_vector(next);

            let km = step * KM_PER_DEGREE;
            vehicle.distance_traveled_km += km;
            Advance::Moved(km)
        };

        vehicle.speed_kmh = self.speed.sample(rng);
        outcome
    }
}
