use crate::geo::Coordinate;
use crate::scheduler::TickSource;
use crate::simulation::Simulation;
use crate::snapshot::{SnapshotBoard, TrackingSnapshot};
use crate::TrackingError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A simulation bound to its random source, publishing each tick to a [SnapshotBoard].
pub struct LiveSimulation<R = StdRng> {
    sim: Simulation,
    rng: R,
    board: SnapshotBoard,
}

impl LiveSimulation<StdRng> {
    /// Drives the simulation with a generator seeded from system entropy.
    pub fn from_entropy(sim: Simulation) -> Self {
        Self::new(sim, StdRng::from_entropy())
    }
}

impl<R: Rng> LiveSimulation<R> {
    /// Drives the simulation with the given random source.
    pub fn new(sim: Simulation, rng: R) -> Self {
        let board = SnapshotBoard::new();
        board.publish(&sim.snapshots(None));
        Self { sim, rng, board }
    }

    /// A handle to the board the simulation publishes to.
    pub fn board(&self) -> SnapshotBoard {
        self.board.clone()
    }

    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }
}

impl<R: Rng + Send> TickSource for LiveSimulation<R> {
    fn tick(&mut self, observer: Option<Coordinate>) -> Result<Vec<TrackingSnapshot>, TrackingError> {
        let batch = self.sim.tick(observer, &mut self.rng);
        self.board.publish(&batch);
        Ok(batch)
    }
}
