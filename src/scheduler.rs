//! Drives a simulation on a fixed period from a dedicated thread.

use crate::geo::Coordinate;
use crate::snapshot::TrackingSnapshot;
use crate::TrackingError;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};

/// Something that can be advanced by one tick.
pub trait TickSource: Send {
    /// Advances by one tick and returns the resulting snapshots.
    fn tick(&mut self, observer: Option<Coordinate>) -> Result<Vec<TrackingSnapshot>, TrackingError>;
}

impl<S: TickSource> TickSource for Arc<Mutex<S>> {
    fn tick(&mut self, observer: Option<Coordinate>) -> Result<Vec<TrackingSnapshot>, TrackingError> {
        self.lock().unwrap_or_else(PoisonError::into_inner).tick(observer)
    }
}

/// Supplies the observer's current location, if known, before each tick.
pub trait ObserverProvider: Send {
    fn observe(&mut self) -> Option<Coordinate>;
}

impl<F: FnMut() -> Option<Coordinate> + Send> ObserverProvider for F {
    fn observe(&mut self) -> Option<Coordinate> {
        self()
    }
}

/// Receives the snapshots of each tick, e.g. to update a map.
pub trait SnapshotSink: Send {
    fn publish(&mut self, batch: &[TrackingSnapshot]);
}

impl<F: FnMut(&[TrackingSnapshot]) + Send> SnapshotSink for F {
    fn publish(&mut self, batch: &[TrackingSnapshot]) {
        self(batch)
    }
}

/// Fires ticks at a fixed interval until stopped.
///
/// Ticks run one at a time on a single worker thread. A tick that overruns
/// its period causes the missed periods to be skipped rather than queued.
pub struct TrackingScheduler {
    /// The period between ticks.
    interval: Duration,
    /// The running worker, if any.
    worker: Mutex<Option<Worker>>,
}

struct Worker {
    /// Dropping or sending on this stops the worker.
    cancel: Sender<()>,
    handle: JoinHandle<()>,
}

impl Default for TrackingScheduler {
    fn default() -> Self {
        Self::new(Duration::from_millis(2000))
    }
}

impl TrackingScheduler {
    /// Creates a stopped scheduler.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            worker: Mutex::new(None),
        }
    }

    /// The period between ticks.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Starts firing ticks. The first tick fires immediately.
    pub fn start(
        &self,
        source: impl TickSource + 'static,
        observer: impl ObserverProvider + 'static,
        sink: impl SnapshotSink + 'static,
    ) -> Result<(), TrackingError> {
        if self.interval.is_zero() {
            return Err(TrackingError::InvalidConfig(
                "tick interval must be positive".into(),
            ));
        }

        let mut worker = self.lock_worker();
        if worker.as_ref().map_or(false, |w| !w.handle.is_finished()) {
            return Err(TrackingError::AlreadyRunning);
        }

        let (cancel, cancelled) = mpsc::channel();
        let interval = self.interval;
        let mut timeline = Timeline {
            source,
            observer,
            sink,
            frames: 0,
        };
        let handle = thread::Builder::new()
            .name("tracking-scheduler".into())
            .spawn(move || {
                let mut next = Instant::now();
                loop {
                    let wait = next.saturating_duration_since(Instant::now());
                    match cancelled.recv_timeout(wait) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                    timeline.run_tick();
                    next = skip_missed(next + interval, interval, Instant::now());
                }
                log::info!("Tracking stopped after {} ticks", timeline.frames);
            })?;

        log::info!("Tracking started, ticking every {:?}", interval);
        *worker = Some(Worker { cancel, handle });
        Ok(())
    }

    /// Stops firing ticks.
    ///
    /// A tick already in progress is allowed to finish; once this returns no
    /// further tick will start. Safe to call repeatedly and from any thread,
    /// including from within the sink.
    pub fn stop(&self) {
        let Some(worker) = self.lock_worker().take() else {
            return;
        };
        // The worker may already have exited, in which case nobody is listening
        let _ = worker.cancel.send(());
        if worker.handle.thread().id() == current_thread() {
            return;
        }
        if worker.handle.join().is_err() {
            log::error!("Tracking worker terminated abnormally");
        }
    }

    /// Whether ticks are currently being fired.
    pub fn is_running(&self) -> bool {
        self.lock_worker()
            .as_ref()
            .map_or(false, |w| !w.handle.is_finished())
    }

    fn lock_worker(&self) -> std::sync::MutexGuard<'_, Option<Worker>> {
        self.worker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for TrackingScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn current_thread() -> ThreadId {
    thread::current().id()
}

/// Moves the `next` deadline past `now`, skipping whole periods that were missed.
fn skip_missed(next: Instant, interval: Duration, now: Instant) -> Instant {
    if next > now {
        return next;
    }
    let behind = now - next;
    let missed = (behind.as_nanos() / interval.as_nanos()) as u32 + 1;
    log::warn!("Tick overran its period, skipping {} tick(s)", missed);
    next + interval * missed
}

/// The collaborators driven on each tick.
struct Timeline<S, O, K> {
    source: S,
    observer: O,
    sink: K,
    /// The number of ticks fired.
    frames: usize,
}

impl<S: TickSource, O: ObserverProvider, K: SnapshotSink> Timeline<S, O, K> {
    /// Runs one tick. Failures and panics are logged and never end the timeline.
    fn run_tick(&mut self) {
        self.frames += 1;
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let observer = self.observer.observe();
            let batch = self.source.tick(observer)?;
            self.sink.publish(&batch);
            Ok::<_, TrackingError>(batch.len())
        }));
        match result {
            Ok(Ok(count)) => log::debug!("Tick {} published {} snapshots", self.frames, count),
            Ok(Err(err)) => log::warn!("Tick {} failed: {}", self.frames, err),
            Err(_) => log::error!("Tick {} panicked, continuing with the next tick", self.frames),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn skips_whole_missed_periods() {
        let interval = Duration::from_millis(100);
        let start = Instant::now();
        assert_eq!(skip_missed(start + interval, interval, start), start + interval);

        let now = start + Duration::from_millis(350);
        let next = skip_missed(start + interval, interval, now);
        assert_eq!(next, start + Duration::from_millis(400));
        assert!(next > now);

        let now = start + Duration::from_millis(100);
        assert_eq!(skip_missed(start + interval, interval, now), start + Duration::from_millis(200));
    }

    struct Idle;

    impl TickSource for Idle {
        fn tick(&mut self, _: Option<Coordinate>) -> Result<Vec<TrackingSnapshot>, TrackingError> {
            Ok(vec![])
        }
    }

    #[test]
    fn zero_interval_is_rejected() {
        let scheduler = TrackingScheduler::new(Duration::ZERO);
        let result = scheduler.start(Idle, || None, |_: &[TrackingSnapshot]| {});
        assert!(matches!(result, Err(TrackingError::InvalidConfig(_))));
    }
}
