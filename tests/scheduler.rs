//! Tests that drive a simulation from the tracking scheduler.

use fleet_sim::{
    Coordinate, FleetConfig, LiveSimulation, TickSource, TrackingError, TrackingScheduler,
    TrackingSnapshot,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

fn live() -> LiveSimulation<StdRng> {
    let sim = FleetConfig::default().build_simulation().unwrap();
    LiveSimulation::new(sim, StdRng::seed_from_u64(2000))
}

fn counting_sink(count: &Arc<AtomicUsize>) -> impl FnMut(&[TrackingSnapshot]) + Send + 'static {
    let count = count.clone();
    move |_| {
        count.fetch_add(1, Ordering::SeqCst);
    }
}

/// A source that counts its ticks, optionally taking a while over each.
struct Counting {
    ticks: Arc<AtomicUsize>,
    delay: Duration,
    entered: Option<mpsc::Sender<()>>,
}

impl TickSource for Counting {
    fn tick(&mut self, _: Option<Coordinate>) -> Result<Vec<TrackingSnapshot>, TrackingError> {
        self.ticks.fetch_add(1, Ordering::SeqCst);
        if let Some(entered) = &self.entered {
            let _ = entered.send(());
        }
        thread::sleep(self.delay);
        Ok(vec![])
    }
}

/// Test that ticks fire until the scheduler is stopped, and never after.
#[test]
fn stop_halts_ticks() {
    let count = Arc::new(AtomicUsize::new(0));
    let scheduler = TrackingScheduler::new(Duration::from_millis(10));
    scheduler.start(live(), || None, counting_sink(&count)).unwrap();
    assert!(scheduler.is_running());

    thread::sleep(Duration::from_millis(100));
    scheduler.stop();
    let fired = count.load(Ordering::SeqCst);
    assert!(fired >= 2, "only {} ticks fired", fired);
    assert!(!scheduler.is_running());

    thread::sleep(Duration::from_millis(50));
    assert_eq!(count.load(Ordering::SeqCst), fired);

    // Stopping again does nothing
    scheduler.stop();
    assert_eq!(count.load(Ordering::SeqCst), fired);
}

/// Test that dropping a running scheduler stops its ticks.
#[test]
fn drop_stops_ticks() {
    let count = Arc::new(AtomicUsize::new(0));
    let scheduler = TrackingScheduler::new(Duration::from_millis(10));
    scheduler.start(live(), || None, counting_sink(&count)).unwrap();
    thread::sleep(Duration::from_millis(50));

    drop(scheduler);
    let fired = count.load(Ordering::SeqCst);
    assert!(fired >= 1);
    thread::sleep(Duration::from_millis(50));
    assert_eq!(count.load(Ordering::SeqCst), fired);
}

/// Test that the first tick fires without waiting a full period.
#[test]
fn first_tick_is_immediate() {
    let (tx, rx) = mpsc::channel();
    let scheduler = TrackingScheduler::new(Duration::from_secs(60));
    let started = Instant::now();
    scheduler
        .start(live(), || None, move |batch: &[TrackingSnapshot]| {
            let _ = tx.send(batch.len());
        })
        .unwrap();

    assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 3);
    assert!(started.elapsed() < Duration::from_secs(5));
    scheduler.stop();
}

/// Test that stopping during a tick lets it finish but prevents any further tick.
#[test]
fn stop_during_tick() {
    let ticks = Arc::new(AtomicUsize::new(0));
    let published = Arc::new(AtomicUsize::new(0));
    let (entered, entering) = mpsc::channel();
    let source = Counting {
        ticks: ticks.clone(),
        delay: Duration::from_millis(100),
        entered: Some(entered),
    };
    let scheduler = TrackingScheduler::new(Duration::from_millis(5));
    scheduler.start(source, || None, counting_sink(&published)).unwrap();

    entering.recv_timeout(Duration::from_secs(5)).unwrap();
    scheduler.stop();
    let started = ticks.load(Ordering::SeqCst);
    assert_eq!(published.load(Ordering::SeqCst), started);

    thread::sleep(Duration::from_millis(150));
    assert_eq!(ticks.load(Ordering::SeqCst), started);
    scheduler.stop();
}

/// Test that slow ticks never overlap.
#[test]
fn ticks_do_not_overlap() {
    struct Exclusive {
        active: Arc<AtomicUsize>,
        overlaps: Arc<AtomicUsize>,
    }

    impl TickSource for Exclusive {
        fn tick(&mut self, _: Option<Coordinate>) -> Result<Vec<TrackingSnapshot>, TrackingError> {
            if self.active.fetch_add(1, Ordering::SeqCst) != 0 {
                self.overlaps.fetch_add(1, Ordering::SeqCst);
            }
            thread::sleep(Duration::from_millis(15));
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(vec![])
        }
    }

    let overlaps = Arc::new(AtomicUsize::new(0));
    let source = Exclusive {
        active: Arc::new(AtomicUsize::new(0)),
        overlaps: overlaps.clone(),
    };
    let scheduler = TrackingScheduler::new(Duration::from_millis(2));
    scheduler.start(source, || None, |_: &[TrackingSnapshot]| {}).unwrap();
    thread::sleep(Duration::from_millis(120));
    scheduler.stop();
    assert_eq!(overlaps.load(Ordering::SeqCst), 0);
}

/// Test that failing and panicking ticks do not end the timeline.
#[test]
fn failures_do_not_stop_the_timeline() {
    struct Flaky(usize);

    impl TickSource for Flaky {
        fn tick(&mut self, _: Option<Coordinate>) -> Result<Vec<TrackingSnapshot>, TrackingError> {
            self.0 += 1;
            match self.0 {
                1 => Err(TrackingError::TickFailed("sensor offline".into())),
                2 => panic!("tick exploded"),
                _ => Ok(vec![]),
            }
        }
    }

    let count = Arc::new(AtomicUsize::new(0));
    let scheduler = TrackingScheduler::new(Duration::from_millis(5));
    scheduler.start(Flaky(0), || None, counting_sink(&count)).unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while count.load(Ordering::SeqCst) < 2 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    scheduler.stop();
    assert!(count.load(Ordering::SeqCst) >= 2);
}

/// Test that a panicking sink does not end the timeline either.
#[test]
fn panicking_sink_is_isolated() {
    let count = Arc::new(AtomicUsize::new(0));
    let seen = count.clone();
    let scheduler = TrackingScheduler::new(Duration::from_millis(5));
    scheduler
        .start(live(), || None, move |_: &[TrackingSnapshot]| {
            if seen.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("map view went away");
            }
        })
        .unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while count.load(Ordering::SeqCst) < 3 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    scheduler.stop();
    assert!(count.load(Ordering::SeqCst) >= 3);
}

/// Test that the scheduler refuses to start twice, but may be restarted once stopped.
#[test]
fn start_while_running() {
    let scheduler = TrackingScheduler::new(Duration::from_millis(10));
    scheduler.start(live(), || None, |_: &[TrackingSnapshot]| {}).unwrap();
    let again = scheduler.start(live(), || None, |_: &[TrackingSnapshot]| {});
    assert!(matches!(again, Err(TrackingError::AlreadyRunning)));

    scheduler.stop();
    scheduler.start(live(), || None, |_: &[TrackingSnapshot]| {}).unwrap();
    assert!(scheduler.is_running());
    scheduler.stop();
}

/// Test that the sink may stop the scheduler that is calling it.
#[test]
fn stop_from_sink() {
    let count = Arc::new(AtomicUsize::new(0));
    let scheduler = Arc::new(TrackingScheduler::new(Duration::from_millis(5)));
    let handle = scheduler.clone();
    let seen = count.clone();
    scheduler
        .start(live(), || None, move |_: &[TrackingSnapshot]| {
            if seen.fetch_add(1, Ordering::SeqCst) + 1 == 3 {
                handle.stop();
            }
        })
        .unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while count.load(Ordering::SeqCst) < 3 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    thread::sleep(Duration::from_millis(50));
    assert_eq!(count.load(Ordering::SeqCst), 3);
    assert!(!scheduler.is_running());
}

/// Test that readers racing the scheduler always see a whole batch from one frame.
#[test]
fn concurrent_reads_are_never_torn() {
    let live = live();
    let board = live.board();
    let scheduler = TrackingScheduler::new(Duration::from_millis(1));
    let observer = Coordinate::new(6.90, 79.86).unwrap();
    scheduler
        .start(live, move || Some(observer), |_: &[TrackingSnapshot]| {})
        .unwrap();

    let reader = thread::spawn(move || {
        let mut frames = vec![];
        let deadline = Instant::now() + Duration::from_millis(150);
        while Instant::now() < deadline {
            let batch = board.latest();
            assert_eq!(batch.len(), 3);
            let frame = batch[0].frame;
            assert!(batch.iter().all(|snapshot| snapshot.frame == frame));
            frames.push(frame);
        }
        frames
    });

    let frames = reader.join().unwrap();
    scheduler.stop();
    assert!(frames.windows(2).all(|w| w[0] <= w[1]));
    assert!(frames.last() > frames.first());
}

/// Test that a simulation shared behind a mutex can be queried while it is ticking.
#[test]
fn shared_simulation() {
    let shared = Arc::new(Mutex::new(live()));
    let scheduler = TrackingScheduler::new(Duration::from_millis(2));
    scheduler
        .start(shared.clone(), || None, |_: &[TrackingSnapshot]| {})
        .unwrap();

    thread::sleep(Duration::from_millis(40));
    {
        let live = shared.lock().unwrap();
        let sim = live.simulation();
        let snapshots = sim.snapshots(None);
        assert_eq!(snapshots.len(), 3);
        assert!(snapshots.iter().all(|s| s.frame == sim.frame()));
    }
    scheduler.stop();
    assert!(shared.lock().unwrap().simulation().frame() > 0);
}
