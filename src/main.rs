use std::time::Duration;

use fleet_sim::{FleetConfig, LiveSimulation, TrackingScheduler, TrackingSnapshot};

/// How long to run the demo for when not otherwise specified.
const DEFAULT_RUN_SECS: u64 = 10;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut json = false;
    let mut config_path = None;
    let mut run_secs = DEFAULT_RUN_SECS;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--json" => json = true,
            _ => match arg.strip_prefix("--secs=") {
                Some(secs) => run_secs = secs.parse()?,
                None => config_path = Some(arg),
            },
        }
    }

    let config = match config_path {
        Some(path) => FleetConfig::load(path)?,
        None => FleetConfig::default(),
    };
    let sim = config.build_simulation()?;
    let live = LiveSimulation::from_entropy(sim);
    let observer = config.observer;

    println!("Simulating {} vehicles for {}s...", config.vehicles.len(), run_secs);
    let scheduler = TrackingScheduler::new(config.simulation.tick_interval());
    scheduler.start(live, move || observer, move |batch: &[TrackingSnapshot]| {
        if json {
            match serde_json::to_string(batch) {
                Ok(line) => println!("{}", line),
                Err(err) => eprintln!("Failed to encode snapshots: {}", err),
            }
        } else {
            for snapshot in batch {
                println!("{}", snapshot);
            }
        }
    })?;

    std::thread::sleep(Duration::from_secs(run_secs));
    scheduler.stop();
    Ok(())
}
