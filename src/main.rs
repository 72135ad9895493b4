//! Headless runner
//!
//! Usage: `chaos-trails [config.json] [frames]`
//!
//! Runs the configured scheme for a number of frames and prints the final
//! frame stats as JSON.

use std::process::ExitCode;
use std::time::Instant;

use chaos_trails::SystemConfig;
use chaos_trails::sim::ParticleSystem;

const DEFAULT_FRAMES: u64 = 600;

fn main() -> ExitCode {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => match SystemConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("{e}");
                return ExitCode::FAILURE;
            }
        },
        None => {
            log::info!("No config given, using defaults");
            SystemConfig::default()
        }
    };
    let frames = match args.next().map(|s| s.parse::<u64>()) {
        Some(Ok(frames)) => frames,
        Some(Err(e)) => {
            log::error!("Invalid frame count: {e}");
            return ExitCode::FAILURE;
        }
        None => DEFAULT_FRAMES,
    };

    log::info!(
        "Chaos Trails starting: map {}, scheme {}, colors {}, {} frames",
        config.map.name(),
        config.scheme.name(),
        config.color_scheme.as_str(),
        frames
    );

    let mut system = ParticleSystem::from_config(config);
    let start = Instant::now();
    for _ in 0..frames {
        system.advance(start.elapsed().as_secs_f64());
        if log::log_enabled!(log::Level::Trace) {
            log::trace!("{:?}", system.stats());
        }
    }

    let elapsed = start.elapsed();
    let stats = system.stats();
    log::info!(
        "Ran {} frames in {:.2?} ({:.2} ms/frame), speed bound {:.4}",
        frames,
        elapsed,
        elapsed.as_secs_f64() * 1000.0 / frames.max(1) as f64,
        stats.speed_upper_bound
    );

    match serde_json::to_string_pretty(&stats) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            log::error!("Failed to serialize stats: {e}");
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}
