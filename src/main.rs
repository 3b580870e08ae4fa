//! # Deskclock Application Entry Point
//!
//! This binary crate runs the driver loop: sample the clock and network,
//! refresh the weather cache when due, tick the scheduler, and hand the
//! resulting directive to the OLED (or the ASCII renderer in development
//! mode). The loop is single-threaded and cooperative: one tick per
//! cadence interval, with the weather fetch awaited inline.

// Test modules
#[cfg(test)]
mod tests;

use anyhow::Result;
use deskclock_lib::config::Config;
use deskclock_lib::scheduler::{Scheduler, TickInput};
use deskclock_lib::weather::WeatherStore;
use deskclock_lib::{renderer, ClockReading};
use log::{info, warn};
use std::env;
use std::time::{Duration, Instant};

/// Options parsed from the command line.
///
/// - `--stdout`: render to the terminal instead of hardware
/// - `--once`: run a single tick and exit (smoke tests, scripting)
/// - `--config <path>`: explicit config file location
/// - `--write-config`: write the effective config as a starter file and exit
struct Options {
    development_mode: bool,
    run_once: bool,
    write_config: bool,
    config_path: Option<String>,
}

fn parse_args() -> Options {
    let mut options = Options {
        development_mode: false,
        run_once: false,
        write_config: false,
        config_path: None,
    };
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--stdout" => options.development_mode = true,
            "--once" => options.run_once = true,
            "--write-config" => options.write_config = true,
            "--config" => options.config_path = args.next(),
            other => warn!("ignoring unknown argument: {}", other),
        }
    }
    options
}

/// True while the host has a routable local address. Good enough as a
/// "WiFi up" probe on a headless Pi; the scheduler treats it as a flag,
/// not a guarantee that the weather API is reachable.
fn wifi_connected() -> bool {
    local_ip_address::local_ip().is_ok()
}

/// Main application entry point.
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = parse_args();
    let config = match &options.config_path {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    };

    if options.write_config {
        let path = options
            .config_path
            .as_deref()
            .unwrap_or("deskclock-config.toml");
        config.save_to_path(path)?;
        return Ok(());
    }

    info!(
        "deskclock starting: {} screens in rotation, night window {}..{}, tick {} ms",
        config.screens.order.len(),
        config.night.start_hour,
        config.night.end_hour,
        config.display.tick_ms
    );
    match local_ip_address::local_ip() {
        Ok(ip) => info!("network up, local address {}", ip),
        Err(_) => warn!("network down, weather and quotes degraded until it returns"),
    }

    // Create Tokio runtime for async operations (weather fetches)
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(config, options))
}

async fn run(config: Config, options: Options) -> Result<()> {
    let cadence = Duration::from_millis(config.display.tick_ms.max(50));
    let mut weather = WeatherStore::new(config.weather.clone())?;
    let mut scheduler = Scheduler::new(config.clone());
    let mut rng = rand::rng();

    // Monotonic base for every elapsed-time comparison; wall clock is only
    // read for the hour and the display text.
    let started = Instant::now();

    #[cfg(feature = "hardware")]
    let mut oled = if options.development_mode {
        None
    } else {
        Some(deskclock_lib::oled::Oled::open(&config.display)?)
    };

    if !options.development_mode && !cfg!(feature = "hardware") {
        warn!("built without the 'hardware' feature; rendering to stdout");
    }

    loop {
        let now_ms = started.elapsed().as_millis() as u64;
        let clock = ClockReading::now();
        let wifi = wifi_connected();

        if weather.due(now_ms, wifi) {
            weather.refresh(now_ms).await;
        }

        let input = TickInput {
            now_ms,
            hour: clock.hour,
            synced: clock.synced,
            wifi_connected: wifi,
        };
        let directive = scheduler.tick(&input, weather.snapshot(), &mut rng);

        if options.development_mode {
            renderer::draw_ascii(&directive, &clock);
        } else {
            #[cfg(feature = "hardware")]
            if let Some(oled) = oled.as_mut() {
                oled.render(&directive, &clock)?;
            }
            #[cfg(not(feature = "hardware"))]
            renderer::draw_ascii(&directive, &clock);
        }

        if options.run_once {
            return Ok(());
        }
        tokio::time::sleep(cadence).await;
    }
}
