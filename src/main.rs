//! # Prayer Clock Application Entry Point
//!
//! This binary wires the library to a terminal display: it resolves the
//! location, shows today's prayer times on the 24-hour clock, keeps the
//! hands ticking once a second, and (with `--simulate-year`) plays a full
//! year of prayer schedules forward and back.


use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Local;
use log::{info, warn};
use tokio::sync::Mutex;
use tokio::time::interval;

use prayer_clock_lib::cache::{FileStore, PrayerCache};
use prayer_clock_lib::config::Config;
use prayer_clock_lib::display::{DisplaySink, TerminalDisplay};
use prayer_clock_lib::live;
use prayer_clock_lib::location::{self, FixedLocation};
use prayer_clock_lib::provider::{AladhanClient, GeocodingProvider, NominatimClient};
use prayer_clock_lib::simulation::{self, YearSimulation};

fn main() {
    env_logger::init();

    let simulate_year = env::args().any(|arg| arg == "--simulate-year");
    let config = Config::load();

    // Every runtime failure degrades inside run(); only failing to start
    // at all reaches this guard.
    if let Err(e) = start_runtime(config, simulate_year) {
        eprintln!("Fatal: the prayer clock could not start: {e:#}");
        std::process::exit(1);
    }
}

fn start_runtime(config: Config, simulate_year: bool) -> anyhow::Result<()> {
    let rt = tokio::runtime::Runtime::new().context("creating async runtime")?;
    rt.block_on(run(config, simulate_year))
}

async fn run(config: Config, simulate_year: bool) -> anyhow::Result<()> {
    let display = Arc::new(TerminalDisplay::new());
    display.set_button(simulation::START_LABEL, true);

    let cache = Arc::new(Mutex::new(PrayerCache::new(FileStore::open(
        &config.cache.path,
    ))));

    let resolved = location::resolve(&FixedLocation(config.fixed_coordinates())).await;
    if let Some(notice) = &resolved.notice {
        display.set_status(notice);
    }

    // A fresh position is remembered for later runs; without one, the last
    // geolocated position beats the built-in default.
    let (coords, at_default) = if resolved.used_default {
        match cache.lock().await.load_coords() {
            Some(saved) => (saved, false),
            None => (resolved.coords, true),
        }
    } else {
        if let Err(e) = cache.lock().await.save_coords(resolved.coords) {
            warn!("could not persist coordinates: {e}");
        }
        (resolved.coords, false)
    };

    let provider = Arc::new(
        AladhanClient::new(
            config.provider.base_url.clone(),
            config.provider.method,
            config.http_timeout(),
        )
        .context("building prayer times client")?,
    );

    let label = match &config.location.label {
        Some(label) => label.clone(),
        None if at_default => location::DEFAULT_LOCATION_LABEL.to_string(),
        None => {
            let geocoder =
                NominatimClient::new(config.http_timeout()).context("building geocoding client")?;
            geocoder
                .reverse(coords)
                .await
                .unwrap_or_else(|| coords.label())
        }
    };
    info!("location: {label} ({}, {})", coords.lat, coords.lon);

    live::show_today(&provider, &cache, &display, coords, &label, true).await;

    let simulation = YearSimulation::new(
        Arc::clone(&provider),
        Arc::clone(&display),
        Arc::clone(&cache),
        coords,
        label,
        config.simulation_options(),
    );

    if simulate_year {
        simulation.start().await;
    }

    let mut ticker = interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                live::live_tick(&display, Local::now(), simulation.is_active().await);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                if simulation.is_active().await {
                    simulation.stop().await;
                }
                break;
            }
        }
    }
    Ok(())
}
