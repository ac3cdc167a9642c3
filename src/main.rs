//! `geolocate`: replay a recorded track through the geolocation API
//!
//! Usage: `geolocate <track.json> [config.json]`
//!
//! The track is a JSON array of fixes; `demos/` holds a sample track and
//! configuration. Logs at `info` by default; set
//! `RUST_LOG=debug` to follow the subscription lifecycle.

use anyhow::{anyhow, Context};
use geolocation::{AcquisitionRequest, Geolocation, GeolocationConfig, LocationFix, ReplayProvider};
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const WATCHED_FIXES: usize = 5;

fn demo_config() -> GeolocationConfig {
    GeolocationConfig {
        default_timeout_ms: 10_000,
        update_time_ms: 1_000,
        minimum_update_time_ms: 1_000,
        ..Default::default()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let track_path = args
        .next()
        .ok_or_else(|| anyhow!("usage: geolocate <track.json> [config.json]"))?;
    let config = match args.next() {
        Some(path) => GeolocationConfig::from_file(&path).with_context(|| format!("loading {}", path))?,
        None => demo_config(),
    };

    let provider = ReplayProvider::from_file(&track_path).with_context(|| format!("loading {}", track_path))?;
    let track_len = provider.track_len();
    let geolocation = Geolocation::with_config(Arc::new(provider), config)?;

    geolocation.enable_location_request(false).await?;
    info!("provider '{}' enabled", geolocation.provider_name());

    let request = AcquisitionRequest::new().with_maximum_age(5_000);
    let current = geolocation.get_current_location(&request).await?;
    println!("current location:\n{}", serde_json::to_string_pretty(&current)?);

    let (tx, mut rx) = mpsc::unbounded_channel::<LocationFix>();
    let watch_id = geolocation
        .watch_location(
            move |fix| {
                let _ = tx.send(fix);
            },
            |error| warn!("watch error: {}", error),
            &AcquisitionRequest::new(),
        )
        .await?;

    let wanted = WATCHED_FIXES.min(track_len);
    let mut watched = Vec::with_capacity(wanted);
    let deadline = Duration::from_millis(geolocation.config().default_timeout_ms);
    while watched.len() < wanted {
        match tokio::time::timeout(deadline, rx.recv()).await {
            Ok(Some(fix)) => {
                println!("{}: {:.6}, {:.6}", watch_id, fix.latitude, fix.longitude);
                watched.push(fix);
            }
            Ok(None) => break,
            Err(_) => {
                warn!("no update within {:?}, giving up", deadline);
                break;
            }
        }
    }
    geolocation.clear_watch(watch_id);

    let travelled: f64 = watched
        .windows(2)
        .map(|pair| geolocation.distance(&pair[0], &pair[1]))
        .sum();
    println!("travelled {:.1} m over {} fixes", travelled, watched.len());

    let cached = geolocation
        .get_current_location(&AcquisitionRequest::new().with_timeout(0))
        .await?;
    println!("last known location: {:.6}, {:.6}", cached.latitude, cached.longitude);

    Ok(())
}
