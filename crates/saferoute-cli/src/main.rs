//! Command-line front end for the route safety engine.
//!
//! Usage:
//!   saferoute plan "Srinagar" "Pahalgam"
//!   saferoute plan 34.0837,74.7973 34.0159,75.3187
//!   saferoute geocode "Lal Chowk Srinagar"
//!   saferoute reverse 34.0837 74.7973
//!   saferoute navigate 34.0837,74.7973 34.0159,75.3187

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use saferoute_core::geo;
use saferoute_core::models::{Coordinate, LocationFix};
use saferoute_engine::{
    refresh_once, start_navigation, Config, HazardStore, NavigationEvent, PlannedRoute,
    RouteAcquirer, RoutePlanner,
};
use saferoute_providers::{HttpAlertsSource, NominatimClient, OsrmClient};

#[derive(Parser, Debug)]
#[command(author, version, about = "Route planning with hazard-aware safety scores")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Plan a route and print its safety score
    Plan {
        /// Origin: "lat,lng" or a place name
        origin: String,
        /// Destination: "lat,lng" or a place name
        destination: String,
    },
    /// Resolve a place name to coordinates
    Geocode {
        /// Free-text query
        query: String,
    },
    /// Resolve coordinates to a display name
    Reverse {
        lat: f64,
        lng: f64,
    },
    /// Plan a route, then replay a simulated drive along it
    Navigate {
        /// Origin: "lat,lng" or a place name
        origin: String,
        /// Destination: "lat,lng" or a place name
        destination: String,
        /// Milliseconds between simulated fixes
        #[arg(long, default_value_t = 250)]
        interval_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("saferoute_engine=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Command::Plan { origin, destination } => {
            let planned = plan(&config, &origin, &destination).await?;
            print_plan(&planned);
        }
        Command::Geocode { query } => {
            let nominatim = NominatimClient::new(config.nominatim_url.clone());
            match nominatim.search(&query).await? {
                Some(place) => println!(
                    "{:.6},{:.6}  {}",
                    place.coordinate.lat, place.coordinate.lng, place.display_name
                ),
                None => println!("no match for {query:?}"),
            }
        }
        Command::Reverse { lat, lng } => {
            let coordinate = Coordinate::new(lat, lng)?;
            let nominatim = NominatimClient::new(config.nominatim_url.clone());
            let name = nominatim.reverse(coordinate).await?;
            println!("{name}");
        }
        Command::Navigate { origin, destination, interval_ms } => {
            let planned = plan(&config, &origin, &destination).await?;
            print_plan(&planned);
            replay_drive(&config, &planned, Duration::from_millis(interval_ms)).await?;
        }
    }

    Ok(())
}

async fn plan(config: &Config, origin: &str, destination: &str) -> Result<PlannedRoute> {
    let nominatim = NominatimClient::new(config.nominatim_url.clone());
    let origin = resolve(&nominatim, origin).await?;
    let destination = resolve(&nominatim, destination).await?;

    let acquirer = Arc::new(RouteAcquirer::new(
        OsrmClient::with_timeout(config.osrm_url.clone(), config.provider_timeout),
        config,
    ));
    let hazards = Arc::new(HazardStore::new());

    let alerts = HttpAlertsSource::new(config.alerts_url.clone());
    if let Err(err) = refresh_once(hazards.as_ref(), &alerts).await {
        tracing::warn!("alerts feed unavailable ({err}); scoring without hazards");
    }

    let planner = RoutePlanner::new(acquirer, hazards);
    Ok(planner.plan(origin, destination).await?)
}

/// Accepts "lat,lng" directly, anything else goes through the geocoder.
async fn resolve(nominatim: &NominatimClient, input: &str) -> Result<Coordinate> {
    if let Some((lat, lng)) = input.split_once(',') {
        if let (Ok(lat), Ok(lng)) = (lat.trim().parse::<f64>(), lng.trim().parse::<f64>()) {
            return Ok(Coordinate::new(lat, lng)?);
        }
    }

    let place = nominatim
        .search(input)
        .await
        .with_context(|| format!("geocoding {input:?}"))?
        .ok_or_else(|| anyhow!("no geocoding match for {input:?}"))?;
    println!("resolved {:?} to {}", input, place.display_name);
    Ok(place.coordinate)
}

fn print_plan(planned: &PlannedRoute) {
    println!(
        "route: {:.1} km, ~{} min{}",
        planned.summary.total_distance_km,
        planned.summary.estimated_time_minutes,
        if planned.route.is_fallback { " (straight-line fallback)" } else { "" }
    );
    println!(
        "safety score: {}/10 ({} relevant hazard(s){})",
        planned.summary.score,
        planned.report.relevant_hazards,
        if planned.report.direct_risk { ", direct risk on route" } else { "" }
    );
    for (i, step) in planned.route.instructions.iter().enumerate() {
        println!("  {:>2}. {} ({:.0} m)", i + 1, step.text, step.distance_m);
    }
}

/// Feed the route geometry back in as simulated fixes and print the
/// turn-by-turn updates the session produces.
async fn replay_drive(
    config: &Config,
    planned: &PlannedRoute,
    interval: Duration,
) -> Result<()> {
    let (fix_tx, fix_rx) = mpsc::channel(16);
    let mut handle = start_navigation(planned.route.clone(), fix_rx, config.first_fix_timeout);

    let geometry = planned.route.geometry.clone();
    let feeder = tokio::spawn(async move {
        for (i, point) in geometry.iter().enumerate() {
            let heading = geometry
                .get(i + 1)
                .map(|next| geo::bearing_deg(*point, *next));
            let fix = LocationFix {
                coordinate: *point,
                heading_deg: heading,
                timestamp: Utc::now(),
            };
            if fix_tx.send(fix).await.is_err() {
                break;
            }
            tokio::time::sleep(interval).await;
        }
        // Dropping the sender ends the session.
    });

    while let Some(event) = handle.next_event().await {
        match event {
            NavigationEvent::Update(update) => println!(
                "-> {} | {:.2} km, {} min remaining",
                update.step_text, update.remaining_distance_km, update.remaining_time_minutes
            ),
            NavigationEvent::LocationUnavailable => println!("-> waiting for a location fix"),
            NavigationEvent::Stopped => {
                println!("-> navigation ended");
                break;
            }
        }
    }

    feeder.await.context("fix feeder task")?;
    Ok(())
}
