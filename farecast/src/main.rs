//! Farecast command-line client
//!
//! ```bash
//! farecast smart --pickup "Indiranagar" --drop "Koramangala" --ride-type bike --book
//! farecast manual --ride-type taxi --distance 12 --time-of-day evening --day-type weekday \
//!     --demand high --traffic heavy --weather rainy --pickup-zone "mg road"
//! farecast suggest "Whitefield"
//! ```
//!
//! Logging is controlled with `RUST_LOG` (default `farecast=info,farecast_runtime=info`).

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use farecast::location::LocationAction;
use farecast::manual::{ChoiceField, ManualAction, ManualReducer, ManualState};
use farecast::normalize;
use farecast::ride_status::RideStatusAction;
use farecast::smart::{SmartAction, SmartBookingReducer, SmartBookingState};
use farecast::{BookingEnvironment, FarecastConfig, HttpFareClient, NominatimClient, PlaceSearch};
use farecast_runtime::metrics::MetricsRecorder;
use farecast_runtime::Store;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "farecast", about = "Ride fare estimates from the command line")]
struct Cli {
    /// Print a Prometheus metrics snapshot before exiting
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Smart prediction from pickup and drop place names
    Smart {
        /// Pickup place
        #[arg(long)]
        pickup: String,
        /// Drop place
        #[arg(long)]
        drop: String,
        /// `bike` or `taxi`
        #[arg(long, default_value = "taxi")]
        ride_type: String,
        /// Bind both places to their best place-search match first
        #[arg(long)]
        resolve: bool,
        /// Confirm the booking and follow the ride status
        #[arg(long)]
        book: bool,
    },
    /// Prediction from hand-picked ride conditions
    Manual {
        /// `bike` or `taxi`
        #[arg(long)]
        ride_type: String,
        /// Distance in km (1 to 50, 0.5 steps)
        #[arg(long, default_value_t = 5.0)]
        distance: f64,
        /// `morning`, `afternoon`, `evening` or `night`
        #[arg(long)]
        time_of_day: String,
        /// `weekday` or `weekend`
        #[arg(long)]
        day_type: String,
        /// `low`, `medium` or `high`
        #[arg(long)]
        demand: String,
        /// `low`, `moderate` or `heavy`
        #[arg(long)]
        traffic: String,
        /// `clear`, `rainy` or `foggy`
        #[arg(long)]
        weather: String,
        /// Pickup area
        #[arg(long)]
        pickup_zone: String,
    },
    /// Place suggestions for a partial name
    Suggest {
        /// Partial place name
        query: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "farecast=info,farecast_runtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut recorder = MetricsRecorder::new();
    if cli.metrics {
        recorder.install().context("installing metrics recorder")?;
    }

    let config = FarecastConfig::try_from_env().context("reading configuration")?;
    let fare_api = Arc::new(HttpFareClient::new(&config.api)?);
    let places = Arc::new(NominatimClient::new(&config.places, &config.api)?);
    let env = BookingEnvironment::with_system_clock(fare_api, places, config.timings.clone());

    match cli.command {
        Commands::Smart {
            pickup,
            drop,
            ride_type,
            resolve,
            book,
        } => {
            probe(&env).await;
            run_smart(env, pickup, drop, &ride_type, resolve, book).await?;
        },
        Commands::Manual {
            ride_type,
            distance,
            time_of_day,
            day_type,
            demand,
            traffic,
            weather,
            pickup_zone,
        } => {
            probe(&env).await;
            let form = vec![
                select(ChoiceField::RideType, ride_type),
                select(ChoiceField::TimeOfDay, time_of_day),
                select(ChoiceField::DayType, day_type),
                select(ChoiceField::Demand, demand),
                select(ChoiceField::Traffic, traffic),
                select(ChoiceField::Weather, weather),
                ManualAction::PickupZoneChanged(pickup_zone),
                ManualAction::DistanceChanged(distance),
            ];
            run_manual(env, form).await?;
        },
        Commands::Suggest { query } => {
            let suggestions = env.places.search(query).await?;
            if suggestions.is_empty() {
                println!("No places found");
            }
            for suggestion in suggestions {
                let (lat, lon) = suggestion.coordinates.into();
                println!("{}  ({lat:.5}, {lon:.5})", suggestion.display_name);
            }
        },
    }

    if cli.metrics {
        if let Some(snapshot) = recorder.render() {
            println!("\n{snapshot}");
        }
    }

    Ok(())
}

/// Warn when the fare service does not look healthy; the request is sent anyway
async fn probe(env: &BookingEnvironment) {
    let report = env.health().await;
    tracing::debug!(status = ?report.status, "Health probe finished");
}

fn select(field: ChoiceField, value: String) -> ManualAction {
    ManualAction::Select { field, value }
}

async fn run_smart(
    env: BookingEnvironment,
    pickup: String,
    drop: String,
    ride_type: &str,
    resolve: bool,
    book: bool,
) -> anyhow::Result<()> {
    let places = Arc::clone(&env.places);
    let store = Store::new(SmartBookingState::default(), SmartBookingReducer::new(), env);

    store
        .send(SmartAction::RideTypeSelected(normalize::ride_type(ride_type)))
        .await?;

    for (text, wrap) in [
        (pickup, SmartAction::Pickup as fn(LocationAction) -> SmartAction),
        (drop, SmartAction::Drop),
    ] {
        let best = if resolve {
            places.search(text.clone()).await.ok().and_then(|mut found| {
                (!found.is_empty()).then(|| found.swap_remove(0))
            })
        } else {
            None
        };
        match best {
            Some(suggestion) => {
                println!("Using {}", suggestion.display_name);
                store.send(wrap(LocationAction::SuggestionSelected(suggestion))).await?;
            },
            None => {
                store.send(wrap(LocationAction::TextChanged(text))).await?;
                store.send(wrap(LocationAction::FocusLost)).await?;
            },
        }
    }

    let mut actions = store.subscribe_actions();
    store.send(SmartAction::Submit).await?;

    if !store.state(|s| s.loading).await {
        let notices = store.state(|s| s.notifications.clone()).await;
        store.shutdown_default().await?;
        bail!(
            "{}",
            notices.last().map_or("Submission rejected", |n| n.message.as_str())
        );
    }

    loop {
        match actions.recv().await {
            Ok(SmartAction::NarrationTick { .. } | SmartAction::PredictionReceived { .. }) => {
                if let Some(line) = store.state(|s| s.narration).await {
                    println!("{line}");
                }
            },
            Ok(SmartAction::CommitPrediction { .. }) => break,
            Ok(SmartAction::PredictionFailed { .. }) => {
                let notices = store.state(|s| s.notifications.clone()).await;
                store.shutdown_default().await?;
                bail!(
                    "{}",
                    notices.last().map_or("Prediction failed", |n| n.message.as_str())
                );
            },
            Ok(_) => {},
            Err(RecvError::Lagged(skipped)) => tracing::warn!(skipped, "Missed store actions"),
            Err(RecvError::Closed) => bail!("store closed before the prediction finished"),
        }
    }

    let Some(result) = store.state(|s| s.prediction.clone()).await else {
        bail!("no prediction committed");
    };
    println!();
    println!(
        "{} fare: {:.2} (base {:.2}, surge x{:.2})",
        result.ride_type, result.final_fare, result.base_fare, result.surge_multiplier
    );
    println!(
        "{:.1} km, {:.0} min; {} weather, {} traffic, {} demand",
        result.distance_km, result.duration_min, result.weather, result.traffic, result.demand
    );
    for line in &result.explanation {
        println!("  - {line}");
    }

    if book {
        store.send(SmartAction::ConfirmBooking).await?;
        if let Some(stage) = store.state(|s| s.ride.stage).await {
            println!("\n{}", stage.label());
        }
        loop {
            match actions.recv().await {
                Ok(SmartAction::RideStatus(RideStatusAction::StageReached { stage, .. })) => {
                    println!("{}", stage.label());
                },
                Ok(SmartAction::RideStatus(RideStatusAction::TimelineElapsed { .. })) => break,
                Ok(_) => {},
                Err(RecvError::Lagged(skipped)) => tracing::warn!(skipped, "Missed store actions"),
                Err(RecvError::Closed) => break,
            }
        }
    }

    store.shutdown_default().await?;
    Ok(())
}

async fn run_manual(env: BookingEnvironment, form: Vec<ManualAction>) -> anyhow::Result<()> {
    let store = Store::new(ManualState::default(), ManualReducer, env);
    for action in form {
        store.send(action).await?;
    }

    let mut actions = store.subscribe_actions();
    store.send(ManualAction::Submit).await?;

    let Some(payload) = store.state(|s| s.last_payload.clone()).await else {
        let notices = store.state(|s| s.notifications.clone()).await;
        bail!(
            "{}",
            notices.last().map_or("Form incomplete", |n| n.message.as_str())
        );
    };
    println!("{}", serde_json::to_string_pretty(&payload)?);

    let outcome = tokio::time::timeout(Duration::from_secs(60), async {
        loop {
            match actions.recv().await {
                Ok(ManualAction::EstimateReceived { .. }) => return Ok::<_, anyhow::Error>(true),
                Ok(ManualAction::EstimateFailed { .. }) => return Ok(false),
                Ok(_) | Err(RecvError::Lagged(_)) => {},
                Err(RecvError::Closed) => bail!("store closed before the estimate arrived"),
            }
        }
    })
    .await
    .context("waiting for the estimate")??;

    if outcome {
        if let Some(estimate) = store.state(|s| s.estimate.clone()).await {
            println!(
                "Fare: {:.2} (surge x{:.2}, {} demand)",
                estimate.fare, estimate.surge_multiplier, estimate.demand_status
            );
        }
    } else {
        let notices = store.state(|s| s.notifications.clone()).await;
        if let Some(notice) = notices.last() {
            eprintln!("{}", notice.message);
        }
    }

    store.shutdown_default().await?;
    Ok(())
}
