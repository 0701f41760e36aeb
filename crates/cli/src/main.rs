//! `tripsync` -- terminal client for a user's trips and saved trips.
//!
//! # Environment variables
//!
//! | Variable                         | Required | Default                 | Description                      |
//! |----------------------------------|----------|-------------------------|----------------------------------|
//! | `TRIPSYNC_USER_ID`               | yes      | --                      | Id of the signed-in user         |
//! | `TRIPSYNC_API_URL`               | no       | `http://localhost:8080` | Backend base URL                 |
//! | `TRIPSYNC_REQUEST_TIMEOUT_SECS`  | no       | `10`                    | Per-request timeout              |
//! | `TRIPSYNC_LOAD_RETRY_ATTEMPTS`   | no       | `3`                     | Automatic retries of a failed load |
//! | `TRIPSYNC_LOAD_RETRY_DELAY_SECS` | no       | `30`                    | Seconds between load retries     |

mod command;
mod render;

use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tripsync_client::{ClientConfig, HttpTripApi, TripApi};
use tripsync_core::types::UserId;
use tripsync_session::{
    HotelRecommendations, LoadReport, LoadRetryPolicy, SaveOutcome, SessionContext, TripSession,
    UnsaveOutcome,
};

use crate::command::{Command, USAGE};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tripsync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let command = match Command::parse(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("error: {e}\n\n{USAGE}");
            std::process::exit(2);
        }
    };

    let user_id: UserId = std::env::var("TRIPSYNC_USER_ID")
        .context("TRIPSYNC_USER_ID environment variable is required")?
        .trim()
        .parse()
        .context("TRIPSYNC_USER_ID must be a valid integer")?;

    let config = ClientConfig::from_env();
    tracing::debug!(api_url = %config.api_url, user_id, "Starting tripsync");

    let api: Arc<dyn TripApi> = Arc::new(HttpTripApi::new(config)?);
    let context = SessionContext::new(Some(user_id)).with_retry(LoadRetryPolicy::from_env());
    let session = TripSession::new(api.clone(), context);

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    match session.load_with_retry(&cancel).await? {
        LoadReport::Failed(failure) => {
            eprintln!("warning: trips could not be fully loaded ({failure})");
        }
        LoadReport::Loaded { .. } | LoadReport::Superseded => {}
    }

    run(command, &session, api).await
}

async fn run(command: Command, session: &TripSession, api: Arc<dyn TripApi>) -> anyhow::Result<()> {
    match command {
        Command::List => {
            let trips = session.trips().await;
            if trips.is_empty() {
                println!("No trips.");
            }
            for entry in &trips {
                println!("{}", render::trip_line(entry));
            }
        }
        Command::Show(trip_id) => {
            if let Some(trip) = session.select_trip(trip_id).await? {
                print!("{}", render::trip_detail(&trip));
            }
            if let Some(link) = session
                .saved_links()
                .await
                .into_iter()
                .find(|l| l.trip_id == trip_id)
            {
                println!("Saved (notes: {})", display_notes(&link.notes));
            }
        }
        Command::Save { trip_id, notes } => {
            let entry = session
                .entry(trip_id)
                .await
                .with_context(|| format!("trip {trip_id} is not one of your trips"))?;
            match session.save_with_notes(&entry.trip, &notes).await? {
                SaveOutcome::Saved { link_id } => println!("Saved trip {trip_id} (link {link_id})"),
                SaveOutcome::AlreadySaved { .. } => println!("Trip {trip_id} is already saved"),
            }
        }
        Command::Unsave(trip_id) => match session.unsave_trip(trip_id).await? {
            UnsaveOutcome::Removed { .. } => println!("Removed trip {trip_id} from saved trips"),
            UnsaveOutcome::LocalOnly { reason, .. } => {
                println!("Trip {trip_id} unsaved locally; server did not confirm ({reason})")
            }
            UnsaveOutcome::NotSaved => println!("Trip {trip_id} is not saved"),
        },
        Command::Delete { trip_id, yes } => {
            let request = session.request_delete(trip_id).await?;
            if !yes && !ask(&request.prompt())? {
                println!("Cancelled");
                return Ok(());
            }
            session.delete_trip(request.confirm()).await?;
            println!("Deleted trip {trip_id}");
        }
        Command::Notes { trip_id, text } => {
            let link = session.update_notes(trip_id, &text).await?;
            println!("Notes updated: {}", display_notes(&link.notes));
        }
        Command::Hotels(trip_id) => {
            session.request_hotels(trip_id);
            let mut view = HotelRecommendations::new(api, session.handoff().clone());
            view.mount().await?;
            if view.hotels().is_empty() {
                println!("No recommendations.");
            }
            for (rank, hotel) in view.hotels().iter().enumerate() {
                println!("{:>2}. {}", rank + 1, render::hotel_line(hotel));
            }
        }
        Command::AddHotel { trip_id, rank } => {
            let mut view = HotelRecommendations::new(api, session.handoff().clone());
            let hotel = view
                .load_for(trip_id)
                .await?
                .get(rank - 1)
                .cloned()
                .with_context(|| format!("no hotel number {rank} for trip {trip_id}"))?;
            view.add_to_trip(&hotel).await?;
            println!("Added {} to trip {trip_id}", hotel.name);
        }
    }
    Ok(())
}

/// Ask a yes/no question on the terminal.
fn ask(prompt: &str) -> anyhow::Result<bool> {
    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn display_notes(notes: &str) -> &str {
    if notes.is_empty() {
        "none"
    } else {
        notes
    }
}
