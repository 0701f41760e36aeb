//! Plain-text rendering of session state.

use std::fmt::Write;

use tripsync_core::hotel::HotelRecommendation;
use tripsync_core::saved_state::TripEntry;
use tripsync_core::trip::Trip;

pub fn trip_line(entry: &TripEntry) -> String {
    let id = entry
        .id()
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".into());
    let saved = if entry.is_saved() { "*" } else { " " };
    format!(
        "{saved} #{id:<6} {:<10} {}",
        entry.trip.status,
        entry.trip.display_title()
    )
}

pub fn trip_detail(trip: &Trip) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} [{}]", trip.display_title(), trip.status);
    if !trip.description.is_empty() {
        let _ = writeln!(out, "{}", trip.description);
    }
    if let (Some(start), Some(end)) = (trip.start_date, trip.end_date) {
        let _ = writeln!(out, "Dates:  {start} to {end}");
    }
    let _ = writeln!(out, "Budget: {:.2}", trip.budget);
    for d in &trip.destinations {
        let _ = writeln!(out, "  - {} ({}, {})", d.name, d.city, d.country);
    }
    for h in &trip.hotels {
        let _ = writeln!(out, "  hotel: {} ({:.1}, {:.1} km)", h.name, h.rating, h.distance);
    }
    out
}

pub fn hotel_line(hotel: &HotelRecommendation) -> String {
    format!(
        "{} - {} (rating {:.1}, avg {:.1} km)",
        hotel.name, hotel.location, hotel.rating, hotel.average_distance
    )
}
