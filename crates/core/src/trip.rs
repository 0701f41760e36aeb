//! Trip domain types and trip creation validation.
//!
//! A [`Trip`] is the backend's `TripResponse`: summary fields plus the
//! ordered destination and hotel lists. The same shape is returned by the
//! user listing and the single-trip detail endpoint.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, TripId, UserId};
use crate::wire::{lenient_date, null_as_default};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum length of a trip title in characters.
pub const MAX_TITLE_LENGTH: usize = 200;

// ---------------------------------------------------------------------------
// TripStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a trip.
///
/// Anything the backend sends that is not one of the known values
/// (including `null`) maps to [`TripStatus::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripStatus {
    Planning,
    Active,
    Completed,
    #[default]
    #[serde(other)]
    Unknown,
}

impl TripStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TripStatus::Planning => "PLANNING",
            TripStatus::Active => "ACTIVE",
            TripStatus::Completed => "COMPLETED",
            TripStatus::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Trip
// ---------------------------------------------------------------------------

/// A trip as returned by the backend.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    /// Server-assigned identifier. Absent only on malformed records.
    #[serde(default)]
    pub id: Option<TripId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub budget: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: TripStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub destinations: Vec<Destination>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hotels: Vec<TripHotel>,
}

impl Trip {
    /// Display title, falling back to a placeholder for blank titles.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "Untitled Trip"
        } else {
            &self.title
        }
    }
}

/// A destination attached to a trip.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    #[serde(default)]
    pub id: Option<DbId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub city: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub country: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub average_rating: Option<f64>,
}

/// A hotel that has been added to a trip.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripHotel {
    #[serde(default)]
    pub id: Option<DbId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub location: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rating: f64,
    /// Distance from the trip's destinations, in kilometres.
    #[serde(default, deserialize_with = "null_as_default")]
    pub distance: f64,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub map_url: Option<String>,
}

// ---------------------------------------------------------------------------
// NewTrip
// ---------------------------------------------------------------------------

/// Request body for `POST /api/trips`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTrip {
    pub user_id: UserId,
    pub title: String,
    pub description: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub budget: f64,
}

impl NewTrip {
    /// Check the request before it is sent.
    ///
    /// - title must be non-blank and at most [`MAX_TITLE_LENGTH`] chars;
    /// - budget must be a finite, non-negative number;
    /// - the end date, if both are given, must not precede the start date.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_title(&self.title)?;
        validate_budget(self.budget)?;
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(CoreError::Validation(format!(
                    "End date {end} is before start date {start}"
                )));
            }
        }
        Ok(())
    }
}

/// Trip fields entered by the user, before the owner is attached.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TripDraft {
    pub title: String,
    pub description: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub budget: f64,
}

impl TripDraft {
    /// Attach the owning user, producing the request body.
    pub fn for_user(self, user_id: UserId) -> NewTrip {
        NewTrip {
            user_id,
            title: self.title,
            description: self.description,
            start_date: self.start_date,
            end_date: self.end_date,
            budget: self.budget,
        }
    }
}

/// Validate a trip title: non-blank and within the length limit.
pub fn validate_title(title: &str) -> Result<(), CoreError> {
    if title.trim().is_empty() {
        return Err(CoreError::Validation("Trip title cannot be empty".into()));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Trip title exceeds maximum length of {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate a budget: finite and non-negative.
pub fn validate_budget(budget: f64) -> Result<(), CoreError> {
    if !budget.is_finite() || budget < 0.0 {
        return Err(CoreError::Validation(format!(
            "Budget must be a non-negative number, got {budget}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
