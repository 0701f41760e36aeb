//! Saved-trip ("favorite") links between a user and a trip.
//!
//! The backend has shipped two payload shapes for a saved trip: a flat
//! `tripId` field, and a nested `trip` summary object carrying `id`.
//! [`SavedTripRecord`] accepts both; converting it into a
//! [`SavedTripLink`] resolves the trip reference (flat wins) and rejects
//! records that carry no link id or no trip reference at all.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::trip::Trip;
use crate::types::{SavedTripId, TripId, UserId};
use crate::wire::{lenient_datetime, null_as_default};

/// Maximum length of saved-trip notes in characters.
pub const MAX_NOTES_LENGTH: usize = 5_000;

/// Raw saved-trip payload as decoded from the wire.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTripRecord {
    #[serde(default)]
    pub id: Option<SavedTripId>,
    #[serde(default)]
    pub trip_id: Option<TripId>,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub saved_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub trip: Option<Trip>,
}

/// A validated link between a user and a trip they have saved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTripLink {
    pub id: SavedTripId,
    pub trip_id: TripId,
    pub user_id: Option<UserId>,
    pub notes: String,
    pub saved_at: Option<NaiveDateTime>,
    /// Trip summary embedded by the backend, when present.
    pub trip: Option<Trip>,
}

impl TryFrom<SavedTripRecord> for SavedTripLink {
    type Error = CoreError;

    fn try_from(record: SavedTripRecord) -> Result<Self, Self::Error> {
        let id = record
            .id
            .ok_or_else(|| CoreError::Validation("Saved trip record has no id".into()))?;
        let trip_id = record
            .trip_id
            .or_else(|| record.trip.as_ref().and_then(|t| t.id))
            .ok_or_else(|| {
                CoreError::Validation(format!("Saved trip {id} has no trip reference"))
            })?;

        Ok(SavedTripLink {
            id,
            trip_id,
            user_id: record.user_id,
            notes: record.notes,
            saved_at: record.saved_at,
            trip: record.trip,
        })
    }
}

/// Request body for `POST /api/saved-trips`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSavedTrip {
    pub user_id: UserId,
    pub trip_id: TripId,
    pub notes: String,
}

/// Request body for `PUT /api/saved-trips/{id}/notes`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotesUpdate {
    pub notes: String,
}

/// Validate saved-trip notes against the length limit. Empty is allowed.
pub fn validate_notes(notes: &str) -> Result<(), CoreError> {
    if notes.chars().count() > MAX_NOTES_LENGTH {
        return Err(CoreError::Validation(format!(
            "Notes exceed maximum length of {MAX_NOTES_LENGTH} characters"
        )));
    }
    Ok(())
}
