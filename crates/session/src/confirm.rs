//! Confirmation token for destructive trip deletion.
//!
//! [`TripSession::delete_trip`](crate::TripSession::delete_trip) only
//! accepts a [`ConfirmedDelete`], and the only way to get one is to ask
//! the session for a [`DeleteRequest`] and explicitly confirm it. Dropping
//! the request cancels the delete.

use tripsync_core::types::TripId;

/// A pending delete awaiting user confirmation.
#[derive(Debug)]
#[must_use = "a delete request does nothing until it is confirmed"]
pub struct DeleteRequest {
    trip_id: TripId,
    title: String,
}

impl DeleteRequest {
    pub(crate) fn new(trip_id: TripId, title: impl Into<String>) -> Self {
        Self {
            trip_id,
            title: title.into(),
        }
    }

    pub fn trip_id(&self) -> TripId {
        self.trip_id
    }

    /// Text to show the user before confirming.
    pub fn prompt(&self) -> String {
        format!(
            "Delete trip \"{}\" (#{})? This cannot be undone.",
            self.title, self.trip_id
        )
    }

    /// The user confirmed.
    pub fn confirm(self) -> ConfirmedDelete {
        ConfirmedDelete {
            trip_id: self.trip_id,
        }
    }
}

/// Proof that the user confirmed deleting a trip.
#[derive(Debug)]
pub struct ConfirmedDelete {
    trip_id: TripId,
}

impl ConfirmedDelete {
    pub fn trip_id(&self) -> TripId {
        self.trip_id
    }
}
