//! Typed results of session operations and the observable load/detail
//! state.

use std::fmt;

use tripsync_client::{ApiError, ErrorKind};
use tripsync_core::trip::Trip;
use tripsync_core::types::{SavedTripId, TripId};

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Why one of the two list fetches failed.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&ApiError> for ResourceError {
    fn from(err: &ApiError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// A load that did not fully succeed. The failed resource was replaced
/// with an empty list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadFailure {
    pub trips: Option<ResourceError>,
    pub saved_trips: Option<ResourceError>,
}

impl LoadFailure {
    pub fn is_empty(&self) -> bool {
        self.trips.is_none() && self.saved_trips.is_none()
    }
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.trips, &self.saved_trips) {
            (Some(t), Some(s)) => write!(
                f,
                "trips: {}; saved trips: {}",
                t.message, s.message
            ),
            (Some(t), None) => write!(f, "trips: {}", t.message),
            (None, Some(s)) => write!(f, "saved trips: {}", s.message),
            (None, None) => f.write_str("no failure"),
        }
    }
}

/// Result of a single [`load`](crate::TripSession::load) call.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadReport {
    /// Both lists were fetched and applied.
    Loaded { trips: usize, saved: usize },
    /// At least one list failed; what was fetched was still applied.
    Failed(LoadFailure),
    /// A newer load started before this one finished; nothing was applied.
    Superseded,
}

impl LoadReport {
    pub fn is_failed(&self) -> bool {
        matches!(self, LoadReport::Failed(_))
    }
}

/// What the list view should show.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum LoadState {
    #[default]
    NotLoaded,
    Loaded,
    /// Recoverable: the lists may be partial and a retry is possible.
    Failed(LoadFailure),
}

// ---------------------------------------------------------------------------
// Save / unsave / delete
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// A new link was created.
    Saved { link_id: SavedTripId },
    /// The trip was already saved, locally or on the server.
    ///
    /// `link_id` is `None` when the server reported a duplicate but the
    /// follow-up listing could not be read; the local state is unchanged
    /// in that case.
    AlreadySaved { link_id: Option<SavedTripId> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsaveOutcome {
    /// The server confirmed the link is gone.
    Removed { link_id: SavedTripId },
    /// The trip was cleared locally but the server did not confirm the
    /// removal. The unsave is replayed on the next load.
    LocalOnly {
        link_id: Option<SavedTripId>,
        reason: String,
    },
    /// There was no link to remove.
    NotSaved,
}

impl UnsaveOutcome {
    /// Whether the server state is known to match the local state.
    pub fn is_confirmed(&self) -> bool {
        !matches!(self, UnsaveOutcome::LocalOnly { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub trip_id: TripId,
    /// The selection pointed at the deleted trip and was cleared.
    pub cleared_selection: bool,
    /// The saved-trip link that was dropped from local tracking.
    pub dropped_link: Option<SavedTripId>,
}

// ---------------------------------------------------------------------------
// Detail
// ---------------------------------------------------------------------------

/// State of the trip detail pane.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DetailPane {
    #[default]
    Empty,
    Loading(TripId),
    Loaded(Trip),
    Failed { trip_id: TripId, error: String },
}
