//! Session-level errors.

use std::fmt;

use tripsync_client::ApiError;
use tripsync_core::error::CoreError;
use tripsync_core::types::TripId;

/// The session operation a backend failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Load,
    LoadDetail,
    Create,
    Save,
    Unsave,
    Delete,
    UpdateNotes,
    HotelRecommendations,
    AddHotel,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Load => "load",
            Operation::LoadDetail => "load detail",
            Operation::Create => "create",
            Operation::Save => "save",
            Operation::Unsave => "unsave",
            Operation::Delete => "delete",
            Operation::UpdateNotes => "update notes",
            Operation::HotelRecommendations => "hotel recommendations",
            Operation::AddHotel => "add hotel",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by [`TripSession`](crate::TripSession) operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Invalid input, detected before any network call.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The session was created without a user.
    #[error("No user is signed in")]
    NoUser,

    /// Another save, unsave or delete for the same trip has not finished.
    #[error("A request for trip {0} is already in flight")]
    InFlight(TripId),

    /// The trip is not in the loaded list.
    #[error("Trip {0} is not loaded")]
    UnknownTrip(TripId),

    /// The operation needs a saved-trip link and the trip has none.
    #[error("Trip {0} is not saved")]
    NotSaved(TripId),

    /// The backend call failed.
    #[error("Failed to {operation}: {source}")]
    Api {
        operation: Operation,
        #[source]
        source: ApiError,
    },
}

impl SessionError {
    pub(crate) fn api(operation: Operation, source: ApiError) -> Self {
        SessionError::Api { operation, source }
    }

    /// Whether the failure happened before any network call because the
    /// input was invalid or incomplete.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SessionError::Core(CoreError::Validation(_)) | SessionError::NoUser
        )
    }

    /// The underlying backend error, if this is one.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            SessionError::Api { source, .. } => Some(source),
            _ => None,
        }
    }
}
