//! Trip reconciliation client.
//!
//! [`TripSession`] owns a user's trip list and the derived "saved" state
//! of each trip, and keeps both consistent with the backend across load,
//! save, unsave, delete and notes updates. [`HotelRecommendations`] is the
//! consumer side of the "find hotels for this trip" handoff.

pub mod confirm;
pub mod error;
pub mod hotels;
pub mod in_flight;
pub mod outcome;
pub mod retry;
pub mod session;

pub use confirm::{ConfirmedDelete, DeleteRequest};
pub use error::{Operation, SessionError};
pub use hotels::HotelRecommendations;
pub use outcome::{
    DeleteOutcome, DetailPane, LoadFailure, LoadReport, LoadState, ResourceError, SaveOutcome,
    UnsaveOutcome,
};
pub use retry::LoadRetryPolicy;
pub use session::{SessionContext, TripSession};
