/// All backend identifiers are 64-bit integers.
pub type DbId = i64;

/// Identifier of a [`Trip`](crate::trip::Trip).
pub type TripId = DbId;

/// Identifier of a [`SavedTripLink`](crate::saved_trip::SavedTripLink).
pub type SavedTripId = DbId;

/// Identifier of a user account.
pub type UserId = DbId;
