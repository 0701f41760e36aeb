//! HTTP client for the travel-planner REST backend.
//!
//! [`TripApi`] is the seam the session layer is written against;
//! [`HttpTripApi`] implements it over [`reqwest`]. Errors are classified
//! into the [`ApiError`] taxonomy so callers can tell duplicates and
//! missing resources apart from transport failures.

pub mod api;
pub mod config;
pub mod error;

pub use api::{HttpTripApi, TripApi};
pub use config::ClientConfig;
pub use error::{ApiError, ApiResult, ErrorKind, Rejection};
