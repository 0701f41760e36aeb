//! Session event bus and cross-view handoff.
//!
//! - [`EventBus`]: in-process publish/subscribe hub for [`TripEvent`]s,
//!   backed by `tokio::sync::broadcast`.
//! - [`HotelHandoff`]: single-slot mailbox carrying one trip id from the
//!   trip views to the hotel recommendations view, delivered at most once.

pub mod bus;
pub mod handoff;

pub use bus::{EventBus, TripEvent, TripEventKind};
pub use handoff::HotelHandoff;
