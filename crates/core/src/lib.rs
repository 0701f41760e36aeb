//! Domain types and pure logic for the tripsync client.
//!
//! Nothing in this crate performs I/O. The HTTP layer lives in
//! `tripsync-client`; the stateful reconciliation lives in
//! `tripsync-session`.

pub mod error;
pub mod hotel;
pub mod saved_state;
pub mod saved_trip;
pub mod trip;
pub mod types;
mod wire;
