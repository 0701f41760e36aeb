//! Per-trip in-flight tracking.
//!
//! At most one save, unsave, delete or notes update runs per trip id. A
//! second request for the same trip gets no guard and must fail fast.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use tripsync_core::types::TripId;

#[derive(Debug, Default)]
pub struct InFlight {
    trips: Mutex<HashSet<TripId>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `trip_id` busy. Returns `None` if it already is.
    pub fn acquire(&self, trip_id: TripId) -> Option<InFlightGuard<'_>> {
        if self.lock().insert(trip_id) {
            Some(InFlightGuard {
                owner: self,
                trip_id,
            })
        } else {
            None
        }
    }

    pub fn is_busy(&self, trip_id: TripId) -> bool {
        self.lock().contains(&trip_id)
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<TripId>> {
        self.trips.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Releases the trip when dropped.
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    owner: &'a InFlight,
    trip_id: TripId,
}

impl InFlightGuard<'_> {
    pub fn trip_id(&self) -> TripId {
        self.trip_id
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.owner.lock().remove(&self.trip_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_until_release() {
        let in_flight = InFlight::new();

        let guard = in_flight.acquire(1).expect("first acquire");
        assert!(in_flight.acquire(1).is_none());
        assert!(in_flight.is_busy(1));

        drop(guard);
        assert!(!in_flight.is_busy(1));
        assert!(in_flight.acquire(1).is_some());
    }

    #[test]
    fn different_trips_do_not_block() {
        let in_flight = InFlight::new();
        let _a = in_flight.acquire(1).unwrap();
        assert!(in_flight.acquire(2).is_some());
    }
}
