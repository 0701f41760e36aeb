//! In-memory [`TripApi`] fake for session tests.
//!
//! Stores trips and saved-trip links for a single user, records every
//! call, enforces one link per trip like the real backend, and lets tests
//! inject failures or hold a call open until released.

#![allow(dead_code)]

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio::time::Instant;

use tripsync_client::{ApiError, ApiResult, TripApi};
use tripsync_core::hotel::{HotelRecommendation, NewTripHotel};
use tripsync_core::saved_trip::{NewSavedTrip, SavedTripLink};
use tripsync_core::trip::{NewTrip, Trip, TripHotel, TripStatus};
use tripsync_core::types::{SavedTripId, TripId, UserId};
use tripsync_session::{SessionContext, TripSession};

pub const USER: UserId = 1;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListTrips,
    GetTrip(TripId),
    CreateTrip,
    DeleteTrip(TripId),
    ListSaved,
    CreateSaved(TripId),
    DeleteSaved(SavedTripId),
    UpdateNotes(SavedTripId),
    Hotels(TripId),
    AddHotel(TripId),
}

impl Call {
    /// Whether the call touches the saved-trips resource.
    pub fn is_saved_trips(&self) -> bool {
        matches!(
            self,
            Call::ListSaved | Call::CreateSaved(_) | Call::DeleteSaved(_) | Call::UpdateNotes(_)
        )
    }
}

/// An injected failure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fail {
    Timeout,
    /// The request is applied, then the response times out.
    TimeoutAfterCommit,
    NotFound,
    Server,
    /// A rejection with the given status and body.
    Rejected(u16, &'static str),
}

impl Fail {
    fn error(self) -> ApiError {
        match self {
            Fail::Timeout | Fail::TimeoutAfterCommit => ApiError::Timeout(Duration::from_secs(10)),
            Fail::NotFound => ApiError::rejected(404, "Not Found"),
            Fail::Server => ApiError::rejected(500, "Internal Server Error"),
            Fail::Rejected(status, body) => ApiError::rejected(status, body),
        }
    }
}

#[derive(Debug, Default)]
pub struct Failures {
    pub list_trips: Option<Fail>,
    pub list_saved: Option<Fail>,
    pub get_trip: Option<Fail>,
    pub create_trip: Option<Fail>,
    pub delete_trip: Option<Fail>,
    pub create_saved: Option<Fail>,
    pub delete_saved: Option<Fail>,
    pub update_notes: Option<Fail>,
    pub hotels: Option<Fail>,
    pub add_hotel: Option<Fail>,
}

/// Holds the next matching call open until the test calls `notify_one`.
/// Each gate applies to one call and is then removed.
#[derive(Debug, Default)]
pub struct Gates {
    pub list_trips: Option<Arc<Notify>>,
    pub get_trip: Option<Arc<Notify>>,
    pub create_saved: Option<Arc<Notify>>,
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub trips: Vec<Trip>,
    pub links: Vec<SavedTripLink>,
    pub next_id: i64,
    pub calls: Vec<Call>,
    pub list_trip_times: Vec<Instant>,
    pub fail: Failures,
    pub gates: Gates,
}

#[derive(Debug, Default)]
pub struct FakeTripApi {
    state: Mutex<FakeState>,
}

impl FakeTripApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(FakeState {
                next_id: 1000,
                ..Default::default()
            }),
        })
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn seed_trip(&self, title: &str) -> TripId {
        let mut s = self.state();
        s.next_id += 1;
        let id = s.next_id;
        s.trips.push(trip(id, title));
        id
    }

    /// Add a link directly on the "server", bypassing uniqueness.
    pub fn seed_link(&self, trip_id: TripId) -> SavedTripId {
        let mut s = self.state();
        s.next_id += 1;
        let id = s.next_id;
        s.links.push(link(id, trip_id));
        id
    }

    pub fn links_for(&self, trip_id: TripId) -> usize {
        self.state()
            .links
            .iter()
            .filter(|l| l.trip_id == trip_id)
            .count()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.state().calls.iter().filter(|c| pred(c)).count()
    }

    /// Install a gate and return the handle that releases it.
    pub fn gate(&self, pick: impl FnOnce(&mut Gates) -> &mut Option<Arc<Notify>>) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *pick(&mut self.state().gates) = Some(notify.clone());
        notify
    }

    fn record(&self, call: Call) {
        self.state().calls.push(call);
    }

    async fn pass(gate: Option<Arc<Notify>>) {
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }
}

pub fn trip(id: TripId, title: &str) -> Trip {
    Trip {
        id: Some(id),
        title: title.to_string(),
        budget: 1000.0,
        status: TripStatus::Planning,
        ..Default::default()
    }
}

pub fn link(id: SavedTripId, trip_id: TripId) -> SavedTripLink {
    SavedTripLink {
        id,
        trip_id,
        user_id: Some(USER),
        notes: String::new(),
        saved_at: None,
        trip: None,
    }
}

/// A session for [`USER`] over `api`.
pub fn session(api: &Arc<FakeTripApi>) -> TripSession {
    TripSession::new(api.clone(), SessionContext::new(Some(USER)))
}

#[async_trait]
impl TripApi for FakeTripApi {
    async fn list_trips(&self, _user_id: UserId) -> ApiResult<Vec<Trip>> {
        let (result, gate) = {
            let mut s = self.state();
            s.calls.push(Call::ListTrips);
            s.list_trip_times.push(Instant::now());
            let result = match s.fail.list_trips {
                Some(fail) => Err(fail.error()),
                None => Ok(s.trips.clone()),
            };
            (result, s.gates.list_trips.take())
        };
        Self::pass(gate).await;
        result
    }

    async fn get_trip(&self, trip_id: TripId) -> ApiResult<Trip> {
        self.record(Call::GetTrip(trip_id));
        let gate = self.state().gates.get_trip.take();
        Self::pass(gate).await;
        let s = self.state();
        if let Some(fail) = s.fail.get_trip {
            return Err(fail.error());
        }
        s.trips
            .iter()
            .find(|t| t.id == Some(trip_id))
            .cloned()
            .ok_or_else(|| ApiError::rejected(404, "Not Found"))
    }

    async fn create_trip(&self, request: &NewTrip) -> ApiResult<Trip> {
        self.record(Call::CreateTrip);
        let mut s = self.state();
        if let Some(fail) = s.fail.create_trip {
            return Err(fail.error());
        }
        s.next_id += 1;
        let created = Trip {
            id: Some(s.next_id),
            title: request.title.clone(),
            description: request.description.clone(),
            start_date: request.start_date,
            end_date: request.end_date,
            budget: request.budget,
            status: TripStatus::Planning,
            ..Default::default()
        };
        s.trips.push(created.clone());
        Ok(created)
    }

    async fn delete_trip(&self, trip_id: TripId) -> ApiResult<()> {
        self.record(Call::DeleteTrip(trip_id));
        let mut s = self.state();
        if let Some(fail) = s.fail.delete_trip {
            return Err(fail.error());
        }
        s.trips.retain(|t| t.id != Some(trip_id));
        s.links.retain(|l| l.trip_id != trip_id);
        Ok(())
    }

    async fn list_saved_trips(&self, _user_id: UserId) -> ApiResult<Vec<SavedTripLink>> {
        self.record(Call::ListSaved);
        let s = self.state();
        match s.fail.list_saved {
            Some(fail) => Err(fail.error()),
            None => Ok(s.links.clone()),
        }
    }

    async fn create_saved_trip(&self, request: &NewSavedTrip) -> ApiResult<SavedTripLink> {
        self.record(Call::CreateSaved(request.trip_id));
        let gate = self.state().gates.create_saved.take();
        Self::pass(gate).await;

        let mut s = self.state();
        let fail = s.fail.create_saved;
        match fail {
            None | Some(Fail::TimeoutAfterCommit) => {}
            Some(f) => return Err(f.error()),
        }
        if s.links.iter().any(|l| l.trip_id == request.trip_id) {
            return Err(ApiError::rejected(400, "Trip already saved"));
        }
        s.next_id += 1;
        let created = SavedTripLink {
            notes: request.notes.clone(),
            ..link(s.next_id, request.trip_id)
        };
        s.links.push(created.clone());
        match fail {
            Some(f) => Err(f.error()),
            None => Ok(created),
        }
    }

    async fn delete_saved_trip(&self, link_id: SavedTripId) -> ApiResult<()> {
        self.record(Call::DeleteSaved(link_id));
        let mut s = self.state();
        if let Some(fail) = s.fail.delete_saved {
            return Err(fail.error());
        }
        let before = s.links.len();
        s.links.retain(|l| l.id != link_id);
        if s.links.len() == before {
            return Err(ApiError::rejected(404, "Not Found"));
        }
        Ok(())
    }

    async fn update_saved_trip_notes(
        &self,
        link_id: SavedTripId,
        notes: &str,
    ) -> ApiResult<SavedTripLink> {
        self.record(Call::UpdateNotes(link_id));
        let mut s = self.state();
        if let Some(fail) = s.fail.update_notes {
            return Err(fail.error());
        }
        let link = s
            .links
            .iter_mut()
            .find(|l| l.id == link_id)
            .ok_or_else(|| ApiError::rejected(400, "Saved trip not found"))?;
        link.notes = notes.to_string();
        Ok(link.clone())
    }

    async fn hotel_recommendations(
        &self,
        trip_id: TripId,
    ) -> ApiResult<Vec<HotelRecommendation>> {
        self.record(Call::Hotels(trip_id));
        if let Some(fail) = self.state().fail.hotels {
            return Err(fail.error());
        }
        Ok(vec![HotelRecommendation {
            name: format!("Hotel for {trip_id}"),
            location: "Center".into(),
            rating: 4.0,
            ..Default::default()
        }])
    }

    async fn add_hotel_to_trip(&self, trip_id: TripId, hotel: &NewTripHotel) -> ApiResult<()> {
        self.record(Call::AddHotel(trip_id));
        let mut s = self.state();
        if let Some(fail) = s.fail.add_hotel {
            return Err(fail.error());
        }
        s.next_id += 1;
        let id = s.next_id;
        let trip = s
            .trips
            .iter_mut()
            .find(|t| t.id == Some(trip_id))
            .ok_or_else(|| ApiError::rejected(400, "Trip not found"))?;
        trip.hotels.push(TripHotel {
            id: Some(id),
            name: hotel.name.clone(),
            location: hotel.location.clone(),
            rating: hotel.rating,
            distance: hotel.distance,
            image_url: hotel.image_url.clone(),
            map_url: hotel.map_url.clone(),
        });
        Ok(())
    }
}
