//! Hotel recommendations view, the consumer side of the hotel handoff.

use std::sync::Arc;

use tripsync_client::TripApi;
use tripsync_core::error::CoreError;
use tripsync_core::hotel::{HotelRecommendation, NewTripHotel};
use tripsync_core::types::TripId;
use tripsync_events::HotelHandoff;

use crate::error::{Operation, SessionError};

/// Recommendations for the trip most recently handed to this view.
pub struct HotelRecommendations {
    api: Arc<dyn TripApi>,
    handoff: Arc<HotelHandoff>,
    trip_id: Option<TripId>,
    hotels: Vec<HotelRecommendation>,
}

impl HotelRecommendations {
    pub fn new(api: Arc<dyn TripApi>, handoff: Arc<HotelHandoff>) -> Self {
        Self {
            api,
            handoff,
            trip_id: None,
            hotels: Vec::new(),
        }
    }

    /// Take a pending handoff, if any, and load recommendations for it.
    ///
    /// The handoff is consumed, so mounting again does not repeat it.
    pub async fn mount(&mut self) -> Result<Option<TripId>, SessionError> {
        match self.handoff.take() {
            Some(trip_id) => {
                self.load_for(trip_id).await?;
                Ok(Some(trip_id))
            }
            None => Ok(None),
        }
    }

    /// Wait for the next handoff while mounted, then load for it.
    pub async fn next_handoff(&mut self) -> Result<TripId, SessionError> {
        let trip_id = self.handoff.recv().await;
        self.load_for(trip_id).await?;
        Ok(trip_id)
    }

    /// Fetch recommendations for a trip, replacing the current list.
    pub async fn load_for(
        &mut self,
        trip_id: TripId,
    ) -> Result<&[HotelRecommendation], SessionError> {
        self.trip_id = Some(trip_id);
        match self.api.hotel_recommendations(trip_id).await {
            Ok(hotels) => {
                tracing::info!(trip_id, count = hotels.len(), "Hotel recommendations loaded");
                self.hotels = hotels;
                Ok(&self.hotels)
            }
            Err(e) => {
                tracing::warn!(trip_id, error = %e, "Failed to load hotel recommendations");
                self.hotels.clear();
                Err(SessionError::api(Operation::HotelRecommendations, e))
            }
        }
    }

    /// Add a recommended hotel to the trip this view is showing.
    ///
    /// The distance stored on the trip is the hotel's average distance.
    pub async fn add_to_trip(&self, hotel: &HotelRecommendation) -> Result<(), SessionError> {
        let trip_id = self
            .trip_id
            .ok_or_else(|| CoreError::Validation("No trip selected for hotels".into()))?;
        match self
            .api
            .add_hotel_to_trip(trip_id, &NewTripHotel::from(hotel))
            .await
        {
            Ok(()) => {
                tracing::info!(trip_id, hotel = %hotel.name, "Hotel added to trip");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(trip_id, hotel = %hotel.name, error = %e, "Failed to add hotel");
                Err(SessionError::api(Operation::AddHotel, e))
            }
        }
    }

    pub fn trip_id(&self) -> Option<TripId> {
        self.trip_id
    }

    pub fn hotels(&self) -> &[HotelRecommendation] {
        &self.hotels
    }
}
