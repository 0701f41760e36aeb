//! Hotel recommendations returned by `GET /api/hotels/recommendations`,
//! and the request body for adding one to a trip.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::wire::null_as_default;

/// A hotel suggested for a trip, ranked by the backend.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelRecommendation {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub location: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rating: f64,
    /// Mean distance to the trip's destinations, in kilometres.
    #[serde(default, deserialize_with = "null_as_default")]
    pub average_distance: f64,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Distance to each destination, keyed by destination name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub distances_from_destinations: BTreeMap<String, f64>,
    #[serde(default)]
    pub map_url: Option<String>,
}

/// Request body for `POST /api/trips/{trip_id}/hotels`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTripHotel {
    pub name: String,
    pub location: String,
    pub rating: f64,
    pub image_url: Option<String>,
    /// Kilometres; taken from the recommendation's average distance.
    pub distance: f64,
    pub map_url: Option<String>,
}

impl From<&HotelRecommendation> for NewTripHotel {
    fn from(hotel: &HotelRecommendation) -> Self {
        let distance = if hotel.average_distance.is_finite() {
            hotel.average_distance
        } else {
            0.0
        };
        Self {
            name: hotel.name.clone(),
            location: hotel.location.clone(),
            rating: hotel.rating,
            image_url: hotel.image_url.clone(),
            distance,
            map_url: hotel.map_url.clone(),
        }
    }
}
