use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;
use crate::models::driver::GeoPoint;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/trip/track", post(track))
}

#[derive(Deserialize)]
pub struct TrackRequest {
    pub order_id: Uuid,
    pub driver_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Serialize)]
pub struct TrackResponse {
    pub driver_id: Uuid,
    pub distance_km: f64,
}

async fn track(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TrackRequest>,
) -> Result<Json<TrackResponse>, DomainError> {
    let distance_km = state.tracker.trip_tracker(
        payload.order_id,
        payload.driver_id,
        GeoPoint {
            lat: payload.latitude,
            lng: payload.longitude,
        },
    )?;
    Ok(Json(TrackResponse {
        driver_id: payload.driver_id,
        distance_km,
    }))
}
