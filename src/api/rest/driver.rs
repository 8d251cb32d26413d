use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::beacon::BeaconOutcome;
use crate::error::DomainError;
use crate::models::driver::GeoPoint;
use crate::models::worklog::BeaconStatus;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/driver/beacon", post(activate_beacon))
        .route("/driver/location", post(location_update))
}

#[derive(Deserialize)]
pub struct BeaconRequest {
    pub driver_id: Uuid,
    pub status: BeaconStatus,
}

async fn activate_beacon(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BeaconRequest>,
) -> Result<Json<BeaconOutcome>, DomainError> {
    let outcome = state
        .beacon
        .activate_beacon(payload.driver_id, payload.status)
        .await?;
    Ok(Json(outcome))
}

#[derive(Deserialize)]
pub struct LocationUpdateRequest {
    pub driver_id: Uuid,
    pub connection_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Serialize)]
pub struct LocationAck {
    pub position: GeoPoint,
}

async fn location_update(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LocationUpdateRequest>,
) -> Result<Json<LocationAck>, DomainError> {
    let position = state
        .presence
        .location_update(
            payload.driver_id,
            payload.connection_id,
            GeoPoint {
                lat: payload.latitude,
                lng: payload.longitude,
            },
        )
        .await?;
    Ok(Json(LocationAck { position }))
}
