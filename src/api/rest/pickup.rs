use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::dispatch::DispatchAck;
use crate::error::DomainError;
use crate::models::offer::RouteSummary;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/pickup/broadcast", post(broadcast_pickup))
}

#[derive(Deserialize)]
pub struct BroadcastRequest {
    pub passenger_id: Uuid,
    pub route_summary: RouteSummary,
}

async fn broadcast_pickup(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BroadcastRequest>,
) -> Result<Json<DispatchAck>, DomainError> {
    let ack = state
        .matcher
        .broadcast_pickup_passenger(payload.passenger_id, payload.route_summary)
        .await?;
    Ok(Json(ack))
}
