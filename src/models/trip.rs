use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order-scoped distance snapshot written for downstream consumers after
/// every accepted sample. Distance is in kilometers, rounded to two
/// decimals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripSnapshot {
    pub driver_id: Uuid,
    pub distance: f64,
}
