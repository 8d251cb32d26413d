use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Read-only view of a user row, as seen by the eligibility gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: Uuid,
    pub full_name: String,
    pub is_driver: bool,
    pub is_verified: bool,
    pub is_completed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityStatus {
    Online,
    Offline,
}

/// Current availability and connection binding for one driver. `is_available`
/// records product-facing status; dispatch reachability is GeoIndex
/// membership.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverAvailability {
    pub driver_id: Uuid,
    pub is_available: bool,
    pub status: AvailabilityStatus,
    pub connection_id: Option<Uuid>,
    pub last_seen_at: DateTime<Utc>,
}
