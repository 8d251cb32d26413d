use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declared on/off-duty intent carried by a beacon request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BeaconStatus {
    Work,
    Rest,
}

impl BeaconStatus {
    pub fn is_active(self) -> bool {
        self == BeaconStatus::Work
    }
}

/// One per (driver, calendar date), created lazily on the first beacon
/// activation of the day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkLog {
    pub id: Uuid,
    pub driver_id: Uuid,
    pub work_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Timestamped snapshot of a driver's duty state. Immutable once appended;
/// a work log's activities are never reordered or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: Uuid,
    pub work_log_id: Uuid,
    pub work_time: DateTime<Utc>,
    pub active: bool,
    pub status: BeaconStatus,
}
