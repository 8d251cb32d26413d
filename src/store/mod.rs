pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::DomainError;
use crate::models::driver::{AvailabilityStatus, DriverAvailability, UserRecord};
use crate::models::worklog::{Activity, BeaconStatus, WorkLog};

/// Filters the user directory supports, one variant per filter combination
/// the engine issues.
#[derive(Debug, Clone, Copy)]
pub enum UserQuery {
    /// User id constrained to driver accounts.
    DriverById(Uuid),
}

#[derive(Debug, Clone, Copy)]
pub enum WorkLogQuery {
    ById(Uuid),
    ByDriverAndDate {
        driver_id: Uuid,
        work_date: NaiveDate,
    },
}

#[derive(Debug, Clone)]
pub struct NewWorkLog {
    pub driver_id: Uuid,
    pub work_date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct NewActivity {
    pub work_log_id: Uuid,
    pub work_time: DateTime<Utc>,
    pub active: bool,
    pub status: BeaconStatus,
}

#[derive(Debug, Clone)]
pub struct AvailabilityUpsert {
    pub driver_id: Uuid,
    pub is_available: bool,
    pub status: AvailabilityStatus,
    pub connection_id: Option<Uuid>,
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_one(&self, query: UserQuery) -> Result<Option<UserRecord>, DomainError>;
}

#[async_trait]
pub trait WorkLogStore: Send + Sync {
    async fn find(&self, query: WorkLogQuery) -> Result<Option<WorkLog>, DomainError>;

    async fn create(&self, params: NewWorkLog) -> Result<WorkLog, DomainError>;

    /// Activities ordered by work time, oldest first.
    async fn activities(&self, work_log_id: Uuid) -> Result<Vec<Activity>, DomainError>;

    async fn append_activity(&self, params: NewActivity) -> Result<Uuid, DomainError>;
}

#[async_trait]
pub trait AvailabilityStore: Send + Sync {
    async fn find(&self, driver_id: Uuid) -> Result<Option<DriverAvailability>, DomainError>;

    async fn upsert(&self, params: AvailabilityUpsert) -> Result<u64, DomainError>;
}
