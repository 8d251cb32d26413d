use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use super::{
    AvailabilityStore, AvailabilityUpsert, NewActivity, NewWorkLog, UserDirectory, UserQuery,
    WorkLogQuery, WorkLogStore,
};
use crate::error::DomainError;
use crate::models::driver::{DriverAvailability, UserRecord};
use crate::models::worklog::{Activity, WorkLog};

#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: DashMap<Uuid, UserRecord>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, user: UserRecord) {
        self.users.insert(user.user_id, user);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_one(&self, query: UserQuery) -> Result<Option<UserRecord>, DomainError> {
        match query {
            UserQuery::DriverById(user_id) => Ok(self
                .users
                .get(&user_id)
                .filter(|user| user.is_driver)
                .map(|user| user.value().clone())),
        }
    }
}

/// Activity lists keep insertion order, which is creation-time order.
#[derive(Default)]
pub struct InMemoryWorkLogStore {
    logs: DashMap<Uuid, WorkLog>,
    activities: DashMap<Uuid, Vec<Activity>>,
}

impl InMemoryWorkLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test seam: record an activity directly, bypassing the state machine
    /// guards, so histories can be backdated.
    pub fn seed_activity(&self, activity: Activity) {
        self.activities
            .entry(activity.work_log_id)
            .or_default()
            .push(activity);
    }
}

#[async_trait]
impl WorkLogStore for InMemoryWorkLogStore {
    async fn find(&self, query: WorkLogQuery) -> Result<Option<WorkLog>, DomainError> {
        let found = match query {
            WorkLogQuery::ById(id) => self.logs.get(&id).map(|log| log.value().clone()),
            WorkLogQuery::ByDriverAndDate {
                driver_id,
                work_date,
            } => self
                .logs
                .iter()
                .find(|log| log.driver_id == driver_id && log.work_date == work_date)
                .map(|log| log.value().clone()),
        };
        Ok(found)
    }

    async fn create(&self, params: NewWorkLog) -> Result<WorkLog, DomainError> {
        let log = WorkLog {
            id: Uuid::new_v4(),
            driver_id: params.driver_id,
            work_date: params.work_date,
            created_at: Utc::now(),
        };
        self.logs.insert(log.id, log.clone());
        Ok(log)
    }

    async fn activities(&self, work_log_id: Uuid) -> Result<Vec<Activity>, DomainError> {
        Ok(self
            .activities
            .get(&work_log_id)
            .map(|list| list.value().clone())
            .unwrap_or_default())
    }

    async fn append_activity(&self, params: NewActivity) -> Result<Uuid, DomainError> {
        let activity = Activity {
            id: Uuid::new_v4(),
            work_log_id: params.work_log_id,
            work_time: params.work_time,
            active: params.active,
            status: params.status,
        };
        let id = activity.id;
        self.activities
            .entry(params.work_log_id)
            .or_default()
            .push(activity);
        Ok(id)
    }
}

#[derive(Default)]
pub struct InMemoryAvailabilityStore {
    records: DashMap<Uuid, DriverAvailability>,
}

impl InMemoryAvailabilityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, driver_id: Uuid) -> Option<DriverAvailability> {
        self.records.get(&driver_id).map(|record| record.value().clone())
    }

    pub fn insert(&self, record: DriverAvailability) {
        self.records.insert(record.driver_id, record);
    }
}

#[async_trait]
impl AvailabilityStore for InMemoryAvailabilityStore {
    async fn find(&self, driver_id: Uuid) -> Result<Option<DriverAvailability>, DomainError> {
        Ok(self.records.get(&driver_id).map(|record| record.value().clone()))
    }

    async fn upsert(&self, params: AvailabilityUpsert) -> Result<u64, DomainError> {
        let record = DriverAvailability {
            driver_id: params.driver_id,
            is_available: params.is_available,
            status: params.status,
            connection_id: params.connection_id,
            last_seen_at: Utc::now(),
        };
        self.records.insert(params.driver_id, record);
        Ok(1)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::{InMemoryUserDirectory, InMemoryWorkLogStore};
    use crate::models::driver::UserRecord;
    use crate::models::worklog::BeaconStatus;
    use crate::store::{NewActivity, NewWorkLog, UserDirectory, UserQuery, WorkLogQuery, WorkLogStore};

    fn user(user_id: Uuid, is_driver: bool) -> UserRecord {
        UserRecord {
            user_id,
            full_name: "Test User".to_string(),
            is_driver,
            is_verified: true,
            is_completed: true,
        }
    }

    #[tokio::test]
    async fn driver_query_excludes_non_driver_accounts() {
        let directory = InMemoryUserDirectory::new();
        let passenger_id = Uuid::new_v4();
        directory.insert(user(passenger_id, false));

        let found = directory
            .find_one(UserQuery::DriverById(passenger_id))
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn work_log_lookup_by_driver_and_date() {
        let store = InMemoryWorkLogStore::new();
        let driver_id = Uuid::new_v4();
        let work_date = Utc::now().date_naive();

        let created = store
            .create(NewWorkLog {
                driver_id,
                work_date,
            })
            .await
            .unwrap();

        let by_date = store
            .find(WorkLogQuery::ByDriverAndDate {
                driver_id,
                work_date,
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_date.id, created.id);

        let by_id = store.find(WorkLogQuery::ById(created.id)).await.unwrap();
        assert!(by_id.is_some());
    }

    #[tokio::test]
    async fn activities_come_back_in_append_order() {
        let store = InMemoryWorkLogStore::new();
        let work_log = store
            .create(NewWorkLog {
                driver_id: Uuid::new_v4(),
                work_date: Utc::now().date_naive(),
            })
            .await
            .unwrap();

        for status in [BeaconStatus::Work, BeaconStatus::Rest, BeaconStatus::Work] {
            store
                .append_activity(NewActivity {
                    work_log_id: work_log.id,
                    work_time: Utc::now(),
                    active: status.is_active(),
                    status,
                })
                .await
                .unwrap();
        }

        let history = store.activities(work_log.id).await.unwrap();
        assert_eq!(history.len(), 3);
        assert!(history.windows(2).all(|pair| pair[0].work_time <= pair[1].work_time));
        assert_eq!(history[0].status, BeaconStatus::Work);
        assert_eq!(history[1].status, BeaconStatus::Rest);
    }
}
