use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::DomainError;
use crate::models::worklog::{BeaconStatus, WorkLog};
use crate::observability::metrics::Metrics;
use crate::store::{NewActivity, NewWorkLog, UserDirectory, UserQuery, WorkLogQuery, WorkLogStore};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "beacon", rename_all = "lowercase")]
pub enum BeaconOutcome {
    /// Driver went on duty; hand back the live dispatch endpoint.
    Dispatching { endpoint: String },
    /// Driver went off duty.
    Resting,
}

/// Guarded on/off-duty state machine over the append-only per-day activity
/// history. A transition is rejected when it repeats the last recorded state
/// or deactivates before the minimum dwell has elapsed.
pub struct BeaconStateMachine {
    users: Arc<dyn UserDirectory>,
    work_logs: Arc<dyn WorkLogStore>,
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
    socket_endpoint: String,
    min_dwell: Duration,
    metrics: Metrics,
}

impl BeaconStateMachine {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        work_logs: Arc<dyn WorkLogStore>,
        socket_endpoint: String,
        min_dwell_minutes: i64,
        metrics: Metrics,
    ) -> Self {
        Self {
            users,
            work_logs,
            locks: DashMap::new(),
            socket_endpoint,
            min_dwell: Duration::minutes(min_dwell_minutes),
            metrics,
        }
    }

    pub async fn activate_beacon(
        &self,
        driver_id: Uuid,
        status: BeaconStatus,
    ) -> Result<BeaconOutcome, DomainError> {
        let result = self.transition(driver_id, status).await;
        let outcome = match &result {
            Ok(BeaconOutcome::Dispatching { .. }) => "dispatching",
            Ok(BeaconOutcome::Resting) => "resting",
            Err(_) => "rejected",
        };
        self.metrics
            .beacon_transitions_total
            .with_label_values(&[outcome])
            .inc();
        result
    }

    async fn transition(
        &self,
        driver_id: Uuid,
        status: BeaconStatus,
    ) -> Result<BeaconOutcome, DomainError> {
        // The read-guard-append sequence below is only correct if requests
        // for the same driver never interleave.
        let lock = self
            .locks
            .entry(driver_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _serialized = lock.lock().await;

        let driver = self
            .users
            .find_one(UserQuery::DriverById(driver_id))
            .await?
            .ok_or(DomainError::DriverNotFound)?;

        if !driver.is_verified || !driver.is_completed {
            warn!(driver_id = %driver_id, "driver not verified or completed");
            return Err(DomainError::NotEligible);
        }

        let now = Utc::now();
        let work_log = self.resolve_work_log(driver_id, now).await?;
        let history = self.work_logs.activities(work_log.id).await?;

        let active = status.is_active();

        if let Some(last) = history.last() {
            if last.active == active && last.status == status {
                info!(driver_id = %driver_id, ?status, "transition matches last activity");
                return Err(DomainError::DuplicateTransition);
            }
            let dwelled = now.signed_duration_since(last.work_time);
            if dwelled < self.min_dwell && !active {
                return Err(DomainError::DwellTooShort(self.min_dwell.num_minutes()));
            }
        }

        self.work_logs
            .append_activity(NewActivity {
                work_log_id: work_log.id,
                work_time: now,
                active,
                status,
            })
            .await
            .map_err(|err| DomainError::ActivityInsert(err.to_string()))?;

        info!(driver_id = %driver_id, active, "beacon transition recorded");

        if active {
            Ok(BeaconOutcome::Dispatching {
                endpoint: format!("{}?driver={}", self.socket_endpoint, driver_id),
            })
        } else {
            Ok(BeaconOutcome::Resting)
        }
    }

    async fn resolve_work_log(
        &self,
        driver_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<WorkLog, DomainError> {
        let work_date = now.date_naive();
        let query = WorkLogQuery::ByDriverAndDate {
            driver_id,
            work_date,
        };
        if let Some(work_log) = self.work_logs.find(query).await? {
            return Ok(work_log);
        }
        info!(driver_id = %driver_id, %work_date, "no work log for today, creating one");
        self.work_logs
            .create(NewWorkLog {
                driver_id,
                work_date,
            })
            .await
            .map_err(|err| DomainError::WorkLogCreate(err.to_string()))
    }
}
