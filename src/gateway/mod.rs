use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::DomainError;
use crate::models::offer::RouteSummary;

/// Events pushed to a driver's live connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum PushEvent {
    Connected {
        connection_id: Uuid,
    },
    PickupPassenger {
        route_summary: RouteSummary,
        passenger_id: Uuid,
    },
}

#[async_trait]
pub trait ConnectionGateway: Send + Sync {
    fn is_live(&self, connection_id: Uuid) -> bool;

    async fn push(&self, connection_id: Uuid, event: PushEvent) -> Result<(), DomainError>;
}

/// Process-local registry of live driver sessions. Injected into the
/// engines rather than living in a process-wide global.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<Uuid, mpsc::UnboundedSender<PushEvent>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, sender: mpsc::UnboundedSender<PushEvent>) -> Uuid {
        let connection_id = Uuid::new_v4();
        self.sessions.insert(connection_id, sender);
        connection_id
    }

    pub fn unregister(&self, connection_id: Uuid) {
        self.sessions.remove(&connection_id);
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl ConnectionGateway for SessionRegistry {
    fn is_live(&self, connection_id: Uuid) -> bool {
        self.sessions
            .get(&connection_id)
            .is_some_and(|sender| !sender.is_closed())
    }

    async fn push(&self, connection_id: Uuid, event: PushEvent) -> Result<(), DomainError> {
        let sender = self.sessions.get(&connection_id).ok_or_else(|| {
            DomainError::Internal(format!("connection {connection_id} not registered"))
        })?;
        sender
            .send(event)
            .map_err(|err| DomainError::Internal(format!("push to {connection_id} failed: {err}")))
    }
}
