use std::sync::Arc;
use std::time::Duration;

use crate::cache::EphemeralStore;
use crate::config::Config;
use crate::engine::beacon::BeaconStateMachine;
use crate::engine::dispatch::DispatchMatcher;
use crate::engine::presence::PresenceTracker;
use crate::engine::tracker::TripDistanceAccumulator;
use crate::events::{BroadcastPublisher, EventPublisher};
use crate::gateway::SessionRegistry;
use crate::geo::GeoIndex;
use crate::observability::metrics::Metrics;
use crate::store::memory::{
    InMemoryAvailabilityStore, InMemoryUserDirectory, InMemoryWorkLogStore,
};
use crate::store::{AvailabilityStore, UserDirectory, WorkLogStore};

/// Durable-store and event-stream collaborators injected into the engines.
pub struct Collaborators {
    pub users: Arc<dyn UserDirectory>,
    pub work_logs: Arc<dyn WorkLogStore>,
    pub availability: Arc<dyn AvailabilityStore>,
    pub publisher: Arc<dyn EventPublisher>,
}

/// Handles onto the in-memory collaborator implementations, kept around for
/// seeding fixtures.
pub struct MemoryStores {
    pub users: Arc<InMemoryUserDirectory>,
    pub work_logs: Arc<InMemoryWorkLogStore>,
    pub availability: Arc<InMemoryAvailabilityStore>,
    pub publisher: Arc<BroadcastPublisher>,
}

pub struct AppState {
    pub beacon: BeaconStateMachine,
    pub presence: PresenceTracker,
    pub matcher: DispatchMatcher,
    pub tracker: TripDistanceAccumulator,
    pub sessions: Arc<SessionRegistry>,
    pub geo: Arc<GeoIndex>,
    pub cache: Arc<EphemeralStore>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(config: &Config, collaborators: Collaborators) -> Self {
        let metrics = Metrics::new();
        let geo = Arc::new(GeoIndex::new());
        let cache = Arc::new(EphemeralStore::new());
        let sessions = Arc::new(SessionRegistry::new());

        let beacon = BeaconStateMachine::new(
            collaborators.users.clone(),
            collaborators.work_logs.clone(),
            config.socket_endpoint.clone(),
            config.min_dwell_minutes,
            metrics.clone(),
        );
        let presence = PresenceTracker::new(
            cache.clone(),
            geo.clone(),
            collaborators.availability.clone(),
            sessions.clone(),
            collaborators.publisher.clone(),
            config.presence_mode,
            metrics.clone(),
        );
        let matcher = DispatchMatcher::new(
            geo.clone(),
            cache.clone(),
            collaborators.availability.clone(),
            sessions.clone(),
            Duration::from_secs(config.offer_ttl_secs),
            config.nearest_limit,
            metrics.clone(),
        );
        let tracker =
            TripDistanceAccumulator::new(cache.clone(), Duration::from_secs(config.sample_ttl_secs));

        Self {
            beacon,
            presence,
            matcher,
            tracker,
            sessions,
            geo,
            cache,
            metrics,
        }
    }

    /// Wire the service against in-process stores.
    pub fn in_memory(config: &Config) -> (Self, MemoryStores) {
        let stores = MemoryStores {
            users: Arc::new(InMemoryUserDirectory::new()),
            work_logs: Arc::new(InMemoryWorkLogStore::new()),
            availability: Arc::new(InMemoryAvailabilityStore::new()),
            publisher: Arc::new(BroadcastPublisher::new(config.event_buffer_size)),
        };
        let state = Self::new(
            config,
            Collaborators {
                users: stores.users.clone(),
                work_logs: stores.work_logs.clone(),
                availability: stores.availability.clone(),
                publisher: stores.publisher.clone(),
            },
        );
        (state, stores)
    }
}
