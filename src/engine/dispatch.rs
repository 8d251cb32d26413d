use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cache::EphemeralStore;
use crate::engine::presence::pickup_offer_key;
use crate::error::DomainError;
use crate::gateway::{ConnectionGateway, PushEvent};
use crate::geo::GeoIndex;
use crate::models::offer::{PickupOffer, RouteSummary};
use crate::observability::metrics::Metrics;
use crate::store::AvailabilityStore;

#[derive(Debug, Clone, Serialize)]
pub struct DispatchAck {
    pub driver_id: Uuid,
    pub distance_km: f64,
    pub delivered_live: bool,
}

/// Nearest-first sequential offer assignment. At most one offer per
/// broadcast; the loop stops at the first available candidate so a passenger
/// is never double-booked across drivers.
pub struct DispatchMatcher {
    geo: Arc<GeoIndex>,
    cache: Arc<EphemeralStore>,
    availability: Arc<dyn AvailabilityStore>,
    gateway: Arc<dyn ConnectionGateway>,
    offer_ttl: Duration,
    nearest_limit: usize,
    metrics: Metrics,
}

impl DispatchMatcher {
    pub fn new(
        geo: Arc<GeoIndex>,
        cache: Arc<EphemeralStore>,
        availability: Arc<dyn AvailabilityStore>,
        gateway: Arc<dyn ConnectionGateway>,
        offer_ttl: Duration,
        nearest_limit: usize,
        metrics: Metrics,
    ) -> Self {
        Self {
            geo,
            cache,
            availability,
            gateway,
            offer_ttl,
            nearest_limit,
            metrics,
        }
    }

    pub async fn broadcast_pickup_passenger(
        &self,
        passenger_id: Uuid,
        route_summary: RouteSummary,
    ) -> Result<DispatchAck, DomainError> {
        let start = Instant::now();
        let result = self.assign(passenger_id, route_summary).await;

        let outcome = if result.is_ok() { "offered" } else { "rejected" };
        self.metrics
            .dispatch_latency_seconds
            .with_label_values(&[outcome])
            .observe(start.elapsed().as_secs_f64());
        self.metrics
            .dispatch_offers_total
            .with_label_values(&[outcome])
            .inc();

        result
    }

    async fn assign(
        &self,
        passenger_id: Uuid,
        route_summary: RouteSummary,
    ) -> Result<DispatchAck, DomainError> {
        let candidates = self.geo.nearest(&route_summary.origin, self.nearest_limit);
        if candidates.is_empty() {
            info!(passenger_id = %passenger_id, "no drivers found nearby");
            return Err(DomainError::NoDriversNearby);
        }

        for (driver_id, distance_km) in candidates {
            let availability = match self.availability.find(driver_id).await {
                Ok(Some(availability)) => availability,
                Ok(None) => {
                    warn!(driver_id = %driver_id, "candidate has no availability record");
                    continue;
                }
                Err(err) => {
                    warn!(driver_id = %driver_id, error = %err, "availability lookup failed");
                    continue;
                }
            };
            if !availability.is_available {
                info!(driver_id = %driver_id, "candidate not available");
                continue;
            }

            let offer = PickupOffer {
                driver_id,
                passenger_id,
                route_summary: route_summary.clone(),
                connection_id: availability.connection_id,
            };
            // Stored in either branch so a missed push is recovered on the
            // driver's next location update.
            self.cache
                .set_ex(&pickup_offer_key(driver_id), &offer, self.offer_ttl)?;

            let delivered_live = match availability.connection_id {
                Some(connection_id) if self.gateway.is_live(connection_id) => {
                    let event = PushEvent::PickupPassenger {
                        route_summary: offer.route_summary.clone(),
                        passenger_id,
                    };
                    match self.gateway.push(connection_id, event).await {
                        Ok(()) => true,
                        Err(err) => {
                            warn!(driver_id = %driver_id, error = %err, "offer push failed, left for redelivery");
                            false
                        }
                    }
                }
                _ => false,
            };

            info!(
                driver_id = %driver_id,
                passenger_id = %passenger_id,
                distance_km,
                delivered_live,
                "pickup offer issued"
            );
            return Ok(DispatchAck {
                driver_id,
                distance_km,
                delivered_live,
            });
        }

        info!(passenger_id = %passenger_id, "no available drivers in nearest set");
        Err(DomainError::NoDriversNearby)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::Utc;
    use tokio::sync::mpsc;
    use uuid::Uuid;

    use super::DispatchMatcher;
    use crate::cache::EphemeralStore;
    use crate::engine::presence::pickup_offer_key;
    use crate::error::DomainError;
    use crate::gateway::{PushEvent, SessionRegistry};
    use crate::geo::GeoIndex;
    use crate::models::driver::{AvailabilityStatus, DriverAvailability, GeoPoint};
    use crate::models::offer::{PickupOffer, RouteSummary};
    use crate::observability::metrics::Metrics;
    use crate::store::memory::InMemoryAvailabilityStore;

    struct Fixture {
        matcher: DispatchMatcher,
        geo: Arc<GeoIndex>,
        cache: Arc<EphemeralStore>,
        availability: Arc<InMemoryAvailabilityStore>,
        sessions: Arc<SessionRegistry>,
    }

    fn fixture() -> Fixture {
        let geo = Arc::new(GeoIndex::new());
        let cache = Arc::new(EphemeralStore::new());
        let availability = Arc::new(InMemoryAvailabilityStore::new());
        let sessions = Arc::new(SessionRegistry::new());
        let matcher = DispatchMatcher::new(
            geo.clone(),
            cache.clone(),
            availability.clone(),
            sessions.clone(),
            Duration::from_secs(300),
            3,
            Metrics::new(),
        );
        Fixture {
            matcher,
            geo,
            cache,
            availability,
            sessions,
        }
    }

    fn route() -> RouteSummary {
        RouteSummary {
            origin: GeoPoint { lat: -6.2, lng: 106.8 },
            destination: GeoPoint { lat: -6.3, lng: 106.9 },
        }
    }

    fn seed_candidate(
        fixture: &Fixture,
        offset: f64,
        is_available: bool,
        connection_id: Option<Uuid>,
    ) -> Uuid {
        let driver_id = Uuid::new_v4();
        fixture.geo.upsert(
            driver_id,
            GeoPoint {
                lat: -6.2 + offset,
                lng: 106.8,
            },
        );
        fixture.availability.insert(DriverAvailability {
            driver_id,
            is_available,
            status: AvailabilityStatus::Online,
            connection_id,
            last_seen_at: Utc::now(),
        });
        driver_id
    }

    #[tokio::test]
    async fn empty_index_yields_not_found() {
        let fixture = fixture();

        let err = fixture
            .matcher
            .broadcast_pickup_passenger(Uuid::new_v4(), route())
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::NoDriversNearby));
        assert_eq!(err.code(), 4004);
    }

    #[tokio::test]
    async fn first_available_candidate_wins() {
        let fixture = fixture();
        let nearest = seed_candidate(&fixture, 0.001, false, None);
        let second = seed_candidate(&fixture, 0.002, true, None);
        let third = seed_candidate(&fixture, 0.003, true, None);

        let ack = fixture
            .matcher
            .broadcast_pickup_passenger(Uuid::new_v4(), route())
            .await
            .unwrap();

        assert_eq!(ack.driver_id, second);
        assert!(!ack.delivered_live);

        let stored: Option<PickupOffer> =
            fixture.cache.get(&pickup_offer_key(second)).unwrap();
        assert!(stored.is_some());

        // No offers for the skipped nearest or the never-reached third.
        let nearest_offer: Option<PickupOffer> =
            fixture.cache.get(&pickup_offer_key(nearest)).unwrap();
        let third_offer: Option<PickupOffer> =
            fixture.cache.get(&pickup_offer_key(third)).unwrap();
        assert!(nearest_offer.is_none());
        assert!(third_offer.is_none());
    }

    #[tokio::test]
    async fn all_candidates_unavailable_yields_not_found() {
        let fixture = fixture();
        for offset in [0.001, 0.002, 0.003] {
            seed_candidate(&fixture, offset, false, None);
        }

        let err = fixture
            .matcher
            .broadcast_pickup_passenger(Uuid::new_v4(), route())
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::NoDriversNearby));
    }

    #[tokio::test]
    async fn candidate_without_availability_record_is_skipped() {
        let fixture = fixture();
        let unknown = Uuid::new_v4();
        fixture.geo.upsert(unknown, GeoPoint { lat: -6.2001, lng: 106.8 });
        let fallback = seed_candidate(&fixture, 0.002, true, None);

        let ack = fixture
            .matcher
            .broadcast_pickup_passenger(Uuid::new_v4(), route())
            .await
            .unwrap();

        assert_eq!(ack.driver_id, fallback);
    }

    #[tokio::test]
    async fn live_connection_gets_the_offer_pushed() {
        let fixture = fixture();
        let passenger_id = Uuid::new_v4();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let connection_id = fixture.sessions.register(tx);
        let driver_id = seed_candidate(&fixture, 0.001, true, Some(connection_id));

        let ack = fixture
            .matcher
            .broadcast_pickup_passenger(passenger_id, route())
            .await
            .unwrap();

        assert_eq!(ack.driver_id, driver_id);
        assert!(ack.delivered_live);

        match rx.try_recv().unwrap() {
            PushEvent::PickupPassenger {
                passenger_id: delivered,
                ..
            } => assert_eq!(delivered, passenger_id),
            other => panic!("unexpected event: {other:?}"),
        }

        // Offer also persisted for redelivery in case the push was missed.
        let stored: Option<PickupOffer> =
            fixture.cache.get(&pickup_offer_key(driver_id)).unwrap();
        assert_eq!(stored.unwrap().passenger_id, passenger_id);
    }

    #[tokio::test]
    async fn dead_connection_defers_delivery() {
        let fixture = fixture();

        let (tx, rx) = mpsc::unbounded_channel();
        let connection_id = fixture.sessions.register(tx);
        drop(rx);
        let driver_id = seed_candidate(&fixture, 0.001, true, Some(connection_id));

        let ack = fixture
            .matcher
            .broadcast_pickup_passenger(Uuid::new_v4(), route())
            .await
            .unwrap();

        assert_eq!(ack.driver_id, driver_id);
        assert!(!ack.delivered_live);

        let stored: Option<PickupOffer> =
            fixture.cache.get(&pickup_offer_key(driver_id)).unwrap();
        assert!(stored.is_some());
    }
}
