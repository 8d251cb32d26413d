use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cache::EphemeralStore;
use crate::config::PresenceMode;
use crate::error::DomainError;
use crate::events::EventPublisher;
use crate::gateway::{ConnectionGateway, PushEvent};
use crate::geo::GeoIndex;
use crate::models::driver::{AvailabilityStatus, GeoPoint};
use crate::models::offer::PickupOffer;
use crate::observability::metrics::Metrics;
use crate::store::{AvailabilityStore, AvailabilityUpsert};

/// Advisory marker set by the claim flow while a driver is mid-handling a
/// pickup. Expiry is the only release.
pub fn idle_claim_key(driver_id: Uuid) -> String {
    format!("DRIVER:PICKING-PASSENGER:{driver_id}")
}

pub fn pickup_offer_key(driver_id: Uuid) -> String {
    format!("PASSENGER:PICKUP:{driver_id}")
}

/// Ingest path for driver position samples: refreshes the geo index and the
/// availability record, and redelivers a pending offer over the connection
/// that just reported in.
pub struct PresenceTracker {
    cache: Arc<EphemeralStore>,
    geo: Arc<GeoIndex>,
    availability: Arc<dyn AvailabilityStore>,
    gateway: Arc<dyn ConnectionGateway>,
    publisher: Arc<dyn EventPublisher>,
    mode: PresenceMode,
    metrics: Metrics,
}

impl PresenceTracker {
    pub fn new(
        cache: Arc<EphemeralStore>,
        geo: Arc<GeoIndex>,
        availability: Arc<dyn AvailabilityStore>,
        gateway: Arc<dyn ConnectionGateway>,
        publisher: Arc<dyn EventPublisher>,
        mode: PresenceMode,
        metrics: Metrics,
    ) -> Self {
        Self {
            cache,
            geo,
            availability,
            gateway,
            publisher,
            mode,
            metrics,
        }
    }

    pub async fn location_update(
        &self,
        driver_id: Uuid,
        connection_id: Uuid,
        position: GeoPoint,
    ) -> Result<GeoPoint, DomainError> {
        if self.cache.exists(&idle_claim_key(driver_id)) {
            return Err(DomainError::DriverMidClaim);
        }

        // An offer stored while the driver had no live session goes out over
        // the connection that just reported in.
        if let Some(offer) = self.cache.get::<PickupOffer>(&pickup_offer_key(driver_id))? {
            let event = PushEvent::PickupPassenger {
                route_summary: offer.route_summary,
                passenger_id: offer.passenger_id,
            };
            if let Err(err) = self.gateway.push(connection_id, event).await {
                warn!(driver_id = %driver_id, error = %err, "pending offer redelivery failed");
            }
        }

        self.geo.upsert(driver_id, position);
        self.metrics
            .tracked_driver_locations
            .set(self.geo.len() as i64);

        if matches!(self.mode, PresenceMode::Upsert | PresenceMode::Both) {
            self.availability
                .upsert(AvailabilityUpsert {
                    driver_id,
                    is_available: true,
                    status: AvailabilityStatus::Online,
                    connection_id: Some(connection_id),
                })
                .await?;
        }
        if matches!(self.mode, PresenceMode::Publish | PresenceMode::Both) {
            self.publisher
                .publish(
                    "driver-available",
                    json!({
                        "driverId": driver_id,
                        "connectionId": connection_id,
                        "latitude": position.lat,
                        "longitude": position.lng,
                    }),
                )
                .await;
        }

        info!(driver_id = %driver_id, "driver position refreshed");
        Ok(position)
    }
}
