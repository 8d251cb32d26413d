use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::driver::GeoPoint;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub origin: GeoPoint,
    pub destination: GeoPoint,
}

/// Reserved pickup proposal for one driver, held in the ephemeral store
/// until the driver's session confirms it or the entry expires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickupOffer {
    pub driver_id: Uuid,
    pub passenger_id: Uuid,
    pub route_summary: RouteSummary,
    pub connection_id: Option<Uuid>,
}
