use dashmap::DashMap;
use uuid::Uuid;

use crate::models::driver::GeoPoint;

const EARTH_RADIUS_KM: f64 = 6_371.0;

pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_KM * central_angle
}

/// Current driver positions. Membership here is what makes a driver
/// reachable for dispatch, independent of the durable availability flag.
pub struct GeoIndex {
    positions: DashMap<Uuid, GeoPoint>,
}

impl GeoIndex {
    pub fn new() -> Self {
        Self {
            positions: DashMap::new(),
        }
    }

    pub fn upsert(&self, driver_id: Uuid, position: GeoPoint) {
        self.positions.insert(driver_id, position);
    }

    pub fn remove(&self, driver_id: Uuid) {
        self.positions.remove(&driver_id);
    }

    pub fn position(&self, driver_id: Uuid) -> Option<GeoPoint> {
        self.positions.get(&driver_id).map(|entry| *entry.value())
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Up to `limit` drivers around `origin`, closest first, with the
    /// distance to each in kilometers.
    pub fn nearest(&self, origin: &GeoPoint, limit: usize) -> Vec<(Uuid, f64)> {
        let mut candidates: Vec<(Uuid, f64)> = self
            .positions
            .iter()
            .map(|entry| (*entry.key(), haversine_km(origin, entry.value())))
            .collect();

        candidates.sort_by(|a, b| a.1.total_cmp(&b.1));
        candidates.truncate(limit);
        candidates
    }
}

impl Default for GeoIndex {
    fn default() -> Self {
        Self::new()
    }
}
