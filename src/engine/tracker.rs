use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use uuid::Uuid;

use crate::cache::EphemeralStore;
use crate::error::DomainError;
use crate::geo::haversine_km;
use crate::models::driver::GeoPoint;
use crate::models::trip::TripSnapshot;

fn sample_key(order_id: Uuid, driver_id: Uuid) -> String {
    format!("order:{order_id}:driver:{driver_id}")
}

fn distance_key(order_id: Uuid) -> String {
    format!("order:{order_id}:distance")
}

fn snapshot_key(order_id: Uuid) -> String {
    format!("trip:{order_id}")
}

/// Incremental per-(order, driver) travel distance from streamed position
/// samples. The last sample is the baseline for the next delta and lives
/// only for a short window; after it expires the next sample restarts at a
/// zero delta.
pub struct TripDistanceAccumulator {
    cache: Arc<EphemeralStore>,
    sample_ttl: Duration,
}

impl TripDistanceAccumulator {
    pub fn new(cache: Arc<EphemeralStore>, sample_ttl: Duration) -> Self {
        Self { cache, sample_ttl }
    }

    pub fn trip_tracker(
        &self,
        order_id: Uuid,
        driver_id: Uuid,
        position: GeoPoint,
    ) -> Result<f64, DomainError> {
        let sample_key = sample_key(order_id, driver_id);

        let delta = match self.cache.get::<GeoPoint>(&sample_key)? {
            Some(previous) => haversine_km(&previous, &position),
            None => 0.0,
        };

        let total =
            self.cache
                .incr_by_float(&distance_key(order_id), &driver_id.to_string(), delta);

        self.cache.set_ex(&sample_key, &position, self.sample_ttl)?;

        let distance = round_km(total);
        self.cache.set(
            &snapshot_key(order_id),
            &TripSnapshot {
                driver_id,
                distance,
            },
        )?;

        debug!(order_id = %order_id, driver_id = %driver_id, distance, "trip distance updated");
        Ok(distance)
    }
}

fn round_km(total: f64) -> f64 {
    (total * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use uuid::Uuid;

    use super::TripDistanceAccumulator;
    use crate::cache::EphemeralStore;
    use crate::models::driver::GeoPoint;
    use crate::models::trip::TripSnapshot;

    // Roughly one kilometer of latitude at the equator.
    const ONE_KM_LAT: f64 = 0.008993;

    fn fixture(sample_ttl: Duration) -> (TripDistanceAccumulator, Arc<EphemeralStore>) {
        let cache = Arc::new(EphemeralStore::new());
        (
            TripDistanceAccumulator::new(cache.clone(), sample_ttl),
            cache,
        )
    }

    #[test]
    fn first_sample_contributes_no_distance() {
        let (tracker, _cache) = fixture(Duration::from_secs(60));

        let distance = tracker
            .trip_tracker(
                Uuid::new_v4(),
                Uuid::new_v4(),
                GeoPoint { lat: 0.0, lng: 0.0 },
            )
            .unwrap();

        assert_eq!(distance, 0.0);
    }

    #[test]
    fn second_sample_one_km_away_accumulates_one_km() {
        let (tracker, _cache) = fixture(Duration::from_secs(60));
        let order_id = Uuid::new_v4();
        let driver_id = Uuid::new_v4();

        tracker
            .trip_tracker(order_id, driver_id, GeoPoint { lat: 0.0, lng: 0.0 })
            .unwrap();
        let distance = tracker
            .trip_tracker(
                order_id,
                driver_id,
                GeoPoint {
                    lat: ONE_KM_LAT,
                    lng: 0.0,
                },
            )
            .unwrap();

        assert_eq!(distance, 1.0);
    }

    #[test]
    fn distance_accumulates_across_samples() {
        let (tracker, _cache) = fixture(Duration::from_secs(60));
        let order_id = Uuid::new_v4();
        let driver_id = Uuid::new_v4();

        for step in 0..=3 {
            tracker
                .trip_tracker(
                    order_id,
                    driver_id,
                    GeoPoint {
                        lat: step as f64 * ONE_KM_LAT,
                        lng: 0.0,
                    },
                )
                .unwrap();
        }

        let total = tracker
            .trip_tracker(
                order_id,
                driver_id,
                GeoPoint {
                    lat: 3.0 * ONE_KM_LAT,
                    lng: 0.0,
                },
            )
            .unwrap();

        assert_eq!(total, 3.0);
    }

    #[test]
    fn drivers_accumulate_independently_per_order() {
        let (tracker, _cache) = fixture(Duration::from_secs(60));
        let order_id = Uuid::new_v4();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        tracker
            .trip_tracker(order_id, first, GeoPoint { lat: 0.0, lng: 0.0 })
            .unwrap();
        tracker
            .trip_tracker(
                order_id,
                first,
                GeoPoint {
                    lat: ONE_KM_LAT,
                    lng: 0.0,
                },
            )
            .unwrap();

        let other = tracker
            .trip_tracker(order_id, second, GeoPoint { lat: 10.0, lng: 10.0 })
            .unwrap();

        assert_eq!(other, 0.0);
    }

    #[test]
    fn expired_baseline_restarts_at_zero_delta() {
        let (tracker, _cache) = fixture(Duration::from_millis(5));
        let order_id = Uuid::new_v4();
        let driver_id = Uuid::new_v4();

        tracker
            .trip_tracker(order_id, driver_id, GeoPoint { lat: 0.0, lng: 0.0 })
            .unwrap();
        std::thread::sleep(Duration::from_millis(15));

        let distance = tracker
            .trip_tracker(
                order_id,
                driver_id,
                GeoPoint {
                    lat: ONE_KM_LAT,
                    lng: 0.0,
                },
            )
            .unwrap();

        assert_eq!(distance, 0.0);
    }

    #[test]
    fn snapshot_is_written_for_downstream_readers() {
        let (tracker, cache) = fixture(Duration::from_secs(60));
        let order_id = Uuid::new_v4();
        let driver_id = Uuid::new_v4();

        tracker
            .trip_tracker(order_id, driver_id, GeoPoint { lat: 0.0, lng: 0.0 })
            .unwrap();
        tracker
            .trip_tracker(
                order_id,
                driver_id,
                GeoPoint {
                    lat: ONE_KM_LAT,
                    lng: 0.0,
                },
            )
            .unwrap();

        let snapshot: TripSnapshot = cache
            .get(&format!("trip:{order_id}"))
            .unwrap()
            .expect("snapshot present");
        assert_eq!(snapshot.driver_id, driver_id);
        assert_eq!(snapshot.distance, 1.0);
    }
}
