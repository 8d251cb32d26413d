use prometheus::{
    Encoder, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub beacon_transitions_total: IntCounterVec,
    pub dispatch_offers_total: IntCounterVec,
    pub dispatch_latency_seconds: HistogramVec,
    pub tracked_driver_locations: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let beacon_transitions_total = IntCounterVec::new(
            Opts::new(
                "beacon_transitions_total",
                "Total beacon transitions by outcome",
            ),
            &["outcome"],
        )
        .expect("valid beacon_transitions_total metric");

        let dispatch_offers_total = IntCounterVec::new(
            Opts::new("dispatch_offers_total", "Total pickup broadcasts by outcome"),
            &["outcome"],
        )
        .expect("valid dispatch_offers_total metric");

        let dispatch_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "dispatch_latency_seconds",
                "Latency of pickup broadcast processing in seconds",
            ),
            &["outcome"],
        )
        .expect("valid dispatch_latency_seconds metric");

        let tracked_driver_locations = IntGauge::new(
            "tracked_driver_locations",
            "Drivers currently present in the geo index",
        )
        .expect("valid tracked_driver_locations metric");

        registry
            .register(Box::new(beacon_transitions_total.clone()))
            .expect("register beacon_transitions_total");
        registry
            .register(Box::new(dispatch_offers_total.clone()))
            .expect("register dispatch_offers_total");
        registry
            .register(Box::new(dispatch_latency_seconds.clone()))
            .expect("register dispatch_latency_seconds");
        registry
            .register(Box::new(tracked_driver_locations.clone()))
            .expect("register tracked_driver_locations");

        Self {
            registry,
            beacon_transitions_total,
            dispatch_offers_total,
            dispatch_latency_seconds,
            tracked_driver_locations,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
