//! Engine metrics for embedded hosts.
//!
//! There is no HTTP endpoint here; the host mounts [`get_metrics_body`] on
//! whatever scrape surface it already has.


use autometrics::prometheus_exporter::{self};
use lazy_static::lazy_static;
use prometheus::Encoder;
use prometheus::HistogramOpts;
use prometheus::HistogramVec;
use prometheus::IntCounterVec;
use prometheus::Opts;
use prometheus::Registry;
use prometheus::TextEncoder;
use prometheus::exponential_buckets;

lazy_static! {
    pub static ref REQUESTS_PROCESSED_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "requests_processed",
            "Requests processed by the worker, by kind and outcome"
        ),
        &["kind", "outcome"]
    )
    .expect("metric can not be created");
    pub static ref QUEUE_WAIT_DURATION_METRIC: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "queue_wait_duration_metric",
            "Histogram of time spent in the request queue in ms"
        )
        .buckets(exponential_buckets(1.0, 2.0, 10).unwrap()),
        &["kind"]
    )
    .expect("metric can not be created");
    pub static ref WATCHES_FIRED_METRIC: IntCounterVec =
        IntCounterVec::new(Opts::new("watches_fired", "watches_fired"), &["registry"])
            .expect("metric can not be created");
    pub static ref SESSIONS_EXPIRED_METRIC: IntCounterVec =
        IntCounterVec::new(Opts::new("sessions_expired", "sessions_expired"), &["reason"])
            .expect("metric can not be created");
    pub static ref CUSTOM_REGISTRY: Registry =
        Registry::new_custom(Some("memkeeper".to_string()), None).unwrap();
}

pub(crate) fn register_custom_metrics(registry: &Registry) {
    registry
        .register(Box::new(REQUESTS_PROCESSED_METRIC.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(QUEUE_WAIT_DURATION_METRIC.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(WATCHES_FIRED_METRIC.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(SESSIONS_EXPIRED_METRIC.clone()))
        .expect("collector can be registered");
}

/// Registers engine metrics and the autometrics exporter. Idempotent per
/// registry; call once at host startup.
pub fn init() {
    prometheus_exporter::init();
    register_custom_metrics(&CUSTOM_REGISTRY);
}

/// Export metrics for Prometheus to scrape
pub fn get_metrics_body() -> String {
    let mut res = String::new();

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&CUSTOM_REGISTRY.gather(), &mut buffer) {
        eprintln!("could not encode custom metrics: {}", e);
    };
    match String::from_utf8(buffer) {
        Ok(v) => res.push_str(&v),
        Err(e) => eprintln!("custom metrics could not be from_utf8'd: {}", e),
    };

    let autometrics_response = prometheus_exporter::encode_http_response();
    res.push_str(autometrics_response.body());
    res
}
