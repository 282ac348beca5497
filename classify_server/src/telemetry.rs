use opentelemetry::{
    global,
    metrics::{Counter, Histogram, MeterProvider},
    KeyValue,
};
use prometheus::Registry;
use std::collections::HashSet;

pub struct Metrics {
    request_counter: Counter<u64>,
    prediction_duration: Histogram<f64>,
    prediction_failures: Counter<u64>,
    pub registry: Registry,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();
        let exporter = opentelemetry_prometheus::exporter()
            .with_registry(registry.clone())
            .build()?;

        let provider = opentelemetry_sdk::metrics::SdkMeterProvider::builder()
            .with_reader(exporter)
            .build();

        let meter = provider.meter("classify_server");
        global::set_meter_provider(provider);

        let request_counter = meter
            .u64_counter("requests_total")
            .with_description("Total number of prediction requests")
            .build();

        let prediction_duration = meter
            .f64_histogram("prediction_duration_ms")
            .with_boundaries(generate_boundaries((1, 10, 50, 250, 1000)))
            .with_description("Server-side decode, preprocessing and inference time in milliseconds")
            .build();

        let prediction_failures = meter
            .u64_counter("prediction_failures_total")
            .with_description("Prediction requests answered with an error")
            .build();

        Ok(Metrics {
            request_counter,
            prediction_duration,
            prediction_failures,
            registry,
        })
    }

    pub fn record_request(&self, route: &str) {
        let attributes = [KeyValue::new("route", route.to_string())];
        self.request_counter.add(1, &attributes);
    }

    pub fn record_prediction_duration(&self, duration_ms: f64, route: &str) {
        let attributes = [KeyValue::new("route", route.to_string())];
        self.prediction_duration.record(duration_ms, &attributes);
    }

    pub fn record_failure(&self, route: &str, status: u16) {
        let attributes = [
            KeyValue::new("route", route.to_string()),
            KeyValue::new("status", i64::from(status)),
        ];
        self.prediction_failures.add(1, &attributes);
    }
}

/// Bucket bounds: steps of 1 up to `parts.1`, then 5, 25 and 250.
fn generate_boundaries(parts: (i32, i32, i32, i32, i32)) -> Vec<f64> {
    let first_part = (parts.0..=parts.1).step_by(1);
    let middle_part = (parts.1..=parts.2).step_by(5);
    let end_part = (parts.2..=parts.3).step_by(25);
    let tail_part = (parts.3..=parts.4).step_by(250);

    let mut seen = HashSet::new();
    first_part
        .chain(middle_part)
        .chain(end_part)
        .chain(tail_part)
        .filter(|&x| seen.insert(x))
        .map(|x| x as f64)
        .collect()
}
