use crate::error::ErrorKind;
use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram},
};

/// Prediction metrics reported through the global meter provider.
///
/// Without a configured provider these are no-ops.
#[derive(Clone)]
pub struct PredictionMetrics {
    duration: Histogram<f64>,
    predictions: Counter<u64>,
    failures: Counter<u64>,
}

impl PredictionMetrics {
    pub fn new(meter_name: &'static str) -> Self {
        let meter = global::meter(meter_name);
        let latency_buckets = [
            0.005, 0.01, 0.02, 0.03, 0.05, 0.075, 0.1, 0.15, 0.2, 0.3, 0.5, 0.75, 1.0, 2.0,
        ];

        let duration = meter
            .f64_histogram("classifier_prediction_duration_seconds")
            .with_description("Time to classify one image (decode + resize + forward pass)")
            .with_unit("s")
            .with_boundaries(latency_buckets.to_vec())
            .build();
        let predictions = meter
            .u64_counter("classifier_predictions_total")
            .with_description("Total images classified")
            .build();
        let failures = meter
            .u64_counter("classifier_prediction_failures_total")
            .with_description("Total images that could not be classified")
            .build();

        Self {
            duration,
            predictions,
            failures,
        }
    }

    pub fn record_success(&self, elapsed_secs: f64) {
        self.duration.record(elapsed_secs, &[]);
        self.predictions.add(1, &[]);
    }

    pub fn record_failure(&self, kind: ErrorKind) {
        self.failures
            .add(1, &[KeyValue::new("kind", kind.as_str())]);
    }
}

impl Default for PredictionMetrics {
    fn default() -> Self {
        Self::new("classifier")
    }
}
