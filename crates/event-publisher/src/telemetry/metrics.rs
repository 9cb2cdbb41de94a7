//! Publisher instruments registered on the global OpenTelemetry meter.
//!
//! Until [`init_telemetry`](super::init_telemetry) installs a meter provider the
//! global meter is a no-op, so these are safe to create in tests.

use std::time::Duration;

use opentelemetry::{
    global,
    metrics::{Counter, Histogram},
    KeyValue,
};

/// Instruments recorded once per `write_event` call.
#[derive(Clone)]
pub struct PublishMetrics {
    duration_ms: Histogram<f64>,
    stage_failures: Counter<u64>,
}

impl PublishMetrics {
    /// Register the instruments on the `event-publisher` meter.
    pub fn new() -> Self {
        let meter = global::meter("event-publisher");
        Self {
            duration_ms: meter
                .f64_histogram("event_publisher.write_event.duration")
                .with_description("Milliseconds from write_event invocation to pipeline settle")
                .init(),
            stage_failures: meter
                .u64_counter("event_publisher.stage.failures")
                .with_description("Pipeline runs halted, by failing stage")
                .init(),
        }
    }

    /// Record one pipeline run.
    pub fn record_duration(&self, elapsed: Duration, outcome: &'static str) {
        self.duration_ms
            .record(elapsed.as_secs_f64() * 1000.0, &[KeyValue::new("outcome", outcome)]);
    }

    /// Count a halted pipeline against the stage that failed.
    pub fn record_stage_failure(&self, stage: &'static str) {
        self.stage_failures.add(1, &[KeyValue::new("stage", stage)]);
    }
}

impl Default for PublishMetrics {
    fn default() -> Self {
        Self::new()
    }
}
