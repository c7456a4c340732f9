//! The measurement surface used by the poller and parser.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use keylight_types::PollOutcome;

use crate::state::KeylightMetrics;

/// Side-effect-only sink for poll measurements.
///
/// Every method is fire-and-forget: implementations must not panic and
/// have nothing to report back to the caller.
pub trait Recorder: Send + Sync {
    /// Count a finished poll cycle under its outcome label.
    fn record_poll_outcome(&self, outcome: PollOutcome);

    /// Count a response status code.
    fn record_status_code(&self, code: u16);

    /// Time the most recent poll started.
    fn record_last_poll_time(&self, ts: DateTime<Utc>);

    /// Time of the most recent poll that produced a response body.
    fn record_last_good_poll_time(&self, ts: DateTime<Utc>);

    /// Time of the most recent failed poll.
    fn record_last_error_time(&self, ts: DateTime<Utc>);

    /// Add to the total time spent waiting on the device.
    fn record_poll_duration(&self, duration: Duration);

    /// Add to the total time spent decoding bodies.
    fn record_parse_duration(&self, duration: Duration);

    fn record_on_off(&self, value: i64);

    fn record_brightness(&self, value: i64);

    fn record_temperature(&self, value: i64);
}

/// [`Recorder`] backed by [`KeylightMetrics`].
///
/// Clones share the same metric state.
///
/// # Example
///
/// ```rust
/// use keylight_sdk::{MetricsRecorder, Recorder};
///
/// let recorder = MetricsRecorder::new();
/// recorder.record_brightness(55);
///
/// assert_eq!(recorder.metrics().brightness.get(), 55.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MetricsRecorder {
    metrics: Arc<KeylightMetrics>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record into an existing metric state.
    pub fn with_metrics(metrics: Arc<KeylightMetrics>) -> Self {
        Self { metrics }
    }

    pub fn metrics(&self) -> &Arc<KeylightMetrics> {
        &self.metrics
    }
}

impl Recorder for MetricsRecorder {
    fn record_poll_outcome(&self, outcome: PollOutcome) {
        self.metrics.polls.with_label(outcome.as_str()).inc();
    }

    fn record_status_code(&self, code: u16) {
        self.metrics.status_codes.with_label(&code.to_string()).inc();
    }

    fn record_last_poll_time(&self, ts: DateTime<Utc>) {
        self.metrics.last_poll_seconds.set(epoch_seconds(ts));
    }

    fn record_last_good_poll_time(&self, ts: DateTime<Utc>) {
        self.metrics.last_good_poll_seconds.set(epoch_seconds(ts));
    }

    fn record_last_error_time(&self, ts: DateTime<Utc>) {
        self.metrics.last_error_time_seconds.set(epoch_seconds(ts));
    }

    fn record_poll_duration(&self, duration: Duration) {
        self.metrics.poll_duration.add(duration.as_secs_f64());
    }

    fn record_parse_duration(&self, duration: Duration) {
        self.metrics.parse_duration.add(duration.as_secs_f64());
    }

    fn record_on_off(&self, value: i64) {
        self.metrics.on_off.set(value as f64);
    }

    fn record_brightness(&self, value: i64) {
        self.metrics.brightness.set(value as f64);
    }

    fn record_temperature(&self, value: i64) {
        self.metrics.temperature.set(value as f64);
    }
}

// Whole seconds, matching what the exporter has always published.
fn epoch_seconds(ts: DateTime<Utc>) -> f64 {
    ts.timestamp() as f64
}
