//! # keylight-sdk
//!
//! Metric recording for the Elgato Key Light exporter.
//!
//! The poller reports everything it measures through the [`Recorder`]
//! trait. [`MetricsRecorder`] writes those measurements into a shared
//! [`KeylightMetrics`], which the `prometheus` module serves for scraping.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::time::Duration;
//!
//! use keylight_sdk::{MetricsRecorder, PollOutcome, Recorder};
//!
//! let recorder = MetricsRecorder::new();
//!
//! recorder.record_poll_duration(Duration::from_millis(12));
//! recorder.record_status_code(200);
//! recorder.record_on_off(1);
//! recorder.record_poll_outcome(PollOutcome::Ok);
//!
//! let text = recorder.metrics().render(Some("elgato_keylight"));
//! assert!(text.contains("elgato_keylight_polls{state=\"ok\"} 1"));
//! ```
//!
//! ## Features
//!
//! - **Lock-free hot path**: counters and gauges are atomics
//! - **Concurrent scrapes**: rendering never blocks recording
//! - `prometheus` (default): HTTP scrape endpoint on tokio + hyper

mod error;
mod recorder;
mod state;

#[cfg(feature = "prometheus")]
pub mod prometheus;

pub use error::ExporterError;
pub use recorder::{MetricsRecorder, Recorder};
pub use state::{Counter, CounterVec, Gauge, KeylightMetrics, DEFAULT_NAMESPACE};

// Re-export types for convenience
pub use keylight_types::PollOutcome;
