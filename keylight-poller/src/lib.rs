//! # keylight-poller
//!
//! Polls an Elgato Key Light's status endpoint and feeds what it sees into
//! a [`Recorder`](keylight_sdk::Recorder).
//!
//! One poll cycle issues `GET http://{address}:{port}/{path}`, times it,
//! decodes the body and records the outcome. Cycles are independent: a
//! failed cycle is recorded and the next one starts from scratch, with no
//! retries or backoff.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use keylight_poller::Poller;
//! use keylight_sdk::MetricsRecorder;
//! use tokio::sync::watch;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let recorder = MetricsRecorder::new();
//!     let poller = Poller::builder(Arc::new(recorder.clone()))
//!         .address("192.168.1.209")
//!         .interval(Duration::from_secs(10))
//!         .build()?;
//!
//!     let (_stop, stopped) = watch::channel(false);
//!     poller.run(stopped).await;
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod error;
mod parser;
mod poller;

#[cfg(test)]
mod testing;

pub use error::{ParseError, PollError};
pub use parser::{decode, Parser};
pub use poller::{Poller, PollerBuilder, PollerConfig};

// Re-export types for convenience
pub use keylight_types::{DeviceReading, LightState, PollOutcome};
