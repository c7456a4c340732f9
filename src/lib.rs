//! # keylight-exporter
//!
//! Prometheus exporter for the Elgato Key Light.
//!
//! The binary polls the light's status endpoint on a fixed interval,
//! records what it sees with [`keylight_sdk::MetricsRecorder`] and serves
//! the result for scraping. With `--file` it instead decodes one saved
//! status body, prints the resulting metrics and exits.
//!
//! The pieces live in the workspace crates:
//!
//! - `keylight-types`: the device payload and poll outcome labels
//! - `keylight-sdk`: metric state, the [`Recorder`](keylight_sdk::Recorder)
//!   trait and the scrape server
//! - `keylight-poller`: the HTTP poll cycle and body parser

pub mod app;
pub mod config;
pub mod duration;
