//! The poll-parse-record cycle.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use keylight_sdk::Recorder;
use keylight_types::{DeviceReading, PollOutcome};
use reqwest::Client;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::{archive, Parser, PollError};

/// Operating parameters for a [`Poller`], fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerConfig {
    /// Device host name or IP address.
    pub address: String,
    /// Device HTTP port.
    pub port: u16,
    /// Path of the status document, without the leading `/`.
    pub poll_path: String,
    /// Pause between the end of one cycle and the start of the next.
    pub interval: Duration,
    /// Bound on each request, body included.
    pub timeout: Duration,
    /// Directory receiving a copy of every fetched body.
    pub archive_dir: Option<PathBuf>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            address: "192.168.1.209".to_string(),
            port: 9123,
            poll_path: "elgato/lights".to_string(),
            interval: Duration::from_secs(10),
            timeout: Duration::from_secs(1),
            archive_dir: None,
        }
    }
}

impl PollerConfig {
    /// `http://{address}:{port}/{poll_path}`
    pub fn url(&self) -> String {
        format!(
            "http://{}:{}/{}",
            self.address,
            self.port,
            self.poll_path.trim_start_matches('/')
        )
    }
}

/// Polls one device and records what happened.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// use keylight_poller::Poller;
/// use keylight_sdk::MetricsRecorder;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let recorder = MetricsRecorder::new();
///     let poller = Poller::builder(Arc::new(recorder.clone()))
///         .address("192.168.1.209")
///         .port(9123)
///         .timeout(Duration::from_secs(1))
///         .build()?;
///
///     let outcome = poller.poll().await;
///     println!("{}: {}", poller.url(), outcome);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Poller {
    client: Client,
    config: PollerConfig,
    url: String,
    recorder: Arc<dyn Recorder>,
    parser: Parser,
}

impl Poller {
    /// Create a poller; the HTTP client is built once here.
    pub fn new(config: PollerConfig, recorder: Arc<dyn Recorder>) -> Result<Self, PollError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(PollError::Client)?;

        Ok(Self {
            client,
            url: config.url(),
            parser: Parser::new(recorder.clone()),
            recorder,
            config,
        })
    }

    /// Create a new builder for configuring the poller.
    pub fn builder(recorder: Arc<dyn Recorder>) -> PollerBuilder {
        PollerBuilder {
            config: PollerConfig::default(),
            recorder,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Run one poll cycle.
    ///
    /// Every cycle ends with exactly one outcome being recorded; failures
    /// never escape as errors.
    pub async fn poll(&self) -> PollOutcome {
        let started = Utc::now();

        let outcome = match self.cycle(started).await {
            Ok(reading) => {
                debug!(
                    "polled {}: {} light(s), first {:?}",
                    self.url,
                    reading.light_count,
                    reading.first_light()
                );
                PollOutcome::Ok
            }
            Err(e) if e.is_timeout() => {
                warn!("poll of {} timed out after {:?}", self.url, self.config.timeout);
                e.outcome()
            }
            Err(e) => {
                warn!("poll of {} failed: {}", self.url, e);
                e.outcome()
            }
        };

        self.recorder.record_poll_outcome(outcome);
        outcome
    }

    // All timestamps in a cycle are the cycle's start time.
    async fn cycle(&self, started: DateTime<Utc>) -> Result<DeviceReading, PollError> {
        self.recorder.record_last_poll_time(started);

        let send_start = Instant::now();
        let sent = self.client.get(&self.url).send().await;
        self.recorder.record_poll_duration(send_start.elapsed());

        let response = match sent {
            Ok(response) => response,
            Err(e) => {
                self.recorder.record_last_error_time(started);
                return Err(PollError::Request(e));
            }
        };

        self.recorder.record_status_code(response.status().as_u16());

        let body = response.bytes().await.map_err(PollError::Read)?;

        self.recorder.record_last_good_poll_time(started);

        if let Some(dir) = &self.config.archive_dir {
            archive::store(dir, started, &body).await;
        }

        let parse_start = Instant::now();
        let parsed = self.parser.parse(&body);
        self.recorder.record_parse_duration(parse_start.elapsed());

        parsed.map_err(|e| {
            self.recorder.record_last_error_time(started);
            PollError::Parse(e)
        })
    }

    /// Poll until `shutdown` becomes `true`, pausing `interval` after
    /// each cycle.
    ///
    /// Cycles never overlap. A cycle in flight when shutdown is requested
    /// is allowed to finish. Dropping the sender also stops the loop.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                break;
            }

            self.poll().await;

            tokio::select! {
                _ = tokio::time::sleep(self.config.interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        debug!("poll loop for {} stopped", self.url);
    }
}

impl std::fmt::Debug for Poller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("url", &self.url)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Poller`].
pub struct PollerBuilder {
    config: PollerConfig,
    recorder: Arc<dyn Recorder>,
}

impl PollerBuilder {
    /// Set the device address (default: "192.168.1.209").
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.config.address = address.into();
        self
    }

    /// Set the device port (default: 9123).
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the status document path (default: "elgato/lights").
    pub fn poll_path(mut self, path: impl Into<String>) -> Self {
        self.config.poll_path = path.into();
        self
    }

    /// Set the pause between cycles (default: 10 seconds).
    pub fn interval(mut self, interval: Duration) -> Self {
        self.config.interval = interval;
        self
    }

    /// Set the request timeout (default: 1 second).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Archive every fetched body into `dir`.
    pub fn archive_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.archive_dir = Some(dir.into());
        self
    }

    /// Build the poller.
    pub fn build(self) -> Result<Poller, PollError> {
        Poller::new(self.config, self.recorder)
    }
}
