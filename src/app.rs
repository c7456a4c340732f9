//! Process wiring: logging, the scrape server and the poll loop.

use std::future::Future;
use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use keylight_poller::{Parser, Poller};
use keylight_sdk::prometheus::PrometheusExporter;
use keylight_sdk::{MetricsRecorder, DEFAULT_NAMESPACE};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Settings;
use crate::duration::format_duration;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `level` is used as the filter.
/// Logs go to stderr so single-file output on stdout stays clean.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // Already installed (tests, embedding) is fine.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Decode a saved status body and return the metrics it produces.
pub async fn parse_file(path: &Path) -> Result<String> {
    let body = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;

    let recorder = MetricsRecorder::new();
    let parser = Parser::new(Arc::new(recorder.clone()));
    parser
        .parse(&body)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    Ok(recorder.metrics().render(Some(DEFAULT_NAMESPACE)))
}

/// Run the exporter until interrupted.
pub async fn run(settings: Settings) -> Result<()> {
    if let Some(path) = &settings.file {
        print!("{}", parse_file(path).await?);
        return Ok(());
    }

    let recorder = MetricsRecorder::new();

    let exporter = PrometheusExporter::new(settings.prometheus_config(), recorder.metrics().clone());
    let server = exporter
        .start_server()
        .await
        .context("failed to start metrics server")?;

    let poller = Poller::new(settings.poller.clone(), Arc::new(recorder))
        .context("failed to build poller")?;

    let (stop, stopped) = watch::channel(false);
    tokio::spawn(forward_shutdown(tokio::signal::ctrl_c(), stop));

    info!(
        "polling {} every {} (timeout {})",
        poller.url(),
        format_duration(settings.poller.interval),
        format_duration(settings.poller.timeout)
    );

    poller.run(stopped).await;
    server.abort();

    Ok(())
}

/// Flip `stop` once `signal` fires.
///
/// If the signal cannot be listened for, the sender is held forever so the
/// poll loop keeps running.
async fn forward_shutdown<F>(signal: F, stop: watch::Sender<bool>)
where
    F: Future<Output = io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            info!("shutting down");
            let _ = stop.send(true);
        }
        Err(e) => {
            warn!("cannot listen for ctrl-c: {}", e);
            let _stop = stop;
            std::future::pending::<()>().await;
        }
    }
}
