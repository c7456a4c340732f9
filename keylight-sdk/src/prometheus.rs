//! Prometheus scrape endpoint.
//!
//! Serves the shared [`KeylightMetrics`] in the Prometheus text-based
//! exposition format. The server only ever reads metric state, so scrapes
//! never block the poll loop.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use keylight_sdk::prometheus::{PrometheusConfig, PrometheusExporter};
//! use keylight_sdk::{KeylightMetrics, MetricsRecorder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let metrics = Arc::new(KeylightMetrics::new());
//!     let recorder = MetricsRecorder::with_metrics(metrics.clone());
//!
//!     let config = PrometheusConfig::builder()
//!         .listen_addr("0.0.0.0:9091")
//!         .metrics_path("/metrics")
//!         .build();
//!
//!     let server = PrometheusExporter::new(config, metrics).start_server().await?;
//!     println!("serving on {}", server.local_addr());
//!     Ok(())
//! }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::state::{KeylightMetrics, DEFAULT_NAMESPACE};
use crate::ExporterError;

const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Configuration for Prometheus metrics endpoint.
#[derive(Debug, Clone)]
pub struct PrometheusConfig {
    /// Address to listen on (e.g., "0.0.0.0:9091")
    pub listen_addr: String,
    /// Path for metrics endpoint (e.g., "/metrics")
    pub metrics_path: String,
    /// Namespace prefix for all metrics
    pub namespace: Option<String>,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:9091".to_string(),
            metrics_path: "/metrics".to_string(),
            namespace: Some(DEFAULT_NAMESPACE.to_string()),
        }
    }
}

impl PrometheusConfig {
    /// Create a new builder for PrometheusConfig.
    pub fn builder() -> PrometheusConfigBuilder {
        PrometheusConfigBuilder::default()
    }
}

/// Builder for PrometheusConfig.
#[derive(Debug, Default)]
pub struct PrometheusConfigBuilder {
    listen_addr: Option<String>,
    metrics_path: Option<String>,
    namespace: Option<String>,
}

impl PrometheusConfigBuilder {
    /// Set the listen address.
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.listen_addr = Some(addr.into());
        self
    }

    /// Set the metrics path. A missing leading `/` is added.
    pub fn metrics_path(mut self, path: impl Into<String>) -> Self {
        self.metrics_path = Some(path.into());
        self
    }

    /// Set the namespace prefix for all metrics.
    pub fn namespace(mut self, ns: impl Into<String>) -> Self {
        self.namespace = Some(ns.into());
        self
    }

    /// Build the PrometheusConfig.
    pub fn build(self) -> PrometheusConfig {
        let defaults = PrometheusConfig::default();
        let metrics_path = match self.metrics_path {
            Some(path) if path.starts_with('/') => path,
            Some(path) => format!("/{}", path),
            None => defaults.metrics_path,
        };

        PrometheusConfig {
            listen_addr: self.listen_addr.unwrap_or(defaults.listen_addr),
            metrics_path,
            namespace: self.namespace.or(defaults.namespace),
        }
    }
}

/// Prometheus exporter that serves metrics over HTTP.
#[derive(Debug)]
pub struct PrometheusExporter {
    config: PrometheusConfig,
    metrics: Arc<KeylightMetrics>,
}

impl PrometheusExporter {
    /// Create a new Prometheus exporter over shared metric state.
    pub fn new(config: PrometheusConfig, metrics: Arc<KeylightMetrics>) -> Self {
        Self { config, metrics }
    }

    /// Get the configuration.
    pub fn config(&self) -> &PrometheusConfig {
        &self.config
    }

    /// Get the current metrics in Prometheus exposition format.
    pub fn render(&self) -> String {
        self.metrics.render(self.config.namespace.as_deref())
    }

    /// Bind the listen address and start serving in a background task.
    ///
    /// Binding happens before this returns, so an unusable address is
    /// reported to the caller rather than lost inside the task.
    pub async fn start_server(&self) -> Result<MetricsServer, ExporterError> {
        let addr: SocketAddr = self
            .config
            .listen_addr
            .parse()
            .map_err(|_| ExporterError::InvalidAddress(self.config.listen_addr.clone()))?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ExporterError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ExporterError::Bind { addr, source })?;

        info!(
            "serving metrics on http://{}{}",
            local_addr, self.config.metrics_path
        );

        let metrics_path: Arc<str> = self.config.metrics_path.as_str().into();
        let namespace: Option<Arc<str>> = self.config.namespace.as_deref().map(Into::into);
        let metrics = self.metrics.clone();

        let task = tokio::spawn(run_server(listener, metrics_path, namespace, metrics));

        Ok(MetricsServer { local_addr, task })
    }
}

/// A running scrape server.
#[derive(Debug)]
pub struct MetricsServer {
    local_addr: SocketAddr,
    task: JoinHandle<()>,
}

impl MetricsServer {
    /// The address actually bound (useful when listening on port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections.
    pub fn abort(&self) {
        self.task.abort();
    }
}

async fn run_server(
    listener: TcpListener,
    metrics_path: Arc<str>,
    namespace: Option<Arc<str>>,
    metrics: Arc<KeylightMetrics>,
) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("metrics accept failed: {}", e);
                continue;
            }
        };
        let io = TokioIo::new(stream);

        let metrics_path = metrics_path.clone();
        let namespace = namespace.clone();
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                let response = handle_request(&req, &metrics_path, namespace.as_deref(), &metrics);
                async move { Ok::<_, Infallible>(response) }
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                debug!("metrics connection from {} failed: {}", peer, e);
            }
        });
    }
}

fn handle_request<B>(
    req: &Request<B>,
    metrics_path: &str,
    namespace: Option<&str>,
    metrics: &KeylightMetrics,
) -> Response<Full<Bytes>> {
    let path = req.uri().path();

    if path == metrics_path {
        text_response(
            StatusCode::OK,
            EXPOSITION_CONTENT_TYPE,
            metrics.render(namespace),
        )
    } else if path == "/health" || path == "/healthz" {
        text_response(StatusCode::OK, "text/plain", "OK".to_string())
    } else {
        text_response(StatusCode::NOT_FOUND, "text/plain", "Not Found".to_string())
    }
}

fn text_response(
    status: StatusCode,
    content_type: &'static str,
    body: String,
) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}
