//! Error types for the scrape endpoint.

use std::net::SocketAddr;

use thiserror::Error;

/// Errors that can occur when starting the metrics server.
#[derive(Debug, Error)]
pub enum ExporterError {
    /// The configured listen address is not a socket address.
    #[error("invalid listen address: {0}")]
    InvalidAddress(String),

    /// Binding the listen address failed.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}
