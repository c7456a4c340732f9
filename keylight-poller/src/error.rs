//! Error types for poll cycles.

use keylight_types::PollOutcome;
use thiserror::Error;

/// Why a body could not be turned into a usable reading.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Not JSON, or JSON of the wrong shape.
    #[error("invalid device document: {0}")]
    Json(#[from] serde_json::Error),

    /// The document decoded but its `lights` array was empty.
    #[error("device reported no lights")]
    NoLights,
}

/// Errors that can end a poll cycle early.
#[derive(Debug, Error)]
pub enum PollError {
    /// The request failed before a response arrived.
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// A response arrived but its body could not be read.
    #[error("failed to read response body: {0}")]
    Read(#[source] reqwest::Error),

    /// The body did not decode.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl PollError {
    /// Outcome label recorded for this error.
    pub fn outcome(&self) -> PollOutcome {
        match self {
            PollError::Request(_) | PollError::Client(_) => PollOutcome::Error,
            PollError::Read(_) => PollOutcome::ReadAllError,
            PollError::Parse(_) => PollOutcome::ParseError,
        }
    }

    /// Whether the per-request timeout fired.
    pub fn is_timeout(&self) -> bool {
        match self {
            PollError::Request(e) | PollError::Read(e) => e.is_timeout(),
            _ => false,
        }
    }
}
