//! Poll cycle outcomes.

use std::fmt;

/// How a single poll cycle ended.
///
/// The label string is what ends up in the `state` label of the
/// `elgato_keylight_polls` counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum PollOutcome {
    /// Body fetched and decoded.
    Ok,
    /// The request itself failed (connect error, timeout, ...).
    Error,
    /// A response arrived but its body could not be read in full.
    ReadAllError,
    /// The body was read but did not decode into a usable reading.
    ParseError,
}

impl PollOutcome {
    /// Every outcome, in label order.
    pub const ALL: [PollOutcome; 4] = [
        PollOutcome::Ok,
        PollOutcome::Error,
        PollOutcome::ReadAllError,
        PollOutcome::ParseError,
    ];

    /// The metric label value for this outcome.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PollOutcome::Ok => "ok",
            PollOutcome::Error => "error",
            PollOutcome::ReadAllError => "readAllError",
            PollOutcome::ParseError => "parseError",
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, PollOutcome::Ok)
    }
}

impl fmt::Display for PollOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
