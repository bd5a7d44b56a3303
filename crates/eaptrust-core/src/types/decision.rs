//! Terminal outcome of one trust decision.

use serde::{Deserialize, Serialize};

/// The single callback fired for a resolved connection attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "ssid", rename_all = "lowercase")]
pub enum TrustDecision {
    /// Server identity approved
    Accept(String),
    /// Server identity rejected by the user
    Reject(String),
    /// Attempt abandoned; `None` means the reply was stale and state was reset
    Error(Option<String>),
}

impl TrustDecision {
    /// SSID the decision applies to, if known
    #[must_use]
    pub fn ssid(&self) -> Option<&str> {
        match self {
            Self::Accept(s) | Self::Reject(s) => Some(s),
            Self::Error(s) => s.as_deref(),
        }
    }

    /// Returns true for [`Self::Accept`]
    #[must_use]
    pub const fn is_accept(&self) -> bool {
        matches!(self, Self::Accept(_))
    }
}

impl std::fmt::Display for TrustDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accept(ssid) => write!(f, "ACCEPTED {ssid}"),
            Self::Reject(ssid) => write!(f, "REJECTED {ssid}"),
            Self::Error(Some(ssid)) => write!(f, "ERROR {ssid}"),
            Self::Error(None) => write!(f, "ERROR (stale)"),
        }
    }
}
