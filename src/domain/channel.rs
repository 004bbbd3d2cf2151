use crate::error::{LibrarianError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Release track a checkout publishes to.
///
/// The stable channel is authoritative; preview versions are derived relative to it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseChannel {
    #[default]
    Stable,
    Preview,
}

impl ReleaseChannel {
    pub fn is_preview(&self) -> bool {
        matches!(self, ReleaseChannel::Preview)
    }
}

impl fmt::Display for ReleaseChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseChannel::Stable => write!(f, "stable"),
            ReleaseChannel::Preview => write!(f, "preview"),
        }
    }
}

impl FromStr for ReleaseChannel {
    type Err = LibrarianError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "stable" => Ok(ReleaseChannel::Stable),
            "preview" => Ok(ReleaseChannel::Preview),
            other => Err(LibrarianError::config(format!(
                "Unknown release channel: '{}'",
                other
            ))),
        }
    }
}
