//! Pre-release labels for preview-channel versions
//!
//! A preview version carries a label and a counter, e.g. `1.3.0-preview.2`.
//! Precedence follows https://semver.org/#spec-item-9

use crate::error::{LibrarianError, Result};
use semver::{Prerelease, Version};
use std::fmt;
use std::str::FromStr;

/// Label of a pre-release (alpha, beta, preview, rc, or an ecosystem-specific one)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreReleaseType {
    Alpha,
    Beta,
    Preview,
    ReleaseCandidate,
    Custom(String),
}

impl PreReleaseType {
    /// Labels are kept verbatim so a parsed version renders back unchanged.
    pub fn parse(s: &str) -> Result<Self> {
        s.parse()
    }
}

impl FromStr for PreReleaseType {
    type Err = LibrarianError;

    fn from_str(s: &str) -> Result<Self> {
        let label = match s {
            "alpha" => PreReleaseType::Alpha,
            "beta" => PreReleaseType::Beta,
            "preview" => PreReleaseType::Preview,
            "rc" => PreReleaseType::ReleaseCandidate,
            custom if is_label(custom) => PreReleaseType::Custom(custom.to_string()),
            _ => {
                return Err(LibrarianError::version(format!(
                    "Invalid pre-release label: '{}'",
                    s
                )))
            }
        };
        Ok(label)
    }
}

fn is_label(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

impl fmt::Display for PreReleaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PreReleaseType::Alpha => "alpha",
            PreReleaseType::Beta => "beta",
            PreReleaseType::Preview => "preview",
            PreReleaseType::ReleaseCandidate => "rc",
            PreReleaseType::Custom(s) => s.as_str(),
        };
        f.write_str(label)
    }
}

/// `<label>[.<counter>]`, e.g. "preview" or "preview.3"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreRelease {
    pub label: PreReleaseType,
    pub counter: Option<u64>,
}

impl PreRelease {
    pub fn new(label: PreReleaseType, counter: Option<u64>) -> Self {
        PreRelease { label, counter }
    }

    /// "<label>.1"
    pub fn first(label: PreReleaseType) -> Self {
        PreRelease::new(label, Some(1))
    }

    pub fn parse(s: &str) -> Result<Self> {
        let (label, counter) = match s.split_once('.') {
            Some((label, counter)) => (label, Some(counter)),
            None => (s, None),
        };
        if label.is_empty() {
            return Err(LibrarianError::version("Empty pre-release label"));
        }

        let counter = counter
            .map(|n| {
                n.parse::<u64>().map_err(|_| {
                    LibrarianError::version(format!(
                        "Unsupported pre-release '{}': expected <label>[.<n>]",
                        s
                    ))
                })
            })
            .transpose()?;

        Ok(PreRelease::new(PreReleaseType::parse(label)?, counter))
    }

    /// Pre-release part of `version`, `None` for a release version
    pub fn from_version(version: &Version) -> Result<Option<Self>> {
        if version.pre.is_empty() {
            return Ok(None);
        }
        PreRelease::parse(version.pre.as_str()).map(Some)
    }

    /// Next counter value; a bare label counts as 0
    pub fn next(&self) -> Self {
        PreRelease::new(self.label.clone(), Some(self.counter.unwrap_or(0) + 1))
    }

    pub fn to_semver(&self) -> Result<Prerelease> {
        Prerelease::new(&self.to_string()).map_err(|e| {
            LibrarianError::version(format!("Invalid pre-release '{}': {}", self, e))
        })
    }

    /// Replace any pre-release on `version` with this one
    pub fn apply_to(&self, version: &Version) -> Result<Version> {
        let mut next = Version::new(version.major, version.minor, version.patch);
        next.pre = self.to_semver()?;
        Ok(next)
    }
}

impl fmt::Display for PreRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.counter {
            Some(n) => write!(f, "{}.{}", self.label, n),
            None => write!(f, "{}", self.label),
        }
    }
}
