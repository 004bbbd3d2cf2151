use crate::error::{LibrarianError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use semver::Version;

/// How significant a set of changes is, driving which version component moves.
///
/// Ordered `None < Patch < Minor < Major`, so `max` over any set of levels is
/// associative and commutative.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ChangeLevel {
    #[default]
    None,
    Patch,
    Minor,
    Major,
}

impl ChangeLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeLevel::None => "none",
            ChangeLevel::Patch => "patch",
            ChangeLevel::Minor => "minor",
            ChangeLevel::Major => "major",
        }
    }
}

impl fmt::Display for ChangeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeLevel {
    type Err = LibrarianError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "none" => Ok(ChangeLevel::None),
            "patch" => Ok(ChangeLevel::Patch),
            "minor" => Ok(ChangeLevel::Minor),
            "major" => Ok(ChangeLevel::Major),
            other => Err(LibrarianError::version(format!(
                "Unknown change level: '{}'",
                other
            ))),
        }
    }
}

/// The "never released" baseline, 0.0.0.
pub fn baseline() -> Version {
    Version::new(0, 0, 0)
}

/// Parse a version string as found in a manifest or on the command line.
///
/// Only plain semver is accepted. A tag-style "v1.2.3" is rejected, since the
/// tag format already supplies any prefix.
pub fn parse_version(input: &str) -> Result<Version> {
    let trimmed = input.trim();
    if trimmed.starts_with(['v', 'V']) {
        return Err(LibrarianError::version(format!(
            "Invalid version '{}': drop the leading '{}'",
            input,
            &trimmed[..1]
        )));
    }

    Version::parse(trimmed).map_err(|e| {
        LibrarianError::version(format!("Invalid version '{}': {}", input, e))
    })
}

/// Versions below 1.0.0 have not reached general availability.
pub fn is_pre_ga(version: &Version) -> bool {
    version.major == 0
}

/// The major.minor.patch core of a version, with pre-release and build dropped.
pub fn core(version: &Version) -> Version {
    Version::new(version.major, version.minor, version.patch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_level_ordering() {
        assert!(ChangeLevel::None < ChangeLevel::Patch);
        assert!(ChangeLevel::Patch < ChangeLevel::Minor);
        assert!(ChangeLevel::Minor < ChangeLevel::Major);
    }

    #[test]
    fn test_change_level_max() {
        assert_eq!(ChangeLevel::Patch.max(ChangeLevel::Minor), ChangeLevel::Minor);
        assert_eq!(ChangeLevel::Major.max(ChangeLevel::None), ChangeLevel::Major);
        assert_eq!(ChangeLevel::None.max(ChangeLevel::None), ChangeLevel::None);
    }

    #[test]
    fn test_change_level_parse_and_display() {
        assert_eq!("minor".parse::<ChangeLevel>().unwrap(), ChangeLevel::Minor);
        assert_eq!("MAJOR".parse::<ChangeLevel>().unwrap(), ChangeLevel::Major);
        assert!("huge".parse::<ChangeLevel>().is_err());
        assert_eq!(ChangeLevel::Patch.to_string(), "patch");
    }

    #[test]
    fn test_parse_version() {
        let v = parse_version("1.2.3").unwrap();
        assert_eq!(v, Version::new(1, 2, 3));
    }

    #[test]
    fn test_parse_version_rejects_tag_prefix() {
        let err = parse_version("v1.2.3").unwrap_err();
        assert!(err.to_string().contains("leading 'v'"), "got: {}", err);
        assert!(parse_version("V0.1.0").is_err());
    }

    #[test]
    fn test_parse_version_prerelease() {
        let v = parse_version("1.3.0-preview.2").unwrap();
        assert_eq!(v.pre.as_str(), "preview.2");
        assert_eq!(core(&v), Version::new(1, 3, 0));
    }

    #[test]
    fn test_parse_version_invalid() {
        assert!(parse_version("1.2").is_err());
        assert!(parse_version("").is_err());
        assert!(parse_version("one.two.three").is_err());
    }

    #[test]
    fn test_prerelease_sorts_before_release() {
        let pre = parse_version("1.2.0-preview.5").unwrap();
        let ga = parse_version("1.2.0").unwrap();
        assert!(pre < ga);
    }

    #[test]
    fn test_is_pre_ga() {
        assert!(is_pre_ga(&Version::new(0, 9, 9)));
        assert!(!is_pre_ga(&Version::new(1, 0, 0)));
        assert!(is_pre_ga(&baseline()));
    }
}
