//! Version derivation: computing and validating the next version of a library.
//!
//! Every function here is pure. Ecosystem differences arrive through
//! [`VersioningOptions`], never through the ecosystem name.

use crate::domain::version::{is_pre_ga, parse_version, ChangeLevel, Version};
use crate::error::{LibrarianError, Result};
use semver::{BuildMetadata, Prerelease};
use tracing::debug;

/// Per-ecosystem flags relaxing the default bump and monotonicity rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VersioningOptions {
    /// Below 1.0.0, a major-level change bumps minor instead
    pub bump_version_core: bool,
    /// Below 1.0.0, an explicit override may be lower than the current version
    pub downgrade_pre_ga_changes: bool,
}

/// Derive the next version for a change level.
///
/// - **Major**: major += 1, minor = 0, patch = 0
/// - **Minor**: minor += 1, patch = 0
/// - **Patch**: patch += 1
/// - **None**: unchanged
///
/// Any pre-release label or build metadata is dropped when a component moves.
pub fn derive_next(level: ChangeLevel, current: &Version, options: VersioningOptions) -> Version {
    let effective = if level == ChangeLevel::Major && options.bump_version_core && is_pre_ga(current)
    {
        ChangeLevel::Minor
    } else {
        level
    };

    let mut next = current.clone();
    match effective {
        ChangeLevel::None => return next,
        ChangeLevel::Major => {
            next.major += 1;
            next.minor = 0;
            next.patch = 0;
        }
        ChangeLevel::Minor => {
            next.minor += 1;
            next.patch = 0;
        }
        ChangeLevel::Patch => {
            next.patch += 1;
        }
    }
    next.pre = Prerelease::EMPTY;
    next.build = BuildMetadata::EMPTY;

    debug!(%current, %next, level = %level, effective = %effective, "derived next version");
    next
}

/// Validate a proposed next version against the current one.
///
/// An empty `current` means the library was never released: any valid version is a
/// legitimate first version. Otherwise the candidate must be strictly greater.
pub fn validate_next(current: &str, candidate: &str) -> Result<Version> {
    let next = parse_version(candidate)?;
    if current.trim().is_empty() {
        return Ok(next);
    }

    let previous = parse_version(current)?;
    if next == previous {
        return Err(LibrarianError::version(format!(
            "Version {} is the same as the current version; nothing to release",
            candidate.trim()
        )));
    }
    if next < previous {
        return Err(LibrarianError::version(format!(
            "Version {} would regress current version {}",
            candidate.trim(),
            current.trim()
        )));
    }
    Ok(next)
}

/// Validate a human-supplied override version.
///
/// Same as [`validate_next`], except that a pre-GA library whose ecosystem allows
/// downgrades may move to a lower (but never equal) version.
pub fn validate_override(
    current: &str,
    candidate: &str,
    options: VersioningOptions,
) -> Result<Version> {
    if options.downgrade_pre_ga_changes && !current.trim().is_empty() {
        let previous = parse_version(current)?;
        let next = parse_version(candidate)?;
        if is_pre_ga(&previous) && next < previous {
            debug!(%previous, %next, "accepting pre-GA downgrade override");
            return Ok(next);
        }
    }
    validate_next(current, candidate)
}

/// The greater of two versions; ties keep the first.
pub fn max_version<'a>(a: &'a Version, b: &'a Version) -> &'a Version {
    if b > a {
        b
    } else {
        a
    }
}
