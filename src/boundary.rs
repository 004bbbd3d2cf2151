use crate::domain::manifest::short;
use std::fmt;

/// Non-fatal conditions met while planning or applying a release.
/// These never abort a run, but are always reported to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// A batch run found no library to release
    NothingToRelease,
    /// Shared-tag mode found no tag on the branch; every library is a candidate
    SharedTagMissing { remote: String, branch: String },
    /// Library was onboarded but never released, so batch runs leave it alone
    SkippedUnreleased { library: String },
    /// Library is marked `skip_publish`
    SkippedNoPublish { library: String },
    /// Files changed, but no commit since the last release warrants a new version
    NoQualifyingCommits {
        library: String,
        since: Option<String>,
    },
    /// Fetch failed; local remote-tracking data is used instead
    FetchFailed { remote: String, reason: String },
}

impl BoundaryWarning {
    /// Library the warning is about, if any
    pub fn library(&self) -> Option<&str> {
        match self {
            BoundaryWarning::SkippedUnreleased { library }
            | BoundaryWarning::SkippedNoPublish { library }
            | BoundaryWarning::NoQualifyingCommits { library, .. } => Some(library),
            _ => None,
        }
    }
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::NothingToRelease => write!(f, "Nothing to release"),
            BoundaryWarning::SharedTagMissing { remote, branch } => write!(
                f,
                "No release tag found on '{}/{}'; considering every library",
                remote, branch
            ),
            BoundaryWarning::SkippedUnreleased { library } => {
                write!(f, "Skipping '{}': never released", library)
            }
            BoundaryWarning::SkippedNoPublish { library } => {
                write!(f, "Skipping '{}': skip_publish is set", library)
            }
            BoundaryWarning::NoQualifyingCommits { library, since } => match since {
                Some(commit) => write!(
                    f,
                    "No releasable commits for '{}' since {}",
                    library,
                    short(commit)
                ),
                None => write!(f, "No releasable commits for '{}'", library),
            },
            BoundaryWarning::FetchFailed { remote, reason } => write!(
                f,
                "Could not fetch from remote '{}': {}. Using local data.",
                remote, reason
            ),
        }
    }
}
