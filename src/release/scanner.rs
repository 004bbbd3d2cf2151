use crate::boundary::BoundaryWarning;
use crate::domain::library::LibraryVersionRecord;
use crate::domain::manifest::{short, Manifest};
use crate::error::{LibrarianError, Result};
use crate::git::Repository;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Where the "last release" point of a library comes from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TagMode {
    /// Each library has its own tag rendered from its tag format
    #[default]
    PerLibrary,
    /// One repository-wide tag, the latest on the release branch
    Shared,
}

/// Remote branch consulted in [`TagMode::Shared`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTarget {
    pub remote: String,
    pub branch: String,
}

/// A library with changes since its last release
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub name: String,
    /// Commit of the last release; `None` when no release point could be found
    pub since: Option<String>,
    /// Changed files owned by the library
    pub changed_files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanOutcome {
    pub candidates: Vec<Candidate>,
    pub warnings: Vec<BoundaryWarning>,
}

impl ScanOutcome {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.candidates.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Select the libraries of `manifest` with qualifying changes since their last release.
///
/// Libraries marked `skip_publish` or never released are skipped with a warning.
/// In [`TagMode::PerLibrary`] a missing tag is an error: the previous release never
/// finished. In [`TagMode::Shared`] a missing tag makes every library a candidate.
pub fn scan_changes<R: Repository + ?Sized>(
    repo: &R,
    manifest: &Manifest,
    mode: TagMode,
    target: &ScanTarget,
) -> Result<ScanOutcome> {
    let ignore = &manifest.release_settings()?.ignored_changes;
    let mut outcome = ScanOutcome::default();

    let mut eligible = Vec::new();
    for library in &manifest.libraries {
        if library.skip_publish {
            outcome.warnings.push(BoundaryWarning::SkippedNoPublish {
                library: library.name.clone(),
            });
        } else if !library.is_released() {
            outcome.warnings.push(BoundaryWarning::SkippedUnreleased {
                library: library.name.clone(),
            });
        } else {
            eligible.push(library);
        }
    }

    let shared_since = match mode {
        TagMode::PerLibrary => None,
        TagMode::Shared => {
            let since = shared_release_point(repo, target)?;
            if since.is_none() {
                warn!(remote = %target.remote, branch = %target.branch, "no shared release tag");
                outcome.warnings.push(BoundaryWarning::SharedTagMissing {
                    remote: target.remote.clone(),
                    branch: target.branch.clone(),
                });
                outcome.candidates = eligible
                    .iter()
                    .map(|library| Candidate {
                        name: library.name.clone(),
                        since: None,
                        changed_files: Vec::new(),
                    })
                    .collect();
                return Ok(outcome);
            }
            since
        }
    };

    for library in eligible {
        let since = match &shared_since {
            Some(commit) => commit.clone(),
            None => library_release_point(repo, library)?,
        };

        let changed_files: Vec<PathBuf> = repo
            .changed_files_since(&since, ignore)?
            .into_iter()
            .filter(|path| library.owns_path(path))
            .collect();

        debug!(
            library = %library.name,
            since = short(&since),
            changed = changed_files.len(),
            "scanned library"
        );

        if changed_files.is_empty() {
            continue;
        }
        info!(library = %library.name, "library has changes since last release");
        outcome.candidates.push(Candidate {
            name: library.name.clone(),
            since: Some(since),
            changed_files,
        });
    }

    Ok(outcome)
}

fn library_release_point<R: Repository + ?Sized>(
    repo: &R,
    library: &LibraryVersionRecord,
) -> Result<String> {
    let tag = library.release_tag()?;
    repo.resolve_tag(&tag)?.ok_or_else(|| {
        LibrarianError::lookup(format!(
            "Tag '{}' for library '{}' version {} not found; was the last release completed?",
            tag, library.name, library.version
        ))
    })
}

fn shared_release_point<R: Repository + ?Sized>(
    repo: &R,
    target: &ScanTarget,
) -> Result<Option<String>> {
    let Some(tag) = repo.last_tag(&target.remote, &target.branch)? else {
        return Ok(None);
    };
    let commit = repo
        .resolve_tag(&tag)?
        .ok_or_else(|| LibrarianError::lookup(format!("Cannot resolve tag '{}'", tag)))?;
    debug!(tag = %tag, commit = short(&commit), "using shared release tag");
    Ok(Some(commit))
}
