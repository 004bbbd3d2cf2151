//! Bump planning: choosing the next version of each library and recording it.
//!
//! Version selection falls through, in order:
//! 1. an explicit override, validated against the current version;
//! 2. the ecosystem's bootstrap version when the library was never released;
//! 3. channel coupling when releasing on the preview channel;
//! 4. the configured [`BumpMode`].

use crate::analyzer::classify;
use crate::boundary::BoundaryWarning;
use crate::domain::channel::ReleaseChannel;
use crate::domain::commit::{parse_message, ConventionalCommitRecord};
use crate::domain::library::LibraryVersionRecord;
use crate::domain::manifest::{short, Manifest};
use crate::domain::version::{ChangeLevel, Version};
use crate::error::{LibrarianError, Result};
use crate::git::{is_ignored, Repository};
use crate::hooks::{HookContext, VersionApplier};
use crate::policy::VersionPolicy;
use crate::release::coupling::{resolve_preview_version, CatchUpStrategy, StableVersionSource};
use crate::release::scanner::{scan_changes, ScanTarget, TagMode};
use crate::version::{derive_next, validate_override};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// How the change level of a library with qualifying changes is decided
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BumpMode {
    /// Always a minor bump
    Mechanical,
    /// Classify the conventional commits since the last release; `None` means no release
    #[default]
    Precise,
}

/// Everything version selection needs besides the library itself
pub struct BumpContext<'a> {
    pub policy: &'a dyn VersionPolicy,
    pub channel: ReleaseChannel,
    pub mode: BumpMode,
    pub stable: &'a dyn StableVersionSource,
    pub catch_up: &'a dyn CatchUpStrategy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedBump {
    pub library: String,
    /// Version before the bump; empty for a first release
    pub previous: String,
    pub next: Version,
    pub output: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BumpPlan {
    pub bumps: Vec<PlannedBump>,
    pub warnings: Vec<BoundaryWarning>,
}

impl BumpPlan {
    pub fn is_empty(&self) -> bool {
        self.bumps.is_empty()
    }
}

/// Conventional commit records for `library` since `since` (exclusive).
///
/// Only commits changing at least one file the library owns count; files under
/// `ignored` or the library's exclude paths never qualify a commit.
pub fn commits_since<R: Repository + ?Sized>(
    repo: &R,
    library: &LibraryVersionRecord,
    since: Option<&str>,
    ignored: &[String],
) -> Result<Vec<ConventionalCommitRecord>> {
    let dir = library.output_dir();
    let commits = repo.commits_touching_path(&dir.to_string_lossy(), since)?;
    Ok(commits
        .iter()
        .filter(|commit| {
            let owned = commit
                .files
                .iter()
                .any(|path| !is_ignored(path, ignored) && library.owns_path(path));
            if !owned {
                debug!(
                    library = %library.name,
                    commit = short(&commit.hash),
                    "commit only touches excluded paths"
                );
            }
            owned
        })
        .flat_map(|commit| parse_message(&commit.message, &commit.hash, &library.name))
        .collect())
}

/// Pick the next version of `library`, or `None` when nothing warrants a release.
pub fn select_next_version<R: Repository + ?Sized>(
    repo: &R,
    ctx: &BumpContext<'_>,
    library: &LibraryVersionRecord,
    since: Option<&str>,
    ignored: &[String],
    override_version: Option<&str>,
) -> Result<Option<Version>> {
    let options = ctx.policy.options();

    if let Some(candidate) = override_version {
        let next = validate_override(&library.version, candidate, options)
            .map_err(|e| LibrarianError::version(format!("Library '{}': {}", library.name, e)))?;
        debug!(library = %library.name, %next, "using override version");
        return Ok(Some(next));
    }

    let Some(current) = library.parsed_version()? else {
        let next = match ctx.channel {
            ReleaseChannel::Stable => ctx.policy.default_stable_version(),
            ReleaseChannel::Preview => ctx.policy.default_preview_version()?,
        };
        debug!(library = %library.name, %next, "using bootstrap version");
        return Ok(Some(next));
    };

    if ctx.channel.is_preview() {
        let next = resolve_preview_version(
            &library.name,
            &current,
            ctx.stable,
            &ctx.policy.preview_label(),
            ctx.catch_up,
        )?;
        return Ok(Some(next));
    }

    let level = match ctx.mode {
        BumpMode::Mechanical => ChangeLevel::Minor,
        BumpMode::Precise => classify(&commits_since(repo, library, since, ignored)?),
    };
    debug!(library = %library.name, %level, mode = ?ctx.mode, "classified changes");

    if level == ChangeLevel::None {
        return Ok(None);
    }
    Ok(Some(derive_next(level, &current, options)))
}

fn planned(library: &LibraryVersionRecord, next: Version) -> PlannedBump {
    PlannedBump {
        library: library.name.clone(),
        previous: library.version.trim().to_string(),
        next,
        output: library.output_dir().to_string_lossy().into_owned(),
    }
}

/// Plan the release of one named library.
///
/// Unlike a batch run, the library is considered even without changed files, and an
/// unreleased library gets its bootstrap version.
pub fn plan_single<R: Repository + ?Sized>(
    repo: &R,
    manifest: &Manifest,
    ctx: &BumpContext<'_>,
    name: &str,
    override_version: Option<&str>,
) -> Result<BumpPlan> {
    let ignored = &manifest.release_settings()?.ignored_changes;
    let library = manifest.require(name)?;

    let since = if library.is_released() {
        repo.resolve_tag(&library.release_tag()?)?
    } else {
        None
    };

    let mut plan = BumpPlan::default();
    match select_next_version(repo, ctx, library, since.as_deref(), ignored, override_version)? {
        Some(next) => {
            info!(library = %library.name, from = %library.version, to = %next, "planned bump");
            plan.bumps.push(planned(library, next));
        }
        None => {
            warn!(library = %library.name, "no releasable commits");
            plan.warnings.push(BoundaryWarning::NoQualifyingCommits {
                library: library.name.clone(),
                since,
            });
        }
    }
    Ok(plan)
}

/// Plan a batch release of every library with changes since its last release.
pub fn plan_all<R: Repository + ?Sized>(
    repo: &R,
    manifest: &Manifest,
    ctx: &BumpContext<'_>,
    mode: TagMode,
    target: &ScanTarget,
) -> Result<BumpPlan> {
    let outcome = scan_changes(repo, manifest, mode, target)?;
    let ignored = &manifest.release_settings()?.ignored_changes;
    let mut plan = BumpPlan {
        bumps: Vec::new(),
        warnings: outcome.warnings,
    };

    for candidate in &outcome.candidates {
        let library = manifest.require(&candidate.name)?;
        match select_next_version(
            repo,
            ctx,
            library,
            candidate.since.as_deref(),
            ignored,
            None,
        )? {
            Some(next) => {
                info!(library = %library.name, from = %library.version, to = %next, "planned bump");
                plan.bumps.push(planned(library, next));
            }
            None => plan.warnings.push(BoundaryWarning::NoQualifyingCommits {
                library: library.name.clone(),
                since: candidate.since.clone(),
            }),
        }
    }

    if plan.is_empty() {
        plan.warnings.push(BoundaryWarning::NothingToRelease);
    }
    Ok(plan)
}

/// Run the apply-version hook for each bump and record the new versions in `manifest`.
///
/// Saving and committing the manifest is left to the caller.
pub fn apply_plan(
    manifest: &mut Manifest,
    plan: &BumpPlan,
    applier: &dyn VersionApplier,
) -> Result<()> {
    for bump in &plan.bumps {
        let record = manifest
            .find_mut(&bump.library)
            .ok_or_else(|| LibrarianError::library_not_found(bump.library.as_str()))?;

        applier.apply(&HookContext {
            library: bump.library.clone(),
            version: bump.next.to_string(),
            previous_version: bump.previous.clone(),
            output: bump.output.clone(),
        })?;

        record.version = bump.next.to_string();
    }
    Ok(())
}
