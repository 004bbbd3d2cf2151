//! Command workflows behind the CLI
//!
//! Each command validates its arguments before touching git, resolves the manifest,
//! policy and channel once, and hands off to the release engine. Keeping this apart
//! from clap lets the workflows be driven programmatically and tested.

use std::path::Path;

use tracing::{info, warn};

use crate::boundary::BoundaryWarning;
use crate::cancel::CancelToken;
use crate::config::Config;
use crate::domain::manifest::{load_manifest, save_manifest, Manifest};
use crate::error::{LibrarianError, Result};
use crate::git::Repository;
use crate::hooks::{NoopApplier, ScriptApplier, VersionApplier};
use crate::policy::PolicyRegistry;
use crate::version::VersioningOptions;
use crate::release::{
    apply_plan, apply_tags, find_release_commit, plan_all, plan_single, plan_tags,
    BranchManifestSource, BumpContext, BumpPlan, PlannedTag, ReleaseCommit, ScanTarget, TagMode,
};

/// Arguments for the bump workflow
///
/// Mirrors the CLI arguments without depending on clap.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BumpArgs {
    /// Library to release
    pub library: Option<String>,

    /// Release every library with changes
    pub all: bool,

    /// Explicit version for the single library
    pub version: Option<String>,

    /// Compute and report without writing anything
    pub dry_run: bool,
}

/// What a validated bump request targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BumpTarget {
    Single {
        library: String,
        version: Option<String>,
    },
    All,
}

impl BumpArgs {
    /// Check the argument combination; never touches the repository
    pub fn validate(&self) -> Result<BumpTarget> {
        let library = self
            .library
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty());
        let version = self.version.as_deref().map(str::trim);

        if version == Some("") {
            return Err(LibrarianError::usage("--version must not be empty"));
        }

        match (self.all, library) {
            (true, Some(library)) => Err(LibrarianError::usage(format!(
                "cannot combine --all with library '{}'",
                library
            ))),
            (true, None) if version.is_some() => Err(LibrarianError::usage(
                "--version cannot be used with --all",
            )),
            (true, None) => Ok(BumpTarget::All),
            (false, Some(library)) => Ok(BumpTarget::Single {
                library: library.to_string(),
                version: version.map(str::to_string),
            }),
            (false, None) => Err(LibrarianError::usage(
                "specify a library name or --all",
            )),
        }
    }
}

/// Arguments for the tag workflow
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagArgs {
    /// Only tag this library's release
    pub library: Option<String>,

    /// Report the tags without creating them
    pub dry_run: bool,
}

/// Result of a bump run
#[derive(Debug, Clone, PartialEq)]
pub struct BumpReport {
    pub plan: BumpPlan,
    pub dry_run: bool,
}

/// Result of a tag run
#[derive(Debug, Clone, PartialEq)]
pub struct TagReport {
    pub release: ReleaseCommit,
    pub tags: Vec<PlannedTag>,
    pub dry_run: bool,
}

fn fetch_tolerantly<R: Repository + ?Sized>(repo: &R, remote: &str) -> Result<Option<BoundaryWarning>> {
    match repo.fetch(remote) {
        Ok(()) => Ok(None),
        Err(e @ LibrarianError::Cancelled(_)) => Err(e),
        Err(e) => {
            warn!(remote, error = %e, "fetch failed");
            Ok(Some(BoundaryWarning::FetchFailed {
                remote: remote.to_string(),
                reason: e.to_string(),
            }))
        }
    }
}

/// Bump workflow
///
/// 1. Validate arguments
/// 2. Require a clean working tree and a manifest with a release section
/// 3. Resolve the ecosystem policy and channel
/// 4. Plan the bump (one library or all changed libraries)
/// 5. Unless dry-run, run the apply-version hook and rewrite the manifest
///
/// # Arguments
///
/// * `args` - Bump arguments
/// * `config` - Librarian configuration
/// * `repo` - Repository the manifest lives in
/// * `workdir` - Root of the working tree
/// * `registry` - Ecosystem policies
/// * `cancel` - Deadline for the apply-version hook
pub fn run_bump<R: Repository + ?Sized>(
    args: &BumpArgs,
    config: &Config,
    repo: &R,
    workdir: &Path,
    registry: &PolicyRegistry,
    cancel: &CancelToken,
) -> Result<BumpReport> {
    let target = args.validate()?;

    repo.ensure_clean()?;
    let manifest_path = workdir.join(&config.manifest);
    let mut manifest = load_manifest(&manifest_path)?;
    manifest.release_settings()?;

    let policy = registry.get(&manifest.language)?;
    let channel = config.channels.current;

    let needs_remote = channel.is_preview() || config.release.tag_mode == TagMode::Shared;
    let fetch_warning = if needs_remote {
        fetch_tolerantly(repo, &config.remote)?
    } else {
        None
    };

    let stable = BranchManifestSource::new(
        repo,
        config.remote.as_str(),
        config.channels.stable_branch.as_str(),
        config.manifest.as_str(),
    );
    let catch_up = config.release.catch_up.strategy();
    let ctx = BumpContext {
        policy,
        channel,
        mode: config.release.bump_mode,
        stable: &stable,
        catch_up: catch_up.as_ref(),
    };

    let mut plan = match target {
        BumpTarget::Single { library, version } => {
            plan_single(repo, &manifest, &ctx, &library, version.as_deref())?
        }
        BumpTarget::All => {
            let scan_target = ScanTarget {
                remote: config.remote.clone(),
                branch: config.channels.branch_for(channel).to_string(),
            };
            plan_all(repo, &manifest, &ctx, config.release.tag_mode, &scan_target)?
        }
    };
    if let Some(warning) = fetch_warning {
        plan.warnings.insert(0, warning);
    }

    if !args.dry_run && !plan.is_empty() {
        let applier: Box<dyn VersionApplier> = match &config.hooks.apply_version {
            Some(script) => {
                Box::new(ScriptApplier::new(script, workdir).with_cancel(cancel.clone()))
            }
            None => Box::new(NoopApplier),
        };
        apply_plan(&mut manifest, &plan, applier.as_ref())?;
        save_manifest(&manifest_path, &manifest)?;
        info!(count = plan.bumps.len(), manifest = %manifest_path.display(), "manifest updated");
    }

    Ok(BumpReport {
        plan,
        dry_run: args.dry_run,
    })
}

/// Versioning options of the ecosystem declared by the manifest at `HEAD`.
///
/// A missing manifest or one without a language gets the strict defaults.
fn head_versioning_options<R: Repository + ?Sized>(
    repo: &R,
    config: &Config,
    registry: &PolicyRegistry,
) -> Result<VersioningOptions> {
    let Some(content) = repo.show_file("HEAD", &config.manifest)? else {
        return Ok(VersioningOptions::default());
    };
    let manifest = Manifest::from_yaml(&content)?;
    if manifest.language.trim().is_empty() {
        return Ok(VersioningOptions::default());
    }
    Ok(registry.get(&manifest.language)?.options())
}

/// Tag workflow
///
/// Reconstructs the release commit from the manifest history, then creates one tag
/// per library released there (only `args.library` when given).
pub fn run_tag<R: Repository + ?Sized>(
    args: &TagArgs,
    config: &Config,
    repo: &R,
    registry: &PolicyRegistry,
) -> Result<TagReport> {
    let filter = args
        .library
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty());

    let options = head_versioning_options(repo, config, registry)?;
    let release = find_release_commit(repo, &config.manifest, filter, options)?;
    let tags = plan_tags(&release, filter)?;

    if !args.dry_run {
        apply_tags(repo, &tags)?;
    }

    Ok(TagReport {
        release,
        tags,
        dry_run: args.dry_run,
    })
}
