//! Preview/stable channel coupling.
//!
//! A preview version is always derived against the same library's stable version,
//! which is authoritative. When the preview track is ahead, only its pre-release
//! counter moves. When stable has caught up or overtaken it, a [`CatchUpStrategy`]
//! picks the new preview line.

use crate::domain::manifest::ManifestSnapshot;
use crate::domain::prerelease::{PreRelease, PreReleaseType};
use crate::domain::version::{baseline, core, Version};
use crate::error::Result;
use crate::git::Repository;
use crate::version::max_version;
use tracing::{debug, info};

/// How a preview track restarts once the stable track has reached it
pub trait CatchUpStrategy {
    fn name(&self) -> &'static str;

    /// First preview version after `base`, labelled `label`
    fn catch_up(&self, base: &Version, label: &PreReleaseType) -> Result<Version>;
}

/// `1.2.0` -> `1.3.0-preview.1`
#[derive(Debug, Clone, Copy, Default)]
pub struct NextMinorPreview;

impl CatchUpStrategy for NextMinorPreview {
    fn name(&self) -> &'static str {
        "next-minor"
    }

    fn catch_up(&self, base: &Version, label: &PreReleaseType) -> Result<Version> {
        let next = Version::new(base.major, base.minor + 1, 0);
        PreRelease::first(label.clone()).apply_to(&next)
    }
}

/// `1.2.0` -> `1.2.1-preview.1`
#[derive(Debug, Clone, Copy, Default)]
pub struct NextPatchPreview;

impl CatchUpStrategy for NextPatchPreview {
    fn name(&self) -> &'static str {
        "next-patch"
    }

    fn catch_up(&self, base: &Version, label: &PreReleaseType) -> Result<Version> {
        let next = Version::new(base.major, base.minor, base.patch + 1);
        PreRelease::first(label.clone()).apply_to(&next)
    }
}

/// Where the stable version of a library comes from
pub trait StableVersionSource {
    /// Stable version of `library`, `None` when the stable track has never released it
    fn stable_version(&self, library: &str) -> Result<Option<Version>>;
}

/// Reads the manifest at the tip of the stable branch
pub struct BranchManifestSource<'a, R: Repository + ?Sized> {
    repo: &'a R,
    remote: String,
    branch: String,
    manifest_path: String,
}

impl<'a, R: Repository + ?Sized> BranchManifestSource<'a, R> {
    pub fn new(
        repo: &'a R,
        remote: impl Into<String>,
        branch: impl Into<String>,
        manifest_path: impl Into<String>,
    ) -> Self {
        BranchManifestSource {
            repo,
            remote: remote.into(),
            branch: branch.into(),
            manifest_path: manifest_path.into(),
        }
    }
}

impl<R: Repository + ?Sized> StableVersionSource for BranchManifestSource<'_, R> {
    fn stable_version(&self, library: &str) -> Result<Option<Version>> {
        let content =
            self.repo
                .show_file_on_branch(&self.remote, &self.branch, &self.manifest_path)?;
        let origin = format!("{}/{}", self.remote, self.branch);
        let snapshot = ManifestSnapshot::parse(&origin, content.as_deref())?;

        match snapshot.manifest.find(library) {
            Some(record) => record.parsed_version(),
            None => Ok(None),
        }
    }
}

/// Next preview version given the current preview and the stable baseline.
///
/// Increments the pre-release counter while the preview is strictly ahead of stable
/// and already carries a label; otherwise restarts from the greater of the two via
/// `strategy`.
pub fn derive_next_preview(
    current_preview: &Version,
    stable: &Version,
    label: &PreReleaseType,
    strategy: &dyn CatchUpStrategy,
) -> Result<Version> {
    if current_preview > stable {
        if let Some(pre) = PreRelease::from_version(current_preview)? {
            let next = pre.next().apply_to(current_preview)?;
            debug!(%current_preview, %stable, %next, "preview ahead of stable");
            return Ok(next);
        }
    }

    let base = core(max_version(stable, current_preview));
    let next = strategy.catch_up(&base, label)?;
    info!(
        %current_preview,
        %stable,
        %next,
        strategy = strategy.name(),
        "preview caught up with stable"
    );
    Ok(next)
}

/// Look up the stable baseline for `library` and derive its next preview version.
///
/// A library the stable track does not know yet has baseline `0.0.0`.
pub fn resolve_preview_version(
    library: &str,
    current_preview: &Version,
    source: &dyn StableVersionSource,
    label: &PreReleaseType,
    strategy: &dyn CatchUpStrategy,
) -> Result<Version> {
    let stable = match source.stable_version(library)? {
        Some(version) => version,
        None => {
            debug!(library, "library not on stable track, using baseline");
            baseline()
        }
    };
    derive_next_preview(current_preview, &stable, label, strategy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::version::parse_version;
    use crate::git::MockRepository;
    use std::collections::HashMap;

    fn v(s: &str) -> Version {
        parse_version(s).unwrap()
    }

    struct FixedSource(HashMap<&'static str, &'static str>);

    impl StableVersionSource for FixedSource {
        fn stable_version(&self, library: &str) -> Result<Option<Version>> {
            self.0.get(library).map(|s| parse_version(s)).transpose()
        }
    }

    #[test]
    fn test_preview_ahead_increments_counter() {
        let next = derive_next_preview(
            &v("1.3.0-preview.2"),
            &v("1.2.0"),
            &PreReleaseType::Preview,
            &NextMinorPreview,
        )
        .unwrap();
        assert_eq!(next, v("1.3.0-preview.3"));
    }

    #[test]
    fn test_preview_behind_catches_up_next_minor() {
        let next = derive_next_preview(
            &v("1.2.0-preview.4"),
            &v("1.2.0"),
            &PreReleaseType::Preview,
            &NextMinorPreview,
        )
        .unwrap();
        assert_eq!(next, v("1.3.0-preview.1"));
    }

    #[test]
    fn test_preview_far_behind_catches_up_next_patch() {
        let next = derive_next_preview(
            &v("1.0.0-preview.1"),
            &v("2.4.1"),
            &PreReleaseType::Preview,
            &NextPatchPreview,
        )
        .unwrap();
        assert_eq!(next, v("2.4.2-preview.1"));
    }

    #[test]
    fn test_unlabelled_preview_ahead_restarts_line() {
        let next = derive_next_preview(
            &v("1.3.0"),
            &v("1.2.0"),
            &PreReleaseType::Preview,
            &NextMinorPreview,
        )
        .unwrap();
        assert_eq!(next, v("1.4.0-preview.1"));
    }

    #[test]
    fn test_label_without_counter_gets_one() {
        let next = derive_next_preview(
            &v("0.2.0-beta"),
            &v("0.1.0"),
            &PreReleaseType::Beta,
            &NextMinorPreview,
        )
        .unwrap();
        assert_eq!(next, v("0.2.0-beta.1"));
    }

    #[test]
    fn test_next_preview_is_always_greater() {
        let cases = [
            ("1.3.0-preview.2", "1.2.0"),
            ("1.2.0-preview.4", "1.2.0"),
            ("1.0.0-preview.1", "2.4.1"),
            ("1.3.0", "1.2.0"),
            ("0.1.0-preview.1", "0.0.0"),
        ];
        for (preview, stable) in cases {
            for strategy in [&NextMinorPreview as &dyn CatchUpStrategy, &NextPatchPreview] {
                let next =
                    derive_next_preview(&v(preview), &v(stable), &PreReleaseType::Preview, strategy)
                        .unwrap();
                assert!(next > v(preview), "{} -> {}", preview, next);
                assert!(next > v(stable), "{} vs stable {}", next, stable);
            }
        }
    }

    #[test]
    fn test_missing_stable_uses_baseline() {
        let source = FixedSource(HashMap::new());
        let next = resolve_preview_version(
            "lib1",
            &v("0.1.0-preview.1"),
            &source,
            &PreReleaseType::Preview,
            &NextMinorPreview,
        )
        .unwrap();
        assert_eq!(next, v("0.1.0-preview.2"));
    }

    #[test]
    fn test_stable_source_consulted() {
        let source = FixedSource(HashMap::from([("lib1", "0.1.0")]));
        let next = resolve_preview_version(
            "lib1",
            &v("0.1.0-preview.5"),
            &source,
            &PreReleaseType::Preview,
            &NextMinorPreview,
        )
        .unwrap();
        assert_eq!(next, v("0.2.0-preview.1"));
    }

    #[test]
    fn test_branch_manifest_source() {
        let mut repo = MockRepository::new();
        repo.set_remote_file(
            "origin",
            "main",
            "librarian.yaml",
            "libraries:\n  - name: lib1\n    version: 1.4.0\n  - name: lib2\n    version: \"\"\n",
        );
        let source = BranchManifestSource::new(&repo, "origin", "main", "librarian.yaml");

        assert_eq!(source.stable_version("lib1").unwrap(), Some(v("1.4.0")));
        assert_eq!(source.stable_version("lib2").unwrap(), None);
        assert_eq!(source.stable_version("lib3").unwrap(), None);
    }

    #[test]
    fn test_branch_manifest_source_missing_file() {
        let mut repo = MockRepository::new();
        repo.add_remote_branch("origin", "main");
        let source = BranchManifestSource::new(&repo, "origin", "main", "librarian.yaml");
        assert_eq!(source.stable_version("lib1").unwrap(), None);
    }

    #[test]
    fn test_branch_manifest_source_missing_branch() {
        let repo = MockRepository::new();
        let source = BranchManifestSource::new(&repo, "origin", "main", "librarian.yaml");
        assert!(source.stable_version("lib1").is_err());
    }
}
