//! Historical release reconstruction.
//!
//! Finds the commit that performed a release by replaying the manifest's history
//! backwards, without relying on tags. The walk is a small state machine: the
//! [`ScanState`] holds the newer side of the transition under inspection, and
//! [`step`] feeds it the next-older snapshot. A release is always attributed to the
//! newer commit, whose tree is the first to contain the new version.

use crate::domain::manifest::{short, ManifestSnapshot};
use crate::error::{LibrarianError, Result};
use crate::git::Repository;
use crate::release::detect::find_released_libraries;
use crate::version::VersioningOptions;
use tracing::{debug, info};

/// The commit that introduced a release, with the manifest as of that commit
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseCommit {
    pub commit: String,
    pub snapshot: ManifestSnapshot,
    /// Every library released by the transition into `commit`
    pub released: Vec<String>,
}

/// Newer half of the transition being inspected; empty before the first commit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanState {
    pub newer: Option<ManifestSnapshot>,
}

/// Outcome of feeding one older snapshot to the scan
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// No qualifying release yet; keep walking with this state
    Continue(ScanState),
    /// The transition older -> newer released the requested scope
    Found(ReleaseCommit),
}

/// Advance the scan by one commit, `older` being the snapshot just loaded.
pub fn step(
    state: ScanState,
    older: ManifestSnapshot,
    filter: Option<&str>,
    options: VersioningOptions,
) -> Result<Step> {
    let Some(newer) = state.newer else {
        return Ok(Step::Continue(ScanState { newer: Some(older) }));
    };

    let released = find_released_libraries(&older.manifest, &newer.manifest, options).map_err(|e| {
        LibrarianError::version(format!(
            "Between {} and {}: {}",
            short(&older.commit),
            short(&newer.commit),
            e
        ))
    })?;

    let qualifies = match filter {
        Some(name) => released.iter().any(|r| r == name),
        None => !released.is_empty(),
    };

    if qualifies {
        return Ok(Step::Found(ReleaseCommit {
            commit: newer.commit.clone(),
            snapshot: newer,
            released,
        }));
    }

    if !released.is_empty() {
        debug!(
            commit = short(&newer.commit),
            released = ?released,
            "skipping release outside filter"
        );
    }
    Ok(Step::Continue(ScanState { newer: Some(older) }))
}

/// Run the scan over snapshots ordered newest first.
pub fn scan<I>(
    snapshots: I,
    filter: Option<&str>,
    options: VersioningOptions,
) -> Result<ReleaseCommit>
where
    I: IntoIterator<Item = Result<ManifestSnapshot>>,
{
    let mut state = ScanState::default();
    for snapshot in snapshots {
        match step(state, snapshot?, filter, options)? {
            Step::Found(release) => return Ok(release),
            Step::Continue(next) => state = next,
        }
    }

    Err(LibrarianError::no_release_commit(match filter {
        Some(name) => format!("no commit in history releases library '{}'", name),
        None => "no commit in history releases any library".to_string(),
    }))
}

/// Find the commit that released `filter` (or any library) by walking the history
/// of `manifest_path` reachable from `HEAD`.
///
/// `options` are the manifest ecosystem's; they decide which downgrades count as
/// releases rather than regressions.
pub fn find_release_commit<R: Repository + ?Sized>(
    repo: &R,
    manifest_path: &str,
    filter: Option<&str>,
    options: VersioningOptions,
) -> Result<ReleaseCommit> {
    let commits = repo.commits_touching_path(manifest_path, None)?;
    debug!(
        manifest = manifest_path,
        count = commits.len(),
        "walking manifest history"
    );

    let snapshots = commits.into_iter().map(|commit| {
        debug!(commit = short(&commit.hash), "loading manifest snapshot");
        let content = repo.show_file(&commit.hash, manifest_path)?;
        ManifestSnapshot::parse(&commit.hash, content.as_deref())
    });

    let release = scan(snapshots, filter, options)?;
    info!(
        commit = short(&release.commit),
        released = ?release.released,
        "found release commit"
    );
    Ok(release)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::library::LibraryVersionRecord;
    use crate::domain::manifest::Manifest;
    use crate::git::MockRepository;
    use proptest::prelude::*;

    const MANIFEST: &str = "librarian.yaml";
    const STRICT: VersioningOptions = VersioningOptions {
        bump_version_core: false,
        downgrade_pre_ga_changes: false,
    };

    fn yaml(libraries: &[(&str, &str)]) -> String {
        let manifest = Manifest {
            language: "rust".to_string(),
            libraries: libraries
                .iter()
                .map(|(n, v)| LibraryVersionRecord::new(*n, *v))
                .collect(),
            ..Manifest::default()
        };
        manifest.to_yaml().unwrap()
    }

    fn commit_manifest(repo: &mut MockRepository, message: &str, libraries: &[(&str, &str)]) -> String {
        let content = yaml(libraries);
        repo.commit(message, &[(MANIFEST, Some(content.as_str()))])
    }

    fn snapshot(commit: &str, libraries: &[(&str, &str)]) -> ManifestSnapshot {
        ManifestSnapshot::parse(commit, Some(yaml(libraries).as_str())).unwrap()
    }

    #[test]
    fn test_step_first_commit_becomes_candidate() {
        let older = snapshot("c1", &[("a", "1.0.0")]);
        let result = step(ScanState::default(), older.clone(), None, STRICT).unwrap();
        assert_eq!(result, Step::Continue(ScanState { newer: Some(older) }));
    }

    #[test]
    fn test_step_attributes_release_to_newer_commit() {
        let newer = snapshot("newer", &[("a", "1.1.0")]);
        let older = snapshot("older", &[("a", "1.0.0")]);
        let state = ScanState {
            newer: Some(newer.clone()),
        };

        match step(state, older, None, STRICT).unwrap() {
            Step::Found(release) => {
                assert_eq!(release.commit, "newer");
                assert_eq!(release.snapshot, newer);
                assert_eq!(release.released, vec!["a".to_string()]);
            }
            other => panic!("expected release, got {:?}", other),
        }
    }

    #[test]
    fn test_step_no_change_moves_candidate_back() {
        let newer = snapshot("newer", &[("a", "1.0.0")]);
        let older = snapshot("older", &[("a", "1.0.0")]);
        let state = ScanState { newer: Some(newer) };

        assert_eq!(
            step(state, older.clone(), None, STRICT).unwrap(),
            Step::Continue(ScanState { newer: Some(older) })
        );
    }

    #[test]
    fn test_step_filter_skips_other_library() {
        let newer = snapshot("newer", &[("lib1", "1.0.0"), ("lib2", "2.1.0")]);
        let older = snapshot("older", &[("lib1", "1.0.0"), ("lib2", "2.0.0")]);
        let state = ScanState { newer: Some(newer) };

        assert!(matches!(
            step(state, older, Some("lib1"), STRICT).unwrap(),
            Step::Continue(_)
        ));
    }

    #[test]
    fn test_step_regression_names_commits() {
        let newer = snapshot("aaaaaaaaaa", &[("a", "1.0.0")]);
        let older = snapshot("bbbbbbbbbb", &[("a", "2.0.0")]);
        let err = step(ScanState { newer: Some(newer) }, older, None, STRICT).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("bbbbbbb"));
        assert!(message.contains("aaaaaaa"));
    }

    #[test]
    fn test_scan_empty_history() {
        let err = scan(Vec::new(), None, STRICT).unwrap_err();
        assert!(err.is_no_release_commit());
    }

    #[test]
    fn test_scan_propagates_load_errors() {
        let snapshots = vec![
            Ok(snapshot("c2", &[("a", "1.0.0")])),
            Err(LibrarianError::lookup("cannot read c1")),
        ];
        let err = scan(snapshots, None, STRICT).unwrap_err();
        assert!(matches!(err, LibrarianError::Lookup(_)));
    }

    #[test]
    fn test_find_release_commit_latest() {
        let mut repo = MockRepository::new();
        commit_manifest(&mut repo, "onboard", &[("a", "1.0.0")]);
        let release = commit_manifest(&mut repo, "chore: release", &[("a", "1.1.0")]);

        let found = find_release_commit(&repo, MANIFEST, None, STRICT).unwrap();
        assert_eq!(found.commit, release);
        assert_eq!(found.released, vec!["a".to_string()]);
    }

    #[test]
    fn test_find_release_commit_filtered_skips_newer_release() {
        let mut repo = MockRepository::new();
        commit_manifest(&mut repo, "init", &[("lib1", "1.0.0"), ("lib2", "1.0.0")]);
        let lib1_release = commit_manifest(
            &mut repo,
            "release lib1",
            &[("lib1", "1.1.0"), ("lib2", "1.0.0")],
        );
        commit_manifest(
            &mut repo,
            "release lib2",
            &[("lib1", "1.1.0"), ("lib2", "1.1.0")],
        );
        repo.commit("feat: unrelated", &[("lib1/src/a.rs", Some("x"))]);
        repo.commit("fix: unrelated", &[("lib2/src/b.rs", Some("y"))]);

        let found = find_release_commit(&repo, MANIFEST, Some("lib1"), STRICT).unwrap();
        assert_eq!(found.commit, lib1_release);
        assert_eq!(found.snapshot.manifest.find("lib1").unwrap().version, "1.1.0");
    }

    #[test]
    fn test_find_release_commit_needs_a_transition() {
        let mut repo = MockRepository::new();
        repo.commit("unrelated", &[("README.md", Some("hi"))]);
        commit_manifest(&mut repo, "add manifest", &[("a", "0.1.0")]);

        let err = find_release_commit(&repo, MANIFEST, None, STRICT).unwrap_err();
        assert!(err.is_no_release_commit());
    }

    #[test]
    fn test_find_release_commit_after_manifest_deleted_and_restored() {
        let mut repo = MockRepository::new();
        commit_manifest(&mut repo, "init", &[("a", "1.0.0")]);
        repo.commit("remove", &[(MANIFEST, None)]);
        let restored = commit_manifest(&mut repo, "restore", &[("a", "1.0.0")]);

        let found = find_release_commit(&repo, MANIFEST, None, STRICT).unwrap();
        assert_eq!(found.commit, restored);
    }

    #[test]
    fn test_find_release_commit_none_found() {
        let mut repo = MockRepository::new();
        commit_manifest(&mut repo, "onboard", &[("a", "")]);
        commit_manifest(&mut repo, "touch", &[("a", ""), ("b", "")]);

        let err = find_release_commit(&repo, MANIFEST, None, STRICT).unwrap_err();
        assert!(err.is_no_release_commit());
    }

    #[test]
    fn test_find_release_commit_unknown_library() {
        let mut repo = MockRepository::new();
        commit_manifest(&mut repo, "init", &[("a", "1.0.0")]);
        commit_manifest(&mut repo, "release", &[("a", "1.1.0")]);

        let err = find_release_commit(&repo, MANIFEST, Some("zzz"), STRICT).unwrap_err();
        assert!(err.is_no_release_commit());
        assert!(err.to_string().contains("zzz"));
    }

    #[test]
    fn test_find_release_commit_accepts_allowed_pre_ga_downgrade() {
        let mut repo = MockRepository::new();
        commit_manifest(&mut repo, "init", &[("a", "0.5.0")]);
        let rollback = commit_manifest(&mut repo, "chore: roll back a", &[("a", "0.4.0")]);

        let err = find_release_commit(&repo, MANIFEST, None, STRICT).unwrap_err();
        assert!(err.to_string().contains("regress"));

        let lenient = VersioningOptions {
            bump_version_core: true,
            downgrade_pre_ga_changes: true,
        };
        let found = find_release_commit(&repo, MANIFEST, None, lenient).unwrap();
        assert_eq!(found.commit, rollback);
    }

    #[test]
    fn test_find_release_commit_rejects_tag_style_version() {
        let mut repo = MockRepository::new();
        commit_manifest(&mut repo, "init", &[("a", "1.2.0")]);
        repo.commit(
            "chore: reformat",
            &[(MANIFEST, Some("libraries:\n  - name: a\n    version: v1.2.0\n"))],
        );

        let err = find_release_commit(&repo, MANIFEST, None, STRICT).unwrap_err();
        assert!(matches!(err, LibrarianError::Config(_)), "got: {}", err);
        assert!(err.to_string().contains("v1.2.0"));
    }

    proptest! {
        #[test]
        fn prop_unrelated_commits_do_not_move_release(extra in 0usize..12) {
            let mut repo = MockRepository::new();
            commit_manifest(&mut repo, "init", &[("a", "1.0.0")]);
            let release = commit_manifest(&mut repo, "release", &[("a", "1.1.0")]);
            for i in 0..extra {
                let path = format!("a/src/file{}.rs", i);
                repo.commit("feat: more", &[(path.as_str(), Some("x"))]);
            }

            let found = find_release_commit(&repo, MANIFEST, None, STRICT).unwrap();
            prop_assert_eq!(found.commit, release);
        }
    }
}
