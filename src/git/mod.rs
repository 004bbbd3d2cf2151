//! Git operations abstraction layer
//!
//! The release engine never talks to git directly. It goes through the
//! [`Repository`] trait, which has two implementations:
//!
//! - [repository::Git2Repository]: a real repository, backed by the `git2` crate
//! - [mock::MockRepository]: an in-memory linear history for tests
//!
//! Commits are identified by their full hex hash everywhere in this interface.
//!
//! ```rust
//! # use librarian::git::Repository;
//! # fn example<R: Repository>(repo: &R) -> librarian::Result<()> {
//! for commit in repo.commits_touching_path("librarian.yaml", None)? {
//!     let manifest = repo.show_file(&commit.hash, "librarian.yaml")?;
//!     println!("{}: {} bytes", commit.hash, manifest.map(|m| m.len()).unwrap_or(0));
//! }
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::error::Result;
use std::path::{Path, PathBuf};

/// Commit information for analysis
#[derive(Debug, Clone, PartialEq)]
pub struct CommitInfo {
    /// The full commit hash
    pub hash: String,
    /// The commit message
    pub message: String,
    /// The commit author
    pub author: String,
    /// Paths changed relative to the first parent (every path for a root commit)
    pub files: Vec<PathBuf>,
}

/// Version-control operations the release engine depends on.
///
/// Every call is blocking and completes before the next one is issued. Results are
/// not cached between calls.
///
/// ## Error Handling
///
/// Implementations map underlying failures onto [crate::error::LibrarianError]:
/// unresolvable tags, branches and revisions become `Lookup` errors carrying the
/// identifier that failed.
pub trait Repository {
    /// Most recent tag reachable from `<remote>/<branch>`
    ///
    /// # Returns
    /// * `Ok(Some(tag))` - The nearest tag walking back from the branch tip
    /// * `Ok(None)` - If no tag is reachable
    /// * `Err` - If the branch cannot be resolved
    fn last_tag(&self, remote: &str, branch: &str) -> Result<Option<String>>;

    /// Resolve a tag name to the commit it points at, `None` if the tag doesn't exist
    fn resolve_tag(&self, tag_name: &str) -> Result<Option<String>>;

    /// Resolve any revision (hash, branch, tag, `HEAD`) to a commit hash
    fn resolve_revision(&self, revision: &str) -> Result<String>;

    /// Files changed between `from` (exclusive) and `HEAD`, minus ignored prefixes
    fn changed_files_since(&self, from: &str, ignore: &[String]) -> Result<Vec<PathBuf>>;

    /// Commits reachable from `HEAD` that touched `path`, newest first
    ///
    /// # Arguments
    /// * `path` - A file or directory, relative to the repository root
    /// * `since` - Stop before this commit (exclusive); `None` walks all history
    fn commits_touching_path(&self, path: &str, since: Option<&str>) -> Result<Vec<CommitInfo>>;

    /// Content of `path` as of `revision`, `None` if the file does not exist there
    fn show_file(&self, revision: &str, path: &str) -> Result<Option<String>>;

    /// Content of `path` at the tip of `<remote>/<branch>`
    ///
    /// Fails with a `Lookup` error when the remote branch is unknown.
    fn show_file_on_branch(&self, remote: &str, branch: &str, path: &str)
        -> Result<Option<String>>;

    /// Create a lightweight tag at `commit`; an existing tag of that name is an error
    fn create_tag(&self, name: &str, commit: &str) -> Result<()>;

    /// Fail with a `Precondition` error unless the working tree is clean
    fn ensure_clean(&self) -> Result<()>;

    /// Update remote-tracking branches and tags from `remote`
    fn fetch(&self, remote: &str) -> Result<()>;
}

/// True when `path` lies under one of the `ignore` prefixes (component-wise)
pub fn is_ignored(path: &Path, ignore: &[String]) -> bool {
    ignore.iter().any(|prefix| {
        let prefix = prefix.trim().trim_end_matches('/');
        !prefix.is_empty() && path.starts_with(prefix)
    })
}
