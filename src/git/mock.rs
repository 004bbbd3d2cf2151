use crate::error::{LibrarianError, Result};
use crate::git::{is_ignored, CommitInfo, Repository};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
struct MockCommit {
    info: CommitInfo,
    tree: BTreeMap<String, String>,
}

/// Linear in-memory history for testing without actual git operations.
///
/// Each [`MockRepository::commit`] applies file changes on top of the previous tree.
/// Hashes are deterministic 40-character hex strings.
pub struct MockRepository {
    commits: Vec<MockCommit>,
    tags: RefCell<BTreeMap<String, String>>,
    remote_files: HashMap<String, BTreeMap<String, String>>,
    dirty: bool,
}

impl MockRepository {
    /// Create a new empty mock repository
    pub fn new() -> Self {
        MockRepository {
            commits: Vec::new(),
            tags: RefCell::new(BTreeMap::new()),
            remote_files: HashMap::new(),
            dirty: false,
        }
    }

    /// Record a commit writing (`Some`) or deleting (`None`) files; returns its hash
    pub fn commit(&mut self, message: &str, changes: &[(&str, Option<&str>)]) -> String {
        let mut tree = self
            .commits
            .last()
            .map(|c| c.tree.clone())
            .unwrap_or_default();

        let mut changed = Vec::new();
        for (path, content) in changes {
            match content {
                Some(content) => {
                    tree.insert(path.to_string(), content.to_string());
                }
                None => {
                    tree.remove(*path);
                }
            }
            changed.push(PathBuf::from(*path));
        }

        let hash = format!("{:040x}", self.commits.len() + 1);
        self.commits.push(MockCommit {
            info: CommitInfo {
                hash: hash.clone(),
                message: message.to_string(),
                author: "Test Author".to_string(),
                files: changed,
            },
            tree,
        });
        hash
    }

    /// Add a tag pointing to a commit hash
    pub fn add_tag(&mut self, name: impl Into<String>, hash: impl Into<String>) {
        self.tags.borrow_mut().insert(name.into(), hash.into());
    }

    /// Set a file's content at the tip of `<remote>/<branch>`
    pub fn set_remote_file(&mut self, remote: &str, branch: &str, path: &str, content: &str) {
        self.remote_files
            .entry(format!("{}/{}", remote, branch))
            .or_default()
            .insert(path.to_string(), content.to_string());
    }

    /// Register `<remote>/<branch>` without any files
    pub fn add_remote_branch(&mut self, remote: &str, branch: &str) {
        self.remote_files
            .entry(format!("{}/{}", remote, branch))
            .or_default();
    }

    pub fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    /// All tags as (name, commit) pairs, sorted by name
    pub fn tags(&self) -> Vec<(String, String)> {
        self.tags
            .borrow()
            .iter()
            .map(|(n, h)| (n.clone(), h.clone()))
            .collect()
    }

    pub fn head(&self) -> Option<&str> {
        self.commits.last().map(|c| c.info.hash.as_str())
    }

    fn index_of(&self, revision: &str) -> Result<usize> {
        if revision == "HEAD" {
            return self
                .commits
                .len()
                .checked_sub(1)
                .ok_or_else(|| LibrarianError::lookup("Repository has no commits"));
        }
        if let Some(hash) = self.tags.borrow().get(revision) {
            return self.index_of(hash);
        }
        self.commits
            .iter()
            .position(|c| c.info.hash == revision)
            .ok_or_else(|| {
                LibrarianError::lookup(format!("Cannot resolve revision '{}'", revision))
            })
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for MockRepository {
    fn last_tag(&self, remote: &str, branch: &str) -> Result<Option<String>> {
        if !self.remote_files.is_empty()
            && !self
                .remote_files
                .contains_key(&format!("{}/{}", remote, branch))
        {
            return Err(LibrarianError::lookup(format!(
                "Cannot find branch '{}/{}'",
                remote, branch
            )));
        }

        let tags = self.tags.borrow();
        for commit in self.commits.iter().rev() {
            if let Some(name) = tags
                .iter()
                .filter(|(_, hash)| **hash == commit.info.hash)
                .map(|(name, _)| name)
                .max()
            {
                return Ok(Some(name.clone()));
            }
        }
        Ok(None)
    }

    fn resolve_tag(&self, tag_name: &str) -> Result<Option<String>> {
        Ok(self.tags.borrow().get(tag_name).cloned())
    }

    fn resolve_revision(&self, revision: &str) -> Result<String> {
        let index = self.index_of(revision)?;
        Ok(self.commits[index].info.hash.clone())
    }

    fn changed_files_since(&self, from: &str, ignore: &[String]) -> Result<Vec<PathBuf>> {
        let start = self.index_of(from)?;
        let mut files: Vec<PathBuf> = Vec::new();
        for commit in &self.commits[start + 1..] {
            for path in &commit.info.files {
                if !is_ignored(path, ignore) && !files.contains(path) {
                    files.push(path.clone());
                }
            }
        }
        Ok(files)
    }

    fn commits_touching_path(&self, path: &str, since: Option<&str>) -> Result<Vec<CommitInfo>> {
        let stop = match since {
            Some(rev) => Some(self.index_of(rev)?),
            None => None,
        };
        let target = Path::new(path.trim_end_matches('/'));

        Ok(self
            .commits
            .iter()
            .enumerate()
            .rev()
            .take_while(|(i, _)| stop.map(|s| *i > s).unwrap_or(true))
            .filter(|(_, c)| c.info.files.iter().any(|p| p.starts_with(target)))
            .map(|(_, c)| c.info.clone())
            .collect())
    }

    fn show_file(&self, revision: &str, path: &str) -> Result<Option<String>> {
        let index = self.index_of(revision)?;
        Ok(self.commits[index].tree.get(path).cloned())
    }

    fn show_file_on_branch(
        &self,
        remote: &str,
        branch: &str,
        path: &str,
    ) -> Result<Option<String>> {
        let files = self
            .remote_files
            .get(&format!("{}/{}", remote, branch))
            .ok_or_else(|| {
                LibrarianError::lookup(format!("Cannot find branch '{}/{}'", remote, branch))
            })?;
        Ok(files.get(path).cloned())
    }

    fn create_tag(&self, name: &str, commit: &str) -> Result<()> {
        self.index_of(commit)?;
        let mut tags = self.tags.borrow_mut();
        if tags.contains_key(name) {
            return Err(LibrarianError::tag(format!(
                "Cannot create tag '{}' at {}: tag already exists",
                name, commit
            )));
        }
        tags.insert(name.to_string(), commit.to_string());
        Ok(())
    }

    fn ensure_clean(&self) -> Result<()> {
        if self.dirty {
            return Err(LibrarianError::precondition("Working tree is not clean"));
        }
        Ok(())
    }

    fn fetch(&self, _remote: &str) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_commit_hashes_are_sequential() {
        let mut repo = MockRepository::new();
        let first = repo.commit("first", &[("a.txt", Some("1"))]);
        let second = repo.commit("second", &[("a.txt", Some("2"))]);

        assert_eq!(first.len(), 40);
        assert_ne!(first, second);
        assert_eq!(repo.head(), Some(second.as_str()));
        assert_eq!(repo.resolve_revision("HEAD").unwrap(), second);
    }

    #[test]
    fn test_mock_show_file_tracks_tree() {
        let mut repo = MockRepository::new();
        let first = repo.commit("add", &[("a.txt", Some("1")), ("b.txt", Some("x"))]);
        let second = repo.commit("delete", &[("b.txt", None)]);

        assert_eq!(repo.show_file(&first, "b.txt").unwrap(), Some("x".to_string()));
        assert_eq!(repo.show_file(&second, "b.txt").unwrap(), None);
        assert_eq!(repo.show_file(&second, "a.txt").unwrap(), Some("1".to_string()));
    }

    #[test]
    fn test_mock_tags() {
        let mut repo = MockRepository::new();
        let hash = repo.commit("c", &[("a", Some("1"))]);
        repo.add_tag("v1.0.0", hash.clone());

        assert_eq!(repo.resolve_tag("v1.0.0").unwrap(), Some(hash.clone()));
        assert_eq!(repo.resolve_tag("v2.0.0").unwrap(), None);
        assert_eq!(repo.resolve_revision("v1.0.0").unwrap(), hash);
    }

    #[test]
    fn test_mock_create_tag_rejects_duplicates() {
        let mut repo = MockRepository::new();
        let hash = repo.commit("c", &[("a", Some("1"))]);
        repo.create_tag("lib/v1.0.0", &hash).unwrap();
        assert!(repo.create_tag("lib/v1.0.0", &hash).is_err());
        assert_eq!(repo.tags().len(), 1);
    }

    #[test]
    fn test_mock_commits_touching_path_newest_first() {
        let mut repo = MockRepository::new();
        let c1 = repo.commit("one", &[("m.yaml", Some("1"))]);
        repo.commit("unrelated", &[("other.txt", Some("x"))]);
        let c3 = repo.commit("three", &[("m.yaml", Some("3"))]);

        let hashes: Vec<String> = repo
            .commits_touching_path("m.yaml", None)
            .unwrap()
            .into_iter()
            .map(|c| c.hash)
            .collect();
        assert_eq!(hashes, vec![c3.clone(), c1.clone()]);

        let since: Vec<String> = repo
            .commits_touching_path("m.yaml", Some(&c1))
            .unwrap()
            .into_iter()
            .map(|c| c.hash)
            .collect();
        assert_eq!(since, vec![c3]);
    }

    #[test]
    fn test_mock_commits_touching_directory() {
        let mut repo = MockRepository::new();
        repo.commit("lib", &[("lib1/src/a.rs", Some("a"))]);
        repo.commit("other", &[("lib10/src/a.rs", Some("a"))]);

        assert_eq!(repo.commits_touching_path("lib1", None).unwrap().len(), 1);
    }

    #[test]
    fn test_mock_changed_files_since() {
        let mut repo = MockRepository::new();
        let base = repo.commit("base", &[("a/x", Some("1"))]);
        repo.commit("next", &[("a/y", Some("1")), (".github/ci.yaml", Some("1"))]);
        repo.commit("again", &[("a/y", Some("2"))]);

        let files = repo
            .changed_files_since(&base, &[".github".to_string()])
            .unwrap();
        assert_eq!(files, vec![PathBuf::from("a/y")]);
    }

    #[test]
    fn test_mock_remote_branch_lookup() {
        let mut repo = MockRepository::new();
        repo.set_remote_file("origin", "main", "m.yaml", "libraries: []");

        assert!(repo
            .show_file_on_branch("origin", "main", "m.yaml")
            .unwrap()
            .is_some());
        assert!(repo
            .show_file_on_branch("origin", "missing", "m.yaml")
            .is_err());
    }

    #[test]
    fn test_mock_dirty_tree() {
        let mut repo = MockRepository::default();
        assert!(repo.ensure_clean().is_ok());
        repo.set_dirty(true);
        assert!(repo.ensure_clean().is_err());
    }
}
