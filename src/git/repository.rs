use crate::cancel::CancelToken;
use crate::error::{LibrarianError, Result};
use crate::git::{is_ignored, CommitInfo};
use git2::{Commit, ErrorCode, Oid, Repository as Git2Repo, Sort, Status, StatusOptions};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
    cancel: CancelToken,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;

        Ok(Git2Repository {
            repo,
            cancel: CancelToken::new(),
        })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository {
            repo,
            cancel: CancelToken::new(),
        }
    }

    /// Check `cancel` before every operation
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Root of the working tree
    pub fn workdir(&self) -> Option<&Path> {
        self.repo.workdir()
    }

    fn find_commit_by_hash(&self, hash: &str) -> Result<Commit<'_>> {
        let oid = Oid::from_str(hash)
            .map_err(|e| LibrarianError::lookup(format!("Invalid commit hash '{}': {}", hash, e)))?;
        self.repo
            .find_commit(oid)
            .map_err(|e| LibrarianError::lookup(format!("Cannot find commit '{}': {}", hash, e)))
    }

    fn remote_branch_oid(&self, remote: &str, branch: &str) -> Result<Oid> {
        let candidates = [
            format!("refs/remotes/{}/{}", remote, branch),
            format!("refs/heads/{}", branch),
        ];
        for name in &candidates {
            match self.repo.find_reference(name) {
                Ok(reference) => {
                    return Ok(reference.peel_to_commit()?.id());
                }
                Err(e) if e.code() == ErrorCode::NotFound => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(LibrarianError::lookup(format!(
            "Cannot find branch '{}/{}'",
            remote, branch
        )))
    }

    fn read_blob_at(&self, commit: &Commit<'_>, path: &str) -> Result<Option<String>> {
        let tree = commit.tree()?;
        let entry = match tree.get_path(Path::new(path)) {
            Ok(entry) => entry,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let blob = self.repo.find_blob(entry.id())?;
        let content = String::from_utf8(blob.content().to_vec()).map_err(|_| {
            LibrarianError::lookup(format!(
                "File '{}' at commit {} is not valid UTF-8",
                path,
                commit.id()
            ))
        })?;
        Ok(Some(content))
    }

    fn entry_id(commit: &Commit<'_>, path: &Path) -> Result<Option<Oid>> {
        match commit.tree()?.get_path(path) {
            Ok(entry) => Ok(Some(entry.id())),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Paths changed by `commit` against its first parent, or its whole tree for a root
    fn files_changed_by(&self, commit: &Commit<'_>) -> Result<Vec<PathBuf>> {
        let tree = commit.tree()?;
        let parent_tree = match commit.parent_count() {
            0 => None,
            _ => Some(commit.parent(0)?.tree()?),
        };
        let diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;

        let mut files: Vec<PathBuf> = Vec::new();
        for delta in diff.deltas() {
            for path in [delta.old_file().path(), delta.new_file().path()].into_iter().flatten() {
                if !files.iter().any(|p| p == path) {
                    files.push(path.to_path_buf());
                }
            }
        }
        Ok(files)
    }

    /// A commit touches `path` unless its entry matches at least one parent's.
    /// Root commits touch every path they contain.
    fn touches(commit: &Commit<'_>, path: &Path) -> Result<bool> {
        let own = Self::entry_id(commit, path)?;
        if commit.parent_count() == 0 {
            return Ok(own.is_some());
        }
        for parent in commit.parents() {
            if Self::entry_id(&parent, path)? == own {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl super::Repository for Git2Repository {
    fn last_tag(&self, remote: &str, branch: &str) -> Result<Option<String>> {
        self.cancel.check("finding last tag")?;
        let tip = self.remote_branch_oid(remote, branch)?;

        // Map commit -> tag names (handles both lightweight and annotated tags)
        let mut tag_commits: BTreeMap<Oid, Vec<String>> = BTreeMap::new();
        let tags = self.repo.tag_names(None)?;
        for tag_name in tags.iter().flatten() {
            if let Ok(reference) = self.repo.find_reference(&format!("refs/tags/{}", tag_name)) {
                if let Ok(commit) = reference.peel_to_commit() {
                    tag_commits
                        .entry(commit.id())
                        .or_default()
                        .push(tag_name.to_string());
                }
            }
        }

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push(tip)?;

        for oid in revwalk {
            let oid = oid?;
            if let Some(names) = tag_commits.get(&oid) {
                return Ok(names.iter().max().cloned());
            }
        }

        Ok(None)
    }

    fn resolve_tag(&self, tag_name: &str) -> Result<Option<String>> {
        self.cancel.check("resolving tag")?;
        let reference_name = format!("refs/tags/{}", tag_name);

        match self.repo.find_reference(&reference_name) {
            Ok(reference) => {
                let commit = reference.peel_to_commit().map_err(|e| {
                    LibrarianError::lookup(format!("Cannot peel tag '{}': {}", tag_name, e))
                })?;
                Ok(Some(commit.id().to_string()))
            }
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(LibrarianError::lookup(format!(
                "Cannot find tag '{}': {}",
                tag_name, e
            ))),
        }
    }

    fn resolve_revision(&self, revision: &str) -> Result<String> {
        self.cancel.check("resolving revision")?;
        let commit = self
            .repo
            .revparse_single(revision)
            .and_then(|object| object.peel_to_commit())
            .map_err(|e| {
                LibrarianError::lookup(format!("Cannot resolve revision '{}': {}", revision, e))
            })?;
        Ok(commit.id().to_string())
    }

    fn changed_files_since(&self, from: &str, ignore: &[String]) -> Result<Vec<PathBuf>> {
        self.cancel.check("listing changed files")?;
        let from_tree = self.find_commit_by_hash(from)?.tree()?;
        let head_tree = self.repo.head()?.peel_to_commit()?.tree()?;

        let diff = self
            .repo
            .diff_tree_to_tree(Some(&from_tree), Some(&head_tree), None)?;

        let mut files = Vec::new();
        for delta in diff.deltas() {
            for file in [delta.old_file(), delta.new_file()] {
                if let Some(path) = file.path() {
                    if !is_ignored(path, ignore) && !files.iter().any(|p: &PathBuf| p == path) {
                        files.push(path.to_path_buf());
                    }
                }
            }
        }

        debug!(from, count = files.len(), "listed changed files");
        Ok(files)
    }

    fn commits_touching_path(&self, path: &str, since: Option<&str>) -> Result<Vec<CommitInfo>> {
        self.cancel.check("listing commits")?;
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push_head()?;
        if let Some(since) = since {
            revwalk.hide(self.find_commit_by_hash(since)?.id())?;
        }

        let path = Path::new(path.trim_end_matches('/'));
        let mut commits = Vec::new();

        for oid in revwalk {
            self.cancel.check("walking history")?;
            let commit = self.repo.find_commit(oid?)?;
            if !Self::touches(&commit, path)? {
                continue;
            }

            commits.push(CommitInfo {
                hash: commit.id().to_string(),
                message: commit.message().unwrap_or("(empty message)").to_string(),
                author: commit.author().name().unwrap_or("unknown").to_string(),
                files: self.files_changed_by(&commit)?,
            });
        }

        Ok(commits)
    }

    fn show_file(&self, revision: &str, path: &str) -> Result<Option<String>> {
        self.cancel.check("reading file at revision")?;
        let commit = self
            .repo
            .revparse_single(revision)
            .and_then(|object| object.peel_to_commit())
            .map_err(|e| {
                LibrarianError::lookup(format!("Cannot resolve revision '{}': {}", revision, e))
            })?;
        self.read_blob_at(&commit, path)
    }

    fn show_file_on_branch(
        &self,
        remote: &str,
        branch: &str,
        path: &str,
    ) -> Result<Option<String>> {
        self.cancel.check("reading file on branch")?;
        let oid = self.remote_branch_oid(remote, branch)?;
        let commit = self.repo.find_commit(oid)?;
        self.read_blob_at(&commit, path)
    }

    fn create_tag(&self, name: &str, commit: &str) -> Result<()> {
        self.cancel.check("creating tag")?;
        if !git2::Reference::is_valid_name(&format!("refs/tags/{}", name)) {
            return Err(LibrarianError::tag(format!("Invalid tag name '{}'", name)));
        }

        let object = self.find_commit_by_hash(commit)?.into_object();
        self.repo
            .tag_lightweight(name, &object, false)
            .map_err(|e| {
                LibrarianError::tag(format!("Cannot create tag '{}' at {}: {}", name, commit, e))
            })?;

        Ok(())
    }

    fn ensure_clean(&self) -> Result<()> {
        self.cancel.check("checking working tree")?;
        let mut options = StatusOptions::new();
        options.include_untracked(true).include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut options))?;
        let dirty: Vec<String> = statuses
            .iter()
            .filter(|entry| entry.status() != Status::CURRENT)
            .filter_map(|entry| entry.path().map(|p| p.to_string()))
            .collect();

        if dirty.is_empty() {
            return Ok(());
        }

        let preview: Vec<&str> = dirty.iter().take(5).map(|s| s.as_str()).collect();
        Err(LibrarianError::precondition(format!(
            "Working tree is not clean ({} changed: {}{})",
            dirty.len(),
            preview.join(", "),
            if dirty.len() > preview.len() { ", ..." } else { "" }
        )))
    }

    fn fetch(&self, remote_name: &str) -> Result<()> {
        self.cancel.check("fetching")?;
        let mut remote = self.repo.find_remote(remote_name).map_err(|_| {
            LibrarianError::lookup(format!("Remote '{}' not found", remote_name))
        })?;

        let mut callbacks = git2::RemoteCallbacks::new();
        callbacks.credentials(|_url, username_from_url, allowed_types| {
            let username = username_from_url.unwrap_or("git");
            if allowed_types.contains(git2::CredentialType::SSH_KEY) {
                if let Ok(cred) = git2::Cred::ssh_key_from_agent(username) {
                    return Ok(cred);
                }
                if let Some(home) = dirs::home_dir() {
                    for key in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                        let key_path = home.join(".ssh").join(key);
                        if key_path.exists() {
                            if let Ok(cred) = git2::Cred::ssh_key(username, None, &key_path, None)
                            {
                                return Ok(cred);
                            }
                        }
                    }
                }
            }
            git2::Cred::default()
        });

        let mut fetch_options = git2::FetchOptions::new();
        fetch_options.remote_callbacks(callbacks);

        let refspec_heads = format!("+refs/heads/*:refs/remotes/{}/*", remote_name);
        let refspecs = [refspec_heads.as_str(), "+refs/tags/*:refs/tags/*"];
        remote
            .fetch(&refspecs, Some(&mut fetch_options), None)
            .map_err(|e| {
                LibrarianError::lookup(format!("Fetch from '{}' failed: {}", remote_name, e))
            })?;

        Ok(())
    }
}
