//! Commit source over a local git checkout via git2.
//!
//! Walks history from HEAD (or a named branch) and computes per-commit churn
//! from the tree-to-tree diff against the first parent. git2 handles are not
//! `Sync`, so every call opens the repository inside a blocking task.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use git2::{DiffOptions, Oid, Repository, Sort};
use repopulse_core::{CommitRecord, CommitStats, PulseError};

use crate::source::CommitSource;

/// A git repository on disk.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use repopulse_activity::local::LocalRepository;
///
/// let repo = LocalRepository::open(Path::new("."), None).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct LocalRepository {
    path: PathBuf,
    branch: Option<String>,
}

impl LocalRepository {
    /// Discover the repository containing `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Git`] if `path` is not inside a git repository.
    pub fn open(path: &Path, branch: Option<String>) -> Result<Self, PulseError> {
        let repo = Repository::discover(path)
            .map_err(|e| PulseError::Git(format!("failed to open repository: {e}")))?;
        Ok(Self {
            path: repo.path().to_path_buf(),
            branch,
        })
    }

    /// Path of the repository's git directory.
    pub fn git_dir(&self) -> &Path {
        &self.path
    }
}

impl CommitSource for LocalRepository {
    async fn list_commits(&self) -> Result<Vec<CommitRecord>, PulseError> {
        let path = self.path.clone();
        let branch = self.branch.clone();
        tokio::task::spawn_blocking(move || walk_history(&path, branch.as_deref()))
            .await
            .map_err(|e| PulseError::Git(format!("history task failed: {e}")))?
    }

    async fn commit_stats(&self, sha: &str) -> Result<CommitStats, PulseError> {
        let path = self.path.clone();
        let owned_sha = sha.to_string();
        let outcome = tokio::task::spawn_blocking(move || diff_stats(&path, &owned_sha))
            .await
            .map_err(|e| e.to_string())
            .and_then(|r| r.map_err(|e| e.message().to_string()));
        outcome.map_err(|message| PulseError::DetailFetch {
            sha: sha.to_string(),
            message,
        })
    }
}

fn walk_history(path: &Path, branch: Option<&str>) -> Result<Vec<CommitRecord>, PulseError> {
    let repo = Repository::open(path)
        .map_err(|e| PulseError::Git(format!("failed to open repository: {e}")))?;

    let mut revwalk = repo
        .revwalk()
        .map_err(|e| PulseError::Git(format!("failed to create revwalk: {e}")))?;
    revwalk.set_sorting(Sort::TIME).ok();

    if let Some(branch) = branch {
        let reference = repo
            .resolve_reference_from_short_name(branch)
            .map_err(|e| PulseError::Git(format!("failed to resolve branch '{branch}': {e}")))?;
        let oid = reference
            .target()
            .ok_or_else(|| PulseError::Git("branch has no target".into()))?;
        revwalk
            .push(oid)
            .map_err(|e| PulseError::Git(format!("failed to push oid: {e}")))?;
    } else {
        revwalk
            .push_head()
            .map_err(|e| PulseError::Git(format!("failed to push HEAD: {e}")))?;
    }

    let mut commits = Vec::new();
    for oid in revwalk {
        let oid = oid.map_err(|e| PulseError::Git(format!("revwalk error: {e}")))?;
        let commit = repo
            .find_commit(oid)
            .map_err(|e| PulseError::Git(format!("failed to find commit: {e}")))?;

        let author = commit.author();
        let seconds = author.when().seconds();
        let timestamp = DateTime::<Utc>::from_timestamp(seconds, 0)
            .ok_or_else(|| PulseError::Git(format!("commit {oid} has invalid time {seconds}")))?;

        commits.push(CommitRecord {
            sha: oid.to_string(),
            author: author.name().map(String::from),
            timestamp,
            message: commit.message().unwrap_or("").to_string(),
        });
    }

    tracing::debug!(count = commits.len(), "walked local history");
    Ok(commits)
}

fn diff_stats(path: &Path, sha: &str) -> Result<CommitStats, git2::Error> {
    let repo = Repository::open(path)?;
    let commit = repo.find_commit(Oid::from_str(sha)?)?;
    let commit_tree = commit.tree()?;
    let parent_tree = if commit.parent_count() > 0 {
        Some(commit.parent(0)?.tree()?)
    } else {
        None
    };

    let mut diff_opts = DiffOptions::new();
    let diff = repo.diff_tree_to_tree(
        parent_tree.as_ref(),
        Some(&commit_tree),
        Some(&mut diff_opts),
    )?;
    let stats = diff.stats()?;

    Ok(CommitStats {
        additions: stats.insertions() as u64,
        deletions: stats.deletions() as u64,
        files: stats.files_changed() as u64,
    })
}
