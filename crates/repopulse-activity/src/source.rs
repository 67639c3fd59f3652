//! The commit source seam.
//!
//! A [`CommitSource`] is one resolved repository: it lists its commits and
//! fetches churn for a single commit on demand. The GitHub client, the local
//! git reader, and the in-memory test source all implement it.

use std::collections::HashMap;
use std::future::Future;

use repopulse_core::{CommitRecord, CommitStats, PulseError};

/// A resolved repository that can list commits and fetch per-commit stats.
pub trait CommitSource {
    /// List every commit reachable in the repository.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Resolution`] (remote) or [`PulseError::Git`]
    /// (local) if the history cannot be read.
    fn list_commits(&self) -> impl Future<Output = Result<Vec<CommitRecord>, PulseError>> + Send;

    /// Fetch churn for one commit.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::DetailFetch`] when the detail is unavailable.
    /// Callers treat this as a dropped enrichment, not a failed request.
    fn commit_stats(
        &self,
        sha: &str,
    ) -> impl Future<Output = Result<CommitStats, PulseError>> + Send;
}

/// A [`CommitSource`] backed by vectors in memory.
///
/// Commits without a stats entry fail their detail fetch.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use repopulse_activity::source::{CommitSource, MemorySource};
/// use repopulse_core::{CommitRecord, CommitStats};
///
/// let source = MemorySource::new(vec![CommitRecord {
///     sha: "a1".into(),
///     author: Some("alice".into()),
///     timestamp: Utc::now(),
///     message: "init".into(),
/// }])
/// .with_stats("a1", CommitStats { additions: 3, deletions: 1, files: 1 });
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// let stats = rt.block_on(source.commit_stats("a1")).unwrap();
/// assert_eq!(stats.additions, 3);
/// assert!(rt.block_on(source.commit_stats("zz")).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    commits: Vec<CommitRecord>,
    stats: HashMap<String, CommitStats>,
}

impl MemorySource {
    /// Create a source over the given commits, with no stats yet.
    pub fn new(commits: Vec<CommitRecord>) -> Self {
        Self {
            commits,
            stats: HashMap::new(),
        }
    }

    /// Register the stats returned for `sha`.
    pub fn with_stats(mut self, sha: &str, stats: CommitStats) -> Self {
        self.stats.insert(sha.to_string(), stats);
        self
    }

    /// Register the same stats for every commit currently in the source.
    pub fn with_uniform_stats(mut self, stats: CommitStats) -> Self {
        for commit in &self.commits {
            self.stats.insert(commit.sha.clone(), stats);
        }
        self
    }

    /// Make the detail fetch for `sha` fail.
    pub fn without_stats(mut self, sha: &str) -> Self {
        self.stats.remove(sha);
        self
    }
}

impl CommitSource for MemorySource {
    async fn list_commits(&self) -> Result<Vec<CommitRecord>, PulseError> {
        Ok(self.commits.clone())
    }

    async fn commit_stats(&self, sha: &str) -> Result<CommitStats, PulseError> {
        self.stats
            .get(sha)
            .copied()
            .ok_or_else(|| PulseError::DetailFetch {
                sha: sha.to_string(),
                message: "no stats recorded".into(),
            })
    }
}
