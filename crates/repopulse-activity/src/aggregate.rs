//! Per-author activity aggregation.
//!
//! Counts commits per author and sums the churn reported by each commit's
//! detail fetch. Detail fetches run concurrently up to a fixed limit and are
//! folded back on the polling task, so the accumulator needs no locking.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use repopulse_core::{CommitRecord, CommitStats, PulseError};
use serde::{Deserialize, Serialize, Serializer};

use crate::source::CommitSource;

/// Activity totals for one author.
///
/// # Examples
///
/// ```
/// use repopulse_activity::aggregate::AuthorActivitySummary;
///
/// let summary = AuthorActivitySummary::default();
/// assert_eq!(summary.commit_count, 0);
/// assert!(summary.last_commit_date.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorActivitySummary {
    /// Commits attributed to this author.
    pub commit_count: u64,
    /// Lines added across commits whose details were fetched.
    pub lines_added: u64,
    /// Lines removed across commits whose details were fetched.
    pub lines_removed: u64,
    /// Files touched across commits whose details were fetched.
    pub files_modified: u64,
    /// Latest author timestamp seen, written as RFC 3339 with a `+00:00` offset.
    #[serde(serialize_with = "serialize_rfc3339")]
    pub last_commit_date: Option<DateTime<Utc>>,
}

fn serialize_rfc3339<S: Serializer>(
    date: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match date {
        Some(date) => serializer.serialize_some(&date.to_rfc3339()),
        None => serializer.serialize_none(),
    }
}

/// Incremental fold from commits and detail outcomes to author summaries.
///
/// Commits are counted by [`record_commit`](Self::record_commit) before any
/// detail is fetched; [`apply_detail`](Self::apply_detail) only ever adds
/// churn, so a failed fetch leaves the commit counted.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use repopulse_activity::aggregate::ActivityAggregator;
/// use repopulse_core::{CommitRecord, CommitStats, PulseError};
///
/// let commit = CommitRecord {
///     sha: "a1".into(),
///     author: Some("alice".into()),
///     timestamp: Utc::now(),
///     message: "init".into(),
/// };
///
/// let mut aggregator = ActivityAggregator::default();
/// let author = aggregator.record_commit(&commit).unwrap();
/// aggregator.apply_detail(
///     author,
///     Err(PulseError::DetailFetch { sha: "a1".into(), message: "timeout".into() }),
/// );
///
/// let summaries = aggregator.finish();
/// assert_eq!(summaries["alice"].commit_count, 1);
/// assert_eq!(summaries["alice"].lines_added, 0);
/// ```
#[derive(Debug, Default)]
pub struct ActivityAggregator {
    authors: BTreeMap<String, AuthorActivitySummary>,
    failed_details: usize,
}

impl ActivityAggregator {
    /// Count `commit` toward its author.
    ///
    /// Returns the author name when the commit was counted, or `None` when
    /// the commit has no author and is ignored entirely.
    pub fn record_commit<'c>(&mut self, commit: &'c CommitRecord) -> Option<&'c str> {
        let author = commit.author_name()?;
        let summary = self.authors.entry(author.to_string()).or_default();
        summary.commit_count += 1;
        if summary
            .last_commit_date
            .map_or(true, |latest| commit.timestamp > latest)
        {
            summary.last_commit_date = Some(commit.timestamp);
        }
        Some(author)
    }

    /// Fold one detail fetch outcome into `author`'s churn totals.
    pub fn apply_detail(&mut self, author: &str, outcome: Result<CommitStats, PulseError>) {
        match outcome {
            Ok(stats) => {
                if let Some(summary) = self.authors.get_mut(author) {
                    summary.lines_added += stats.additions;
                    summary.lines_removed += stats.deletions;
                    summary.files_modified += stats.files;
                }
            }
            Err(e) => {
                tracing::debug!(author, error = %e, "commit detail unavailable, churn skipped");
                self.failed_details += 1;
            }
        }
    }

    /// Number of detail fetches that failed so far.
    pub fn failed_details(&self) -> usize {
        self.failed_details
    }

    /// Consume the aggregator, returning summaries keyed by author name.
    pub fn finish(self) -> BTreeMap<String, AuthorActivitySummary> {
        self.authors
    }
}

/// Aggregate per-author activity for `commits`, fetching each commit's
/// stats from `source` with at most `concurrency` requests in flight.
///
/// Commits with no author name are skipped and trigger no detail fetch.
/// The result does not depend on the order of `commits`.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use repopulse_activity::aggregate::aggregate_activity;
/// use repopulse_activity::source::MemorySource;
/// use repopulse_core::{CommitRecord, CommitStats};
///
/// let commits = vec![CommitRecord {
///     sha: "a1".into(),
///     author: Some("alice".into()),
///     timestamp: Utc::now(),
///     message: "init".into(),
/// }];
/// let source = MemorySource::new(commits.clone())
///     .with_uniform_stats(CommitStats { additions: 10, deletions: 2, files: 1 });
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// let summaries = rt.block_on(aggregate_activity(&source, &commits, 4));
/// assert_eq!(summaries["alice"].lines_added, 10);
/// ```
pub async fn aggregate_activity<S>(
    source: &S,
    commits: &[CommitRecord],
    concurrency: usize,
) -> BTreeMap<String, AuthorActivitySummary>
where
    S: CommitSource + Sync,
{
    let mut aggregator = ActivityAggregator::default();

    // Owned pairs: borrowed tuples make the fan-out future non-`Send`.
    let pending: Vec<(String, String)> = commits
        .iter()
        .filter_map(|commit| {
            aggregator
                .record_commit(commit)
                .map(|author| (author.to_string(), commit.sha.clone()))
        })
        .collect();

    tracing::debug!(
        commits = commits.len(),
        details = pending.len(),
        concurrency,
        "fetching commit details"
    );

    let mut outcomes = stream::iter(pending)
        .map(|(author, sha)| async move {
            let outcome = source.commit_stats(&sha).await;
            (author, outcome)
        })
        .buffer_unordered(concurrency.max(1));

    while let Some((author, outcome)) = outcomes.next().await {
        aggregator.apply_detail(&author, outcome);
    }

    if aggregator.failed_details() > 0 {
        tracing::info!(
            failed = aggregator.failed_details(),
            "some commit details could not be fetched"
        );
    }

    aggregator.finish()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::source::MemorySource;

    fn commit(sha: &str, author: &str, at: DateTime<Utc>) -> CommitRecord {
        CommitRecord {
            sha: sha.into(),
            author: Some(author.into()),
            timestamp: at,
            message: "change".into(),
        }
    }

    fn d0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap()
    }

    const STATS: CommitStats = CommitStats {
        additions: 10,
        deletions: 2,
        files: 1,
    };

    #[tokio::test]
    async fn sums_churn_per_author() {
        let commits = vec![
            commit("a1", "A", d0()),
            commit("a2", "A", d0() + Duration::days(5)),
            commit("b1", "B", d0()),
        ];
        let source = MemorySource::new(commits.clone()).with_uniform_stats(STATS);

        let summaries = aggregate_activity(&source, &commits, 2).await;

        assert_eq!(
            summaries["A"],
            AuthorActivitySummary {
                commit_count: 2,
                lines_added: 20,
                lines_removed: 4,
                files_modified: 2,
                last_commit_date: Some(d0() + Duration::days(5)),
            }
        );
        assert_eq!(
            summaries["B"],
            AuthorActivitySummary {
                commit_count: 1,
                lines_added: 10,
                lines_removed: 2,
                files_modified: 1,
                last_commit_date: Some(d0()),
            }
        );
    }

    #[tokio::test]
    async fn failed_detail_still_counts_commit() {
        let commits = vec![commit("a1", "A", d0()), commit("a2", "A", d0())];
        let source = MemorySource::new(commits.clone())
            .with_uniform_stats(STATS)
            .without_stats("a2");

        let summaries = aggregate_activity(&source, &commits, 8).await;

        let a = &summaries["A"];
        assert_eq!(a.commit_count, 2);
        assert_eq!(a.lines_added, 10);
        assert_eq!(a.lines_removed, 2);
        assert_eq!(a.files_modified, 1);
    }

    #[tokio::test]
    async fn authorless_commits_are_ignored() {
        let mut empty = commit("c1", "", d0());
        let mut missing = commit("c2", "x", d0());
        missing.author = None;
        empty.author = Some(String::new());
        let commits = vec![empty, missing, commit("a1", "A", d0())];
        let source = MemorySource::new(commits.clone()).with_uniform_stats(STATS);

        let summaries = aggregate_activity(&source, &commits, 1).await;

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries["A"].lines_added, 10);
    }

    #[tokio::test]
    async fn last_commit_date_is_latest_regardless_of_order() {
        let newest_first = vec![
            commit("a2", "A", d0() + Duration::days(3)),
            commit("a1", "A", d0()),
        ];
        let oldest_first: Vec<_> = newest_first.iter().rev().cloned().collect();
        let source = MemorySource::new(newest_first.clone()).with_uniform_stats(STATS);

        let a = aggregate_activity(&source, &newest_first, 4).await;
        let b = aggregate_activity(&source, &oldest_first, 4).await;

        assert_eq!(a, b);
        assert_eq!(a["A"].last_commit_date, Some(d0() + Duration::days(3)));
    }

    #[test]
    fn aggregator_counts_failed_details() {
        let c = commit("a1", "A", d0());
        let mut aggregator = ActivityAggregator::default();
        let author = aggregator.record_commit(&c).unwrap();
        aggregator.apply_detail(
            author,
            Err(PulseError::DetailFetch {
                sha: "a1".into(),
                message: "boom".into(),
            }),
        );
        assert_eq!(aggregator.failed_details(), 1);
        assert_eq!(aggregator.finish()["A"].commit_count, 1);
    }

    /// Reports how many detail fetches were running at once.
    #[derive(Default)]
    struct CountingSource {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl CommitSource for CountingSource {
        async fn list_commits(&self) -> Result<Vec<CommitRecord>, PulseError> {
            Ok(Vec::new())
        }

        async fn commit_stats(&self, _sha: &str) -> Result<CommitStats, PulseError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(CommitStats {
                additions: 1,
                deletions: 0,
                files: 1,
            })
        }
    }

    fn assert_send<T: Send>(_: &T) {}

    #[tokio::test]
    async fn detail_fetches_respect_concurrency_limit() {
        let commits: Vec<_> = (0..50)
            .map(|i| commit(&format!("c{i}"), "A", d0() + Duration::hours(i)))
            .collect();
        let source = CountingSource::default();

        let summaries = aggregate_activity(&source, &commits, 4).await;

        let peak = source.peak.load(Ordering::SeqCst);
        assert!(peak <= 4, "{peak} fetches ran at once");
        assert!(peak >= 1);
        assert_eq!(summaries["A"].commit_count, 50);
        assert_eq!(summaries["A"].lines_added, 50);
    }

    #[tokio::test]
    async fn aggregation_future_is_send() {
        let commits = vec![commit("a1", "A", d0()), commit("b1", "B", d0())];
        let source = MemorySource::new(commits.clone()).with_uniform_stats(STATS);
        assert_send(&aggregate_activity(&source, &commits, 4));

        let shared = Arc::new(source);
        let handle = tokio::spawn(async move { aggregate_activity(&*shared, &commits, 2).await });
        let summaries = handle.await.unwrap();
        assert_eq!(summaries.len(), 2);
    }

    #[test]
    fn last_commit_date_serializes_with_numeric_offset() {
        let summary = AuthorActivitySummary {
            commit_count: 1,
            last_commit_date: Some(d0()),
            ..Default::default()
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["last_commit_date"], "2024-01-10T09:00:00+00:00");

        let back: AuthorActivitySummary = serde_json::from_value(json).unwrap();
        assert_eq!(back, summary);

        let empty = serde_json::to_value(AuthorActivitySummary::default()).unwrap();
        assert!(empty["last_commit_date"].is_null());
    }

    #[tokio::test]
    async fn empty_history_yields_no_summaries() {
        let source = MemorySource::default();
        let summaries = aggregate_activity(&source, &[], 4).await;
        assert!(summaries.is_empty());
    }
}
