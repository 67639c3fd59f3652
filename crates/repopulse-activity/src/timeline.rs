//! Per-author commit timelines.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use repopulse_core::CommitRecord;

const SECONDS_PER_DAY: i64 = 86_400;

/// When and how often one author committed.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use repopulse_activity::timeline::AuthorTemporalSummary;
///
/// let mut summary = AuthorTemporalSummary::default();
/// summary.record(Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap());
/// summary.record(Utc.with_ymd_and_hms(2024, 1, 1, 17, 0, 0).unwrap());
/// assert_eq!(summary.commit_count, 2);
/// assert_eq!(summary.active_days.len(), 1);
/// assert_eq!(summary.activity_span_days(), 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorTemporalSummary {
    /// Commit instants in the order they were recorded.
    pub commits: Vec<DateTime<Utc>>,
    /// Earliest commit instant.
    pub first_commit_date: Option<DateTime<Utc>>,
    /// Latest commit instant.
    pub last_commit_date: Option<DateTime<Utc>>,
    /// Number of commits recorded.
    pub commit_count: u64,
    /// Distinct UTC calendar dates with at least one commit.
    pub active_days: BTreeSet<NaiveDate>,
}

impl AuthorTemporalSummary {
    /// Record one commit at `at`.
    pub fn record(&mut self, at: DateTime<Utc>) {
        self.commits.push(at);
        self.commit_count += 1;
        self.active_days.insert(at.date_naive());
        if self.first_commit_date.map_or(true, |first| at < first) {
            self.first_commit_date = Some(at);
        }
        if self.last_commit_date.map_or(true, |last| at > last) {
            self.last_commit_date = Some(at);
        }
    }

    /// Whole days from the first to the last commit, 0 when either is unknown.
    pub fn activity_span_days(&self) -> i64 {
        match (self.first_commit_date, self.last_commit_date) {
            (Some(first), Some(last)) => whole_days_between(first, last),
            _ => 0,
        }
    }

    /// Whole days from the last commit to `now`, 0 when there is no commit.
    pub fn days_since_last_commit(&self, now: DateTime<Utc>) -> i64 {
        self.last_commit_date
            .map_or(0, |last| whole_days_between(last, now))
    }
}

/// Whole days from `earlier` to `later`, rounded toward negative infinity.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use repopulse_activity::timeline::whole_days_between;
///
/// let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// assert_eq!(whole_days_between(t, t + Duration::hours(47)), 1);
/// assert_eq!(whole_days_between(t, t - Duration::hours(1)), -1);
/// ```
pub fn whole_days_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> i64 {
    (later - earlier).num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// Fold `commits` into one temporal summary per named author.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use repopulse_activity::timeline::build_timelines;
/// use repopulse_core::CommitRecord;
///
/// let commits = vec![CommitRecord {
///     sha: "a1".into(),
///     author: Some("alice".into()),
///     timestamp: Utc::now(),
///     message: "init".into(),
/// }];
/// let timelines = build_timelines(&commits);
/// assert_eq!(timelines["alice"].commit_count, 1);
/// ```
pub fn build_timelines(commits: &[CommitRecord]) -> BTreeMap<String, AuthorTemporalSummary> {
    let mut timelines: BTreeMap<String, AuthorTemporalSummary> = BTreeMap::new();
    for commit in commits {
        let Some(author) = commit.author_name() else {
            continue;
        };
        timelines
            .entry(author.to_string())
            .or_default()
            .record(commit.timestamp);
    }
    timelines
}
