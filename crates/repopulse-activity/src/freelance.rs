//! Freelance-pattern contributor detection.
//!
//! An author matches when all three hold: dormant for at least
//! `min_inactive_days`, at most `max_commit_count` commits, and first-to-last
//! commit span of at most `max_activity_span_days`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use repopulse_core::{CommitRecord, FreelanceConfig};
use serde::{Deserialize, Serialize};

use crate::timeline::{build_timelines, AuthorTemporalSummary};

/// Thresholds for the freelance heuristic.
///
/// # Examples
///
/// ```
/// use repopulse_activity::freelance::FreelanceCriteria;
///
/// let criteria = FreelanceCriteria::default();
/// assert_eq!(criteria.min_inactive_days, 30);
/// assert_eq!(criteria.max_commit_count, 10);
/// assert_eq!(criteria.max_activity_span_days, 14);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreelanceCriteria {
    /// Minimum days since the last commit (inclusive).
    pub min_inactive_days: u32,
    /// Maximum total commits (inclusive).
    pub max_commit_count: u32,
    /// Maximum days between first and last commit (inclusive).
    pub max_activity_span_days: u32,
}

impl Default for FreelanceCriteria {
    fn default() -> Self {
        Self::from(&FreelanceConfig::default())
    }
}

impl From<&FreelanceConfig> for FreelanceCriteria {
    fn from(config: &FreelanceConfig) -> Self {
        Self {
            min_inactive_days: config.min_inactive_days,
            max_commit_count: config.max_commit_count,
            max_activity_span_days: config.max_activity_span_days,
        }
    }
}

impl FreelanceCriteria {
    /// Whether `summary` matches all three predicates at `now`.
    pub fn matches(&self, summary: &AuthorTemporalSummary, now: DateTime<Utc>) -> bool {
        summary.days_since_last_commit(now) >= i64::from(self.min_inactive_days)
            && summary.commit_count <= u64::from(self.max_commit_count)
            && summary.activity_span_days() <= i64::from(self.max_activity_span_days)
    }
}

/// Diagnostics for one flagged author.
///
/// # Examples
///
/// ```
/// use repopulse_activity::freelance::FreelancerFlag;
///
/// let flag = FreelancerFlag {
///     commit_count: 3,
///     first_commit: Some("2024-01-01T00:00:00+00:00".into()),
///     last_commit: Some("2024-01-03T00:00:00+00:00".into()),
///     days_since_last_commit: 90,
///     activity_span_days: 2,
///     activity_days_count: 2,
///     commit_frequency: 1.5,
/// };
/// assert!(flag.commit_frequency > 1.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreelancerFlag {
    /// Total commits by the author.
    pub commit_count: u64,
    /// ISO-8601 first commit instant.
    pub first_commit: Option<String>,
    /// ISO-8601 last commit instant.
    pub last_commit: Option<String>,
    /// Whole days from the last commit to the evaluation instant.
    pub days_since_last_commit: i64,
    /// Whole days from first to last commit.
    pub activity_span_days: i64,
    /// Distinct calendar days with commits.
    pub activity_days_count: usize,
    /// `commit_count / max(activity_span_days, 1)`.
    pub commit_frequency: f64,
}

impl FreelancerFlag {
    fn from_summary(summary: &AuthorTemporalSummary, now: DateTime<Utc>) -> Self {
        let activity_span_days = summary.activity_span_days();
        Self {
            commit_count: summary.commit_count,
            first_commit: summary.first_commit_date.map(|d| d.to_rfc3339()),
            last_commit: summary.last_commit_date.map(|d| d.to_rfc3339()),
            days_since_last_commit: summary.days_since_last_commit(now),
            activity_span_days,
            activity_days_count: summary.active_days.len(),
            commit_frequency: summary.commit_count as f64 / activity_span_days.max(1) as f64,
        }
    }
}

/// Flagged authors plus population counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Flagged authors keyed by name.
    pub freelancers: BTreeMap<String, FreelancerFlag>,
    /// Distinct named authors seen.
    pub total_contributors: usize,
    /// Number of flagged authors.
    pub freelancers_count: usize,
}

/// Classify prebuilt timelines at evaluation instant `now`.
pub fn classify(
    timelines: &BTreeMap<String, AuthorTemporalSummary>,
    criteria: &FreelanceCriteria,
    now: DateTime<Utc>,
) -> DetectionResult {
    let freelancers: BTreeMap<String, FreelancerFlag> = timelines
        .iter()
        .filter(|(_, summary)| criteria.matches(summary, now))
        .map(|(author, summary)| (author.clone(), FreelancerFlag::from_summary(summary, now)))
        .collect();

    DetectionResult {
        total_contributors: timelines.len(),
        freelancers_count: freelancers.len(),
        freelancers,
    }
}

/// Detect freelance-pattern contributors in `commits` at `now`.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use repopulse_activity::freelance::{detect_freelancers, FreelanceCriteria};
/// use repopulse_core::CommitRecord;
///
/// let t = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
/// let commits = vec![CommitRecord {
///     sha: "a1".into(),
///     author: Some("drive-by".into()),
///     timestamp: t,
///     message: "typo".into(),
/// }];
///
/// let result = detect_freelancers(&commits, &FreelanceCriteria::default(), t + Duration::days(31));
/// assert_eq!(result.freelancers_count, 1);
/// assert_eq!(result.freelancers["drive-by"].commit_frequency, 1.0);
/// ```
pub fn detect_freelancers(
    commits: &[CommitRecord],
    criteria: &FreelanceCriteria,
    now: DateTime<Utc>,
) -> DetectionResult {
    let timelines = build_timelines(commits);
    let result = classify(&timelines, criteria, now);
    tracing::debug!(
        total = result.total_contributors,
        flagged = result.freelancers_count,
        "freelance classification complete"
    );
    result
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    use super::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap()
    }

    fn commits_for(author: &str, offsets_days: &[i64]) -> Vec<CommitRecord> {
        offsets_days
            .iter()
            .enumerate()
            .map(|(i, days)| CommitRecord {
                sha: format!("{author}-{i}"),
                author: Some(author.into()),
                timestamp: t0() + Duration::days(*days),
                message: "work".into(),
            })
            .collect()
    }

    #[test]
    fn single_commit_author_is_flagged_after_dormancy() {
        let commits = commits_for("solo", &[0]);
        let result = detect_freelancers(
            &commits,
            &FreelanceCriteria::default(),
            t0() + Duration::days(31),
        );

        assert_eq!(result.total_contributors, 1);
        assert_eq!(result.freelancers_count, 1);
        let flag = &result.freelancers["solo"];
        assert_eq!(
            *flag,
            FreelancerFlag {
                commit_count: 1,
                first_commit: Some("2024-06-01T10:00:00+00:00".into()),
                last_commit: Some("2024-06-01T10:00:00+00:00".into()),
                days_since_last_commit: 31,
                activity_span_days: 0,
                activity_days_count: 1,
                commit_frequency: 1.0,
            }
        );
    }

    #[test]
    fn heavy_contributor_is_never_flagged() {
        let offsets: Vec<i64> = (0..15).map(|i| i * 40 / 14).collect();
        let commits = commits_for("core", &offsets);
        let result = detect_freelancers(
            &commits,
            &FreelanceCriteria::default(),
            t0() + Duration::days(400),
        );
        assert_eq!(result.total_contributors, 1);
        assert_eq!(result.freelancers_count, 0);
    }

    #[test]
    fn dormancy_boundary_is_inclusive() {
        let commits = commits_for("edge", &[0]);
        let criteria = FreelanceCriteria::default();

        let at_boundary = detect_freelancers(&commits, &criteria, t0() + Duration::days(30));
        assert_eq!(at_boundary.freelancers_count, 1);

        let one_short = detect_freelancers(
            &commits,
            &criteria,
            t0() + Duration::days(30) - Duration::seconds(1),
        );
        assert_eq!(one_short.freelancers_count, 0);
    }

    #[test]
    fn wide_span_is_not_flagged() {
        let commits = commits_for("spread", &[0, 15]);
        let result = detect_freelancers(
            &commits,
            &FreelanceCriteria::default(),
            t0() + Duration::days(200),
        );
        assert_eq!(result.freelancers_count, 0);
    }

    #[test]
    fn frequency_divides_by_span() {
        let commits = commits_for("burst", &[0, 1, 2, 4]);
        let result = detect_freelancers(
            &commits,
            &FreelanceCriteria::default(),
            t0() + Duration::days(60),
        );
        let flag = &result.freelancers["burst"];
        assert_eq!(flag.activity_span_days, 4);
        assert_eq!(flag.activity_days_count, 4);
        assert!((flag.commit_frequency - 1.0).abs() < f64::EPSILON);
        assert_eq!(flag.days_since_last_commit, 56);
    }

    #[test]
    fn total_counts_every_named_author() {
        let mut commits = commits_for("a", &[0]);
        commits.extend(commits_for("b", &[0, 1]));
        commits.extend(commits_for("c", &(0..20).collect::<Vec<_>>()));
        commits.extend(commits_for("", &[0, 1, 2]));

        let result = detect_freelancers(
            &commits,
            &FreelanceCriteria::default(),
            t0() + Duration::days(90),
        );
        assert_eq!(result.total_contributors, 3);
        assert_eq!(result.freelancers_count, 2);
        assert!(result.freelancers.contains_key("a"));
        assert!(result.freelancers.contains_key("b"));
        assert!(!result.freelancers.contains_key(""));
    }

    #[test]
    fn custom_criteria_are_respected() {
        let commits = commits_for("x", &[0, 1, 2]);
        let strict = FreelanceCriteria {
            min_inactive_days: 10,
            max_commit_count: 2,
            max_activity_span_days: 14,
        };
        let result = detect_freelancers(&commits, &strict, t0() + Duration::days(30));
        assert_eq!(result.freelancers_count, 0);
    }

    #[test]
    fn criteria_from_config() {
        let config = FreelanceConfig {
            min_inactive_days: 7,
            max_commit_count: 2,
            max_activity_span_days: 1,
        };
        let criteria = FreelanceCriteria::from(&config);
        assert_eq!(criteria.min_inactive_days, 7);
        assert_eq!(criteria.max_commit_count, 2);
        assert_eq!(criteria.max_activity_span_days, 1);
    }
}
