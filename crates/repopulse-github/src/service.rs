//! Request-scoped analytics operations.
//!
//! Every call resolves the repository, fetches its full history, and runs the
//! engine from scratch. Nothing is cached between calls.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use repopulse_activity::{
    aggregate_activity, detect_freelancers, AuthorActivitySummary, CommitSource, DetectionResult,
    FreelanceCriteria,
};
use repopulse_core::{
    CommitSummary, ContributorInfo, FetchConfig, FreelanceConfig, PulseConfig, PulseError,
    RepositoryInfo,
};
use serde::{Deserialize, Serialize};

use crate::provider::HostingProvider;

/// Body of the activity analysis operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityReport {
    /// Per-author activity keyed by author name.
    pub contributors: BTreeMap<String, AuthorActivitySummary>,
}

/// Analytics operations over a [`HostingProvider`].
///
/// # Examples
///
/// ```no_run
/// use repopulse_core::PulseConfig;
/// use repopulse_github::client::GitHubClient;
/// use repopulse_github::service::ActivityService;
///
/// # async fn example() -> Result<(), repopulse_core::PulseError> {
/// let config = PulseConfig::default();
/// let client = GitHubClient::new(&config.resolve_token(None)?, &config.github)?;
/// let service = ActivityService::new(client, &config);
/// let report = service.analyze_activity(Some("octocat"), "Hello-World").await?;
/// println!("{} contributors", report.contributors.len());
/// # Ok(())
/// # }
/// ```
pub struct ActivityService<P> {
    provider: P,
    fetch: FetchConfig,
    freelance: FreelanceConfig,
}

impl<P: HostingProvider + Sync> ActivityService<P> {
    /// Wrap `provider` with the fetch and threshold settings from `config`.
    pub fn new(provider: P, config: &PulseConfig) -> Self {
        Self {
            provider,
            fetch: config.fetch.clone(),
            freelance: config.freelance.clone(),
        }
    }

    /// The underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Thresholds applied when a caller does not supply its own.
    pub fn default_criteria(&self) -> FreelanceCriteria {
        FreelanceCriteria::from(&self.freelance)
    }

    /// List repositories of `owner`, or of the authenticated user.
    ///
    /// # Errors
    ///
    /// Propagates provider errors and [`PulseError::Timeout`].
    pub async fn list_repositories(
        &self,
        owner: Option<&str>,
    ) -> Result<Vec<RepositoryInfo>, PulseError> {
        self.bounded(self.provider.repositories(owner)).await
    }

    /// List every commit of `owner/repo`.
    ///
    /// # Errors
    ///
    /// Propagates provider errors and [`PulseError::Timeout`].
    pub async fn list_commits(
        &self,
        owner: Option<&str>,
        repo: &str,
    ) -> Result<Vec<CommitSummary>, PulseError> {
        self.bounded(async {
            let repository = self.provider.repository(owner, repo).await?;
            let commits = repository.list_commits().await?;
            Ok(commits.iter().map(CommitSummary::from).collect())
        })
        .await
    }

    /// List contributors of `owner/repo`.
    ///
    /// # Errors
    ///
    /// Propagates provider errors and [`PulseError::Timeout`].
    pub async fn list_contributors(
        &self,
        owner: Option<&str>,
        repo: &str,
    ) -> Result<Vec<ContributorInfo>, PulseError> {
        self.bounded(async {
            let repository = self.provider.repository(owner, repo).await?;
            self.provider.contributors(&repository).await
        })
        .await
    }

    /// Aggregate per-author churn for `owner/repo`.
    ///
    /// One detail request is issued per attributed commit, at most
    /// `fetch.detail_concurrency` at a time. Failed detail requests only drop
    /// that commit's churn.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Resolution`] if the repository cannot be
    /// resolved or its history listed, or [`PulseError::Timeout`].
    pub async fn analyze_activity(
        &self,
        owner: Option<&str>,
        repo: &str,
    ) -> Result<ActivityReport, PulseError> {
        tracing::info!(owner, repo, "analyzing contributor activity");
        self.bounded(async {
            let repository = self.provider.repository(owner, repo).await?;
            let commits = repository.list_commits().await?;
            let contributors =
                aggregate_activity(&repository, &commits, self.fetch.concurrency()).await;
            Ok(ActivityReport { contributors })
        })
        .await
    }

    /// Detect freelance-pattern contributors of `owner/repo` as of now.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Resolution`] if the repository cannot be
    /// resolved or its history listed, or [`PulseError::Timeout`].
    pub async fn detect_freelancers(
        &self,
        owner: Option<&str>,
        repo: &str,
        criteria: Option<FreelanceCriteria>,
    ) -> Result<DetectionResult, PulseError> {
        self.detect_freelancers_at(owner, repo, criteria, Utc::now())
            .await
    }

    /// Detect freelance-pattern contributors of `owner/repo` as of `now`.
    ///
    /// # Errors
    ///
    /// Same as [`detect_freelancers`](Self::detect_freelancers).
    pub async fn detect_freelancers_at(
        &self,
        owner: Option<&str>,
        repo: &str,
        criteria: Option<FreelanceCriteria>,
        now: DateTime<Utc>,
    ) -> Result<DetectionResult, PulseError> {
        let criteria = criteria.unwrap_or_else(|| self.default_criteria());
        tracing::info!(owner, repo, ?criteria, "detecting freelance contributors");
        self.bounded(async {
            let repository = self.provider.repository(owner, repo).await?;
            let commits = repository.list_commits().await?;
            Ok(detect_freelancers(&commits, &criteria, now))
        })
        .await
    }

    async fn bounded<T>(
        &self,
        operation: impl Future<Output = Result<T, PulseError>>,
    ) -> Result<T, PulseError> {
        let seconds = self.fetch.request_timeout_secs;
        if seconds == 0 {
            return operation.await;
        }
        tokio::time::timeout(Duration::from_secs(seconds), operation)
            .await
            .map_err(|_| PulseError::Timeout { seconds })?
    }
}
