//! GitHub REST client built on octocrab.
//!
//! Responses are decoded into local wire structs and mapped onto the
//! repopulse record types. List endpoints are paged to exhaustion.

use chrono::{DateTime, Utc};
use repopulse_activity::CommitSource;
use repopulse_core::{
    CommitRecord, CommitStats, ContributorInfo, GitHubConfig, PulseError, RepositoryInfo,
};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Deserialize;

use crate::provider::HostingProvider;

/// Authenticated GitHub API client.
///
/// Construct once and share; every request reuses the same connection pool.
///
/// # Examples
///
/// ```no_run
/// use repopulse_core::GitHubConfig;
/// use repopulse_github::client::GitHubClient;
///
/// let client = GitHubClient::new("ghp_xxxx", &GitHubConfig::default()).unwrap();
/// ```
#[derive(Clone)]
pub struct GitHubClient {
    octocrab: octocrab::Octocrab,
    per_page: u8,
}

/// A resolved GitHub repository, usable as a [`CommitSource`].
#[derive(Clone)]
pub struct GitHubRepository {
    octocrab: octocrab::Octocrab,
    per_page: u8,
    owner: String,
    name: String,
}

#[derive(Deserialize)]
struct ApiUser {
    login: String,
}

#[derive(Deserialize)]
struct ApiRepository {
    id: u64,
    name: String,
    full_name: String,
    description: Option<String>,
    html_url: String,
    language: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
}

#[derive(Deserialize)]
struct ApiCommit {
    sha: String,
    commit: ApiCommitBody,
}

#[derive(Deserialize)]
struct ApiCommitBody {
    author: Option<ApiGitUser>,
    committer: Option<ApiGitUser>,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct ApiGitUser {
    name: Option<String>,
    date: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct ApiCommitDetail {
    stats: Option<ApiCommitStats>,
    #[serde(default)]
    files: Vec<IgnoredAny>,
}

#[derive(Deserialize)]
struct ApiCommitStats {
    additions: u64,
    deletions: u64,
}

#[derive(Deserialize)]
struct ApiContributor {
    login: String,
    contributions: u64,
    avatar_url: String,
    html_url: String,
}

impl GitHubClient {
    /// Build a client authenticated with `token`.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Config`] if the base URL is invalid or the
    /// client cannot be built.
    pub fn new(token: &str, config: &GitHubConfig) -> Result<Self, PulseError> {
        let mut builder = octocrab::Octocrab::builder().personal_token(token.to_string());
        if let Some(url) = &config.api_url {
            builder = builder
                .base_uri(url.as_str())
                .map_err(|e| PulseError::Config(format!("invalid GitHub API url '{url}': {e}")))?;
        }
        let octocrab = builder
            .build()
            .map_err(|e| PulseError::Config(format!("failed to create GitHub client: {e}")))?;

        Ok(Self {
            octocrab,
            per_page: config.page_size(),
        })
    }

    /// Login of the authenticated user.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Resolution`] if the token is rejected.
    pub async fn current_login(&self) -> Result<String, PulseError> {
        let user: ApiUser = self
            .octocrab
            .get("/user", None::<&()>)
            .await
            .map_err(|e| resolution("failed to resolve authenticated user", &e))?;
        Ok(user.login)
    }

    async fn resolve_owner(&self, owner: Option<&str>) -> Result<String, PulseError> {
        match owner.filter(|o| !o.is_empty()) {
            Some(owner) => Ok(owner.to_string()),
            None => self.current_login().await,
        }
    }
}

impl HostingProvider for GitHubClient {
    type Repository = GitHubRepository;

    async fn repositories(&self, owner: Option<&str>) -> Result<Vec<RepositoryInfo>, PulseError> {
        let route = match owner.filter(|o| !o.is_empty()) {
            Some(owner) => format!("/users/{owner}/repos"),
            None => "/user/repos".to_string(),
        };
        let repos: Vec<ApiRepository> =
            get_all_pages(&self.octocrab, &route, self.per_page, "failed to list repositories").await?;

        Ok(repos
            .into_iter()
            .map(|r| RepositoryInfo {
                id: r.id,
                name: r.name,
                full_name: r.full_name,
                description: r.description,
                url: r.html_url,
                language: r.language,
                stars: r.stargazers_count,
            })
            .collect())
    }

    async fn repository(
        &self,
        owner: Option<&str>,
        name: &str,
    ) -> Result<GitHubRepository, PulseError> {
        let owner = self.resolve_owner(owner).await?;
        let route = format!("/repos/{owner}/{name}");
        let _: ApiRepository = self
            .octocrab
            .get(&route, None::<&()>)
            .await
            .map_err(|e| resolution(&format!("repository {owner}/{name} unavailable"), &e))?;

        Ok(GitHubRepository {
            octocrab: self.octocrab.clone(),
            per_page: self.per_page,
            owner,
            name: name.to_string(),
        })
    }

    async fn contributors(
        &self,
        repository: &GitHubRepository,
    ) -> Result<Vec<ContributorInfo>, PulseError> {
        let route = format!("/repos/{}/contributors", repository.full_name());
        let contributors: Vec<ApiContributor> =
            get_all_pages(&self.octocrab, &route, self.per_page, "failed to list contributors")
                .await?;

        Ok(contributors
            .into_iter()
            .map(|c| ContributorInfo {
                login: c.login,
                contributions: c.contributions,
                avatar_url: c.avatar_url,
                profile_url: c.html_url,
            })
            .collect())
    }
}

impl GitHubRepository {
    /// `owner/name`.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl CommitSource for GitHubRepository {
    async fn list_commits(&self) -> Result<Vec<CommitRecord>, PulseError> {
        let route = format!("/repos/{}/commits", self.full_name());
        let commits: Vec<ApiCommit> =
            get_all_pages(&self.octocrab, &route, self.per_page, "failed to list commits").await?;

        let records: Vec<CommitRecord> = commits.into_iter().filter_map(into_record).collect();
        tracing::debug!(repo = %self.full_name(), count = records.len(), "listed commits");
        Ok(records)
    }

    async fn commit_stats(&self, sha: &str) -> Result<CommitStats, PulseError> {
        let route = format!("/repos/{}/commits/{sha}", self.full_name());
        let detail: ApiCommitDetail =
            self.octocrab
                .get(&route, None::<&()>)
                .await
                .map_err(|e| PulseError::DetailFetch {
                    sha: sha.to_string(),
                    message: describe(&e),
                })?;

        let stats = detail.stats.ok_or_else(|| PulseError::DetailFetch {
            sha: sha.to_string(),
            message: "response carried no stats".into(),
        })?;

        Ok(CommitStats {
            additions: stats.additions,
            deletions: stats.deletions,
            files: detail.files.len() as u64,
        })
    }
}

fn into_record(commit: ApiCommit) -> Option<CommitRecord> {
    let ApiCommitBody {
        author,
        committer,
        message,
    } = commit.commit;
    let timestamp = author
        .as_ref()
        .and_then(|a| a.date)
        .or_else(|| committer.as_ref().and_then(|c| c.date));
    let Some(timestamp) = timestamp else {
        tracing::debug!(sha = %commit.sha, "commit has no timestamp, skipped");
        return None;
    };

    Some(CommitRecord {
        sha: commit.sha,
        author: author.and_then(|a| a.name),
        timestamp,
        message,
    })
}

/// Fetch every page of a list endpoint.
///
/// An empty repository answers some list endpoints with `204 No Content`;
/// that page decodes as empty.
async fn get_all_pages<T: DeserializeOwned>(
    octocrab: &octocrab::Octocrab,
    route: &str,
    per_page: u8,
    context: &str,
) -> Result<Vec<T>, PulseError> {
    let mut items = Vec::new();
    let mut page = 1u32;
    loop {
        let uri = format!("{route}?per_page={per_page}&page={page}");
        let response = octocrab
            ._get(uri.as_str())
            .await
            .map_err(|e| resolution(context, &e))?;
        let response = octocrab::map_github_error(response)
            .await
            .map_err(|e| resolution(context, &e))?;
        let status = response.status().as_u16();
        let body = octocrab
            .body_to_string(response)
            .await
            .map_err(|e| resolution(context, &e))?;
        let batch: Vec<T> = decode_page(status, &body).map_err(|e| {
            PulseError::Resolution(format!("{context}: unexpected response body: {e}"))
        })?;

        let fetched = batch.len();
        tracing::debug!(route, page, fetched, status, "fetched page");
        items.extend(batch);
        if fetched < usize::from(per_page) {
            break;
        }
        page += 1;
    }
    Ok(items)
}

fn decode_page<T: DeserializeOwned>(status: u16, body: &str) -> Result<Vec<T>, serde_json::Error> {
    if status == 204 || body.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(body)
}

fn describe(err: &octocrab::Error) -> String {
    match err {
        octocrab::Error::GitHub { source, .. } => {
            format!("{} ({})", source.message, source.status_code)
        }
        other => other.to_string(),
    }
}

fn resolution(context: &str, err: &octocrab::Error) -> PulseError {
    PulseError::Resolution(format!("{context}: {}", describe(err)))
}
