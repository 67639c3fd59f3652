//! Route table for the `/github` API surface.
//!
//! Maps a request target such as
//! `/github/repos/octocat/Hello-World/freelancers?max_commit_count=5` onto an
//! [`ActivityService`] call and renders the JSON body. Every failure is
//! reported as a 400 with a `detail` string; unknown paths are 404.

use serde::Serialize;
use serde_json::{json, Value};
use url::form_urlencoded;

use repopulse_activity::FreelanceCriteria;
use repopulse_core::PulseError;

use crate::provider::HostingProvider;
use crate::service::ActivityService;

const PREFIX: &str = "/github";

/// A parsed request target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `GET /github/repos?username=<optional>`
    Repositories {
        /// Owner whose repositories are listed.
        username: Option<String>,
    },
    /// `GET /github/repos/{username}/{repo_name}/commits`
    Commits {
        /// Repository owner.
        username: String,
        /// Repository name.
        repo: String,
    },
    /// `GET /github/repos/{username}/{repo_name}/contributors`
    Contributors {
        /// Repository owner.
        username: String,
        /// Repository name.
        repo: String,
    },
    /// `GET /github/repos/{username}/{repo_name}/analysis`
    Analysis {
        /// Repository owner.
        username: String,
        /// Repository name.
        repo: String,
    },
    /// `GET /github/repos/{username}/{repo_name}/freelancers?...`
    Freelancers {
        /// Repository owner.
        username: String,
        /// Repository name.
        repo: String,
        /// Thresholds, with omitted query parameters filled from defaults.
        criteria: FreelanceCriteria,
    },
}

/// Status code and JSON body produced for a request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Value,
}

impl ApiResponse {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    fn error(status: u16, detail: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "detail": detail.into() }),
        }
    }

    fn bad_request(err: &PulseError) -> Self {
        Self::error(400, err.to_string())
    }

    /// Response for a target that failed to parse.
    pub fn rejected(err: RouteError) -> Self {
        match err {
            RouteError::NotFound => Self::error(404, "Not found"),
            RouteError::Invalid(err) => Self::bad_request(&err),
        }
    }

    /// The `detail` message of an error response.
    pub fn detail(&self) -> Option<&str> {
        self.body.get("detail").and_then(Value::as_str)
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Why a target could not be parsed.
#[derive(Debug)]
pub enum RouteError {
    /// No route matches the path.
    NotFound,
    /// A route matched but a parameter is malformed.
    Invalid(PulseError),
}

impl Route {
    /// Parse a request target (path plus optional query string).
    ///
    /// Threshold parameters omitted from the query take their value from
    /// `defaults`.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::NotFound`] for unknown paths and
    /// [`RouteError::Invalid`] for malformed query values.
    ///
    /// # Examples
    ///
    /// ```
    /// use repopulse_activity::FreelanceCriteria;
    /// use repopulse_github::routes::Route;
    ///
    /// let route = Route::parse(
    ///     "/github/repos/octocat/hello/freelancers?max_commit_count=3",
    ///     &FreelanceCriteria::default(),
    /// )
    /// .unwrap();
    /// match route {
    ///     Route::Freelancers { criteria, .. } => {
    ///         assert_eq!(criteria.max_commit_count, 3);
    ///         assert_eq!(criteria.min_inactive_days, 30);
    ///     }
    ///     other => panic!("unexpected route {other:?}"),
    /// }
    /// ```
    pub fn parse(target: &str, defaults: &FreelanceCriteria) -> Result<Self, RouteError> {
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        let query = parse_query(query);
        let query = query.as_slice();
        let path = path.trim_end_matches('/');
        let rest = path.strip_prefix(PREFIX).ok_or(RouteError::NotFound)?;
        let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            ["repos"] => Ok(Route::Repositories {
                username: lookup(query, "username")
                    .filter(|u| !u.is_empty())
                    .map(String::from),
            }),
            ["repos", username, repo, action] => {
                let username = (*username).to_string();
                let repo = (*repo).to_string();
                match *action {
                    "commits" => Ok(Route::Commits { username, repo }),
                    "contributors" => Ok(Route::Contributors { username, repo }),
                    "analysis" => Ok(Route::Analysis { username, repo }),
                    "freelancers" => {
                        let criteria = FreelanceCriteria {
                            min_inactive_days: threshold(
                                query,
                                "min_inactive_days",
                                defaults.min_inactive_days,
                            )?,
                            max_commit_count: threshold(
                                query,
                                "max_commit_count",
                                defaults.max_commit_count,
                            )?,
                            max_activity_span_days: threshold(
                                query,
                                "max_activity_span_days",
                                defaults.max_activity_span_days,
                            )?,
                        };
                        Ok(Route::Freelancers {
                            username,
                            repo,
                            criteria,
                        })
                    }
                    _ => Err(RouteError::NotFound),
                }
            }
            _ => Err(RouteError::NotFound),
        }
    }
}

/// Resolve `target` against `service` and render the response.
///
/// # Examples
///
/// ```no_run
/// use repopulse_core::PulseConfig;
/// use repopulse_github::client::GitHubClient;
/// use repopulse_github::routes::dispatch;
/// use repopulse_github::service::ActivityService;
///
/// # async fn example() -> Result<(), repopulse_core::PulseError> {
/// let config = PulseConfig::default();
/// let client = GitHubClient::new(&config.resolve_token(None)?, &config.github)?;
/// let service = ActivityService::new(client, &config);
/// let response = dispatch(&service, "/github/repos/octocat/Hello-World/analysis").await;
/// println!("{} {}", response.status, response.body);
/// # Ok(())
/// # }
/// ```
pub async fn dispatch<P>(service: &ActivityService<P>, target: &str) -> ApiResponse
where
    P: HostingProvider + Sync,
{
    match Route::parse(target, &service.default_criteria()) {
        Ok(route) => execute(service, route).await,
        Err(err) => ApiResponse::rejected(err),
    }
}

/// Run an already-parsed route against `service`.
pub async fn execute<P>(service: &ActivityService<P>, route: Route) -> ApiResponse
where
    P: HostingProvider + Sync,
{
    tracing::debug!(?route, "dispatching");

    let outcome = match route {
        Route::Repositories { username } => {
            render(service.list_repositories(username.as_deref()).await, None)
        }
        Route::Commits { username, repo } => {
            render(service.list_commits(Some(&username), &repo).await, None)
        }
        Route::Contributors { username, repo } => render(
            service.list_contributors(Some(&username), &repo).await,
            None,
        ),
        Route::Analysis { username, repo } => render(
            service.analyze_activity(Some(&username), &repo).await,
            Some("Error analyzing repository"),
        ),
        Route::Freelancers {
            username,
            repo,
            criteria,
        } => render(
            service
                .detect_freelancers(Some(&username), &repo, Some(criteria))
                .await,
            Some("Error detecting freelance contributors"),
        ),
    };

    match outcome {
        Ok(body) => ApiResponse::ok(body),
        Err(detail) => {
            tracing::warn!(%detail, "request failed");
            ApiResponse::error(400, detail)
        }
    }
}

/// Serialize a successful result, or turn the error into a `detail` string
/// prefixed with `context`.
fn render<T: Serialize>(
    result: Result<T, PulseError>,
    context: Option<&str>,
) -> Result<Value, String> {
    result
        .and_then(|value| Ok(serde_json::to_value(value)?))
        .map_err(|err| match context {
            Some(context) => format!("{context}: {err}"),
            None => err.to_string(),
        })
}

/// Decode an `application/x-www-form-urlencoded` query string.
fn parse_query(query: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

/// Last value given for `key`.
fn lookup<'q>(query: &'q [(String, String)], key: &str) -> Option<&'q str> {
    query
        .iter()
        .rev()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn threshold(query: &[(String, String)], key: &str, default: u32) -> Result<u32, RouteError> {
    match lookup(query, key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| {
            RouteError::Invalid(PulseError::Validation(format!(
                "{key} must be a non-negative integer, got '{raw}'"
            )))
        }),
    }
}
