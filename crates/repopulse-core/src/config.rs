use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PulseError;

/// Top-level configuration loaded from `.repopulse.toml`.
///
/// Supports layered resolution: CLI flags > env vars > local config > defaults.
///
/// # Examples
///
/// ```
/// use repopulse_core::PulseConfig;
///
/// let config = PulseConfig::default();
/// assert_eq!(config.fetch.detail_concurrency, 8);
/// assert_eq!(config.freelance.min_inactive_days, 30);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PulseConfig {
    /// Hosting provider access.
    #[serde(default)]
    pub github: GitHubConfig,
    /// Commit detail fetching behavior.
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Default thresholds for freelance-pattern detection.
    #[serde(default)]
    pub freelance: FreelanceConfig,
}

impl PulseConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::FileNotFound`] if `path` does not exist,
    /// [`PulseError::Io`] if it cannot be read, or [`PulseError::Toml`] if
    /// the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use repopulse_core::PulseConfig;
    /// use std::path::Path;
    ///
    /// let config = PulseConfig::from_file(Path::new(".repopulse.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, PulseError> {
        if !path.exists() {
            return Err(PulseError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use repopulse_core::PulseConfig;
    ///
    /// let toml = r#"
    /// [fetch]
    /// detail_concurrency = 16
    /// "#;
    /// let config = PulseConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.fetch.detail_concurrency, 16);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, PulseError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Resolve the API token: explicit value, then `[github] token`, then
    /// the `GITHUB_TOKEN` / `GH_TOKEN` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Config`] if no token is available.
    pub fn resolve_token(&self, explicit: Option<&str>) -> Result<String, PulseError> {
        if let Some(token) = explicit.filter(|t| !t.is_empty()) {
            return Ok(token.to_string());
        }
        if let Some(token) = self.github.token.as_deref().filter(|t| !t.is_empty()) {
            return Ok(token.to_string());
        }
        ["GITHUB_TOKEN", "GH_TOKEN"]
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
            .ok_or_else(|| {
                PulseError::Config(
                    "GITHUB_TOKEN not set. Pass --github-token or set GITHUB_TOKEN env var".into(),
                )
            })
    }
}

/// Hosting provider configuration.
///
/// # Examples
///
/// ```
/// use repopulse_core::GitHubConfig;
///
/// let config = GitHubConfig::default();
/// assert_eq!(config.per_page, 100);
/// assert!(config.api_url.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Personal access token.
    pub token: Option<String>,
    /// Base URL override, e.g. a GitHub Enterprise API root.
    pub api_url: Option<String>,
    /// Page size for list endpoints (default: 100, the provider maximum).
    #[serde(default = "default_per_page")]
    pub per_page: u8,
}

fn default_per_page() -> u8 {
    100
}

impl GitHubConfig {
    /// Page size clamped to what the provider accepts.
    pub fn page_size(&self) -> u8 {
        self.per_page.clamp(1, 100)
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: None,
            per_page: default_per_page(),
        }
    }
}

/// Commit detail fetching configuration.
///
/// # Examples
///
/// ```
/// use repopulse_core::FetchConfig;
///
/// let config = FetchConfig::default();
/// assert_eq!(config.detail_concurrency, 8);
/// assert_eq!(config.request_timeout_secs, 300);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Maximum in-flight commit detail requests (default: 8).
    #[serde(default = "default_detail_concurrency")]
    pub detail_concurrency: usize,
    /// Overall per-request limit in seconds; 0 disables (default: 300).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_detail_concurrency() -> usize {
    8
}

fn default_request_timeout_secs() -> u64 {
    300
}

impl FetchConfig {
    /// Concurrency limit, never below one.
    pub fn concurrency(&self) -> usize {
        self.detail_concurrency.max(1)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            detail_concurrency: default_detail_concurrency(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Default freelance detection thresholds.
///
/// # Examples
///
/// ```
/// use repopulse_core::FreelanceConfig;
///
/// let config = FreelanceConfig::default();
/// assert_eq!(config.min_inactive_days, 30);
/// assert_eq!(config.max_commit_count, 10);
/// assert_eq!(config.max_activity_span_days, 14);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreelanceConfig {
    /// Minimum dormancy in days (default: 30).
    #[serde(default = "default_min_inactive_days")]
    pub min_inactive_days: u32,
    /// Maximum total commits (default: 10).
    #[serde(default = "default_max_commit_count")]
    pub max_commit_count: u32,
    /// Maximum days between first and last commit (default: 14).
    #[serde(default = "default_max_activity_span_days")]
    pub max_activity_span_days: u32,
}

fn default_min_inactive_days() -> u32 {
    30
}

fn default_max_commit_count() -> u32 {
    10
}

fn default_max_activity_span_days() -> u32 {
    14
}

impl Default for FreelanceConfig {
    fn default() -> Self {
        Self {
            min_inactive_days: default_min_inactive_days(),
            max_commit_count: default_max_commit_count(),
            max_activity_span_days: default_max_activity_span_days(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = PulseConfig::default();
        assert!(config.github.token.is_none());
        assert!(config.github.api_url.is_none());
        assert_eq!(config.github.per_page, 100);
        assert_eq!(config.fetch.detail_concurrency, 8);
        assert_eq!(config.fetch.request_timeout_secs, 300);
        assert_eq!(config.freelance.min_inactive_days, 30);
        assert_eq!(config.freelance.max_commit_count, 10);
        assert_eq!(config.freelance.max_activity_span_days, 14);
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
[github]
token = "ghp_test"
api_url = "https://github.example.com/api/v3"
per_page = 50

[fetch]
detail_concurrency = 4
request_timeout_secs = 60

[freelance]
min_inactive_days = 60
max_commit_count = 5
max_activity_span_days = 7
"#;
        let config = PulseConfig::from_toml(toml).unwrap();
        assert_eq!(config.github.token.as_deref(), Some("ghp_test"));
        assert_eq!(
            config.github.api_url.as_deref(),
            Some("https://github.example.com/api/v3")
        );
        assert_eq!(config.github.per_page, 50);
        assert_eq!(config.fetch.detail_concurrency, 4);
        assert_eq!(config.fetch.request_timeout_secs, 60);
        assert_eq!(config.freelance.min_inactive_days, 60);
        assert_eq!(config.freelance.max_commit_count, 5);
        assert_eq!(config.freelance.max_activity_span_days, 7);
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = PulseConfig::from_toml("").unwrap();
        assert_eq!(config.fetch.detail_concurrency, 8);
        assert_eq!(config.freelance.max_commit_count, 10);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = PulseConfig::from_toml("[freelance]\nmax_commit_count = 3\n").unwrap();
        assert_eq!(config.freelance.max_commit_count, 3);
        assert_eq!(config.freelance.min_inactive_days, 30);
        assert_eq!(config.freelance.max_activity_span_days, 14);
    }

    #[test]
    fn missing_file_is_reported_by_path() {
        let err = PulseConfig::from_file(Path::new("/nonexistent/.repopulse.toml")).unwrap_err();
        assert!(matches!(err, PulseError::FileNotFound(_)));
    }

    #[test]
    fn invalid_toml_returns_error() {
        let result = PulseConfig::from_toml("{{invalid}}");
        assert!(result.is_err());
    }

    #[test]
    fn limits_are_clamped() {
        let mut config = PulseConfig::default();
        config.github.per_page = 250;
        config.fetch.detail_concurrency = 0;
        assert_eq!(config.github.page_size(), 100);
        assert_eq!(config.fetch.concurrency(), 1);
    }

    #[test]
    fn explicit_token_wins() {
        let mut config = PulseConfig::default();
        config.github.token = Some("from-file".into());
        assert_eq!(config.resolve_token(Some("from-flag")).unwrap(), "from-flag");
        assert_eq!(config.resolve_token(None).unwrap(), "from-file");
    }
}
