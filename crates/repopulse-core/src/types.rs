use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One historical commit as delivered by a commit source.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use repopulse_core::CommitRecord;
///
/// let record = CommitRecord {
///     sha: "abc123".into(),
///     author: Some("alice".into()),
///     timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
///     message: "fix: auth bug".into(),
/// };
/// assert_eq!(record.author_name(), Some("alice"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Commit identifier.
    pub sha: String,
    /// Author display name, if the provider reported one.
    pub author: Option<String>,
    /// Author timestamp.
    pub timestamp: DateTime<Utc>,
    /// Full commit message.
    pub message: String,
}

impl CommitRecord {
    /// Author name, treating an empty string the same as a missing one.
    pub fn author_name(&self) -> Option<&str> {
        self.author.as_deref().filter(|name| !name.is_empty())
    }
}

/// Churn for a single commit, fetched separately from the commit list.
///
/// # Examples
///
/// ```
/// use repopulse_core::CommitStats;
///
/// let stats = CommitStats { additions: 10, deletions: 2, files: 1 };
/// assert_eq!(stats.additions + stats.deletions, 12);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitStats {
    /// Lines added.
    pub additions: u64,
    /// Lines removed.
    pub deletions: u64,
    /// Files modified.
    pub files: u64,
}

/// Commit as returned by the commit listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    /// Commit identifier.
    pub sha: String,
    /// Full commit message.
    pub message: String,
    /// Author display name.
    pub author: Option<String>,
    /// ISO-8601 author timestamp.
    pub date: String,
}

impl From<&CommitRecord> for CommitSummary {
    fn from(record: &CommitRecord) -> Self {
        Self {
            sha: record.sha.clone(),
            message: record.message.clone(),
            author: record.author.clone(),
            date: record.timestamp.to_rfc3339(),
        }
    }
}

/// Repository as returned by the repository listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    /// Provider-assigned id.
    pub id: u64,
    /// Short name.
    pub name: String,
    /// `owner/name`.
    pub full_name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Browser URL.
    pub url: String,
    /// Primary language.
    pub language: Option<String>,
    /// Stargazer count.
    pub stars: u64,
}

/// Contributor as returned by the contributor listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorInfo {
    /// Account login.
    pub login: String,
    /// Commits credited by the provider.
    pub contributions: u64,
    /// Avatar image URL.
    pub avatar_url: String,
    /// Profile page URL.
    pub profile_url: String,
}

/// Output format for CLI results.
///
/// # Examples
///
/// ```
/// use repopulse_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable tables and summaries.
    #[default]
    Text,
    /// Machine-readable JSON, same shape as the route bodies.
    Json,
    /// Markdown-formatted output.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
