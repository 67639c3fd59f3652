use std::path::PathBuf;

/// Errors that can occur across repopulse.
///
/// Library crates use this type directly; the binary converts to
/// `miette::Report` at the boundary and the route layer collapses every
/// variant into a single bad-request response.
///
/// # Examples
///
/// ```
/// use repopulse_core::PulseError;
///
/// let err = PulseError::Resolution("repository octocat/missing not found".into());
/// assert!(err.is_resolution());
/// assert!(err.to_string().contains("octocat/missing"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum PulseError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    #[diagnostic(help("set GITHUB_TOKEN or add a [github] section to .repopulse.toml"))]
    Config(String),

    /// The repository or user could not be found or authorized upstream.
    #[error("{0}")]
    Resolution(String),

    /// A single commit's detail (stats) could not be fetched.
    #[error("failed to fetch details for commit {sha}: {message}")]
    DetailFetch {
        /// Commit identifier.
        sha: String,
        /// Upstream failure description.
        message: String,
    },

    /// Malformed request parameters.
    #[error("invalid parameter: {0}")]
    Validation(String),

    /// The whole operation exceeded the configured request timeout.
    #[error("request timed out after {seconds}s")]
    Timeout {
        /// Configured limit in seconds.
        seconds: u64,
    },

    /// Local git operation failure.
    #[error("git error: {0}")]
    Git(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}

impl PulseError {
    /// Whether this error means the repository or user could not be resolved.
    pub fn is_resolution(&self) -> bool {
        matches!(self, PulseError::Resolution(_))
    }
}
