//! Shared records, settings, and the error type for repopulse.
//!
//! - [`PulseError`]: every failure the analytics crates can report
//! - [`PulseConfig`]: `.repopulse.toml` with `[github]`, `[fetch]`, and
//!   `[freelance]` tables
//! - Records exchanged between crates: [`CommitRecord`], [`CommitStats`],
//!   [`CommitSummary`], [`RepositoryInfo`], [`ContributorInfo`], [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{FetchConfig, FreelanceConfig, GitHubConfig, PulseConfig};
pub use error::PulseError;
pub use types::{
    CommitRecord, CommitStats, CommitSummary, ContributorInfo, OutputFormat, RepositoryInfo,
};

/// A convenience `Result` type for repopulse operations.
pub type Result<T> = std::result::Result<T, PulseError>;
