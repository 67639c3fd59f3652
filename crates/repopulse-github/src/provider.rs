//! The hosting provider seam.

use std::future::Future;

use repopulse_activity::CommitSource;
use repopulse_core::{ContributorInfo, PulseError, RepositoryInfo};

/// A source-control host that resolves repositories by owner and name.
///
/// When `owner` is `None` the authenticated user is assumed.
pub trait HostingProvider {
    /// Handle to a resolved repository.
    type Repository: CommitSource + Send + Sync;

    /// List repositories owned by `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Resolution`] if the user cannot be resolved.
    fn repositories(
        &self,
        owner: Option<&str>,
    ) -> impl Future<Output = Result<Vec<RepositoryInfo>, PulseError>> + Send;

    /// Resolve `owner/name`.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Resolution`] if the repository does not exist or
    /// is not accessible.
    fn repository(
        &self,
        owner: Option<&str>,
        name: &str,
    ) -> impl Future<Output = Result<Self::Repository, PulseError>> + Send;

    /// List contributors of a resolved repository.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Resolution`] on upstream failure.
    fn contributors(
        &self,
        repository: &Self::Repository,
    ) -> impl Future<Output = Result<Vec<ContributorInfo>, PulseError>> + Send;
}
