//! Publishing generated projects
//!
//! A [`Publisher`] pushes a [`MaterializedSet`] to a remote repository and
//! opens one issue per task.
//!
//! - [`GitHubPublisher`]: GitHub REST v3

mod github;

pub use github::GitHubPublisher;

use crate::error::PublishError;
use async_trait::async_trait;
use synapse_manifest::MaterializedSet;

/// Remote repository host
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Reuse repository `name` or create it; returns its web URL
    ///
    /// # Errors
    /// Returns `PublishError` if the repository can be neither read nor created
    async fn ensure_repository(&self, name: &str, description: &str) -> Result<String, PublishError>;

    /// Create or update every file; returns the number pushed
    ///
    /// # Errors
    /// Returns `PublishError` on the first file that cannot be pushed
    async fn push_files(&self, repo: &str, files: &MaterializedSet) -> Result<usize, PublishError>;

    /// Open one issue per task; returns the number created
    ///
    /// # Errors
    /// Returns `PublishError` on the first issue that cannot be created
    async fn create_issues(&self, repo: &str, tasks: &[String]) -> Result<usize, PublishError>;
}

/// Ensure the repository, push files and open issues
///
/// # Errors
/// Propagates the first `PublishError`
pub async fn publish_project(
    publisher: &dyn Publisher,
    repo: &str,
    description: &str,
    files: &MaterializedSet,
    tasks: &[String],
) -> Result<String, PublishError> {
    let url = publisher.ensure_repository(repo, description).await?;
    let pushed = publisher.push_files(repo, files).await?;
    let issues = if tasks.is_empty() {
        0
    } else {
        publisher.create_issues(repo, tasks).await?
    };
    tracing::info!(%url, files = pushed, issues, "Published project");
    Ok(url)
}
