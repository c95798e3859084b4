use crate::error::Result;
use crate::github::types::{BranchRef, ForkInfo, PullRequestRef, RepoMeta, TipCommit, UpstreamCommit};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// The slice of a code hosting API that fork stalking reads from.
///
/// Every list operation returns the fully materialized collection; paging is
/// the implementor's concern.
#[async_trait]
pub trait HostingApi: Send + Sync {
    async fn repository(&self, owner: &str, name: &str) -> Result<RepoMeta>;

    /// Commits on the default branch authored at or after `since`.
    async fn commits_since(
        &self,
        owner: &str,
        name: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<UpstreamCommit>>;

    async fn branches(&self, owner: &str, name: &str) -> Result<Vec<BranchRef>>;

    async fn forks(&self, owner: &str, name: &str) -> Result<Vec<ForkInfo>>;

    /// Open pull requests only.
    async fn open_pull_requests(&self, owner: &str, name: &str) -> Result<Vec<PullRequestRef>>;

    async fn branch_tip(&self, owner: &str, repo: &str, branch: &str) -> Result<TipCommit>;
}
