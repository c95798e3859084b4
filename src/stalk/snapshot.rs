use crate::error::Result;
use crate::github::api::HostingApi;
use crate::github::types::ForkInfo;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tracing::info;

/// Upstream state every fork branch is compared against. Read-only once built.
#[derive(Clone, Debug, Default)]
pub struct UpstreamSnapshot {
    pub full_name: String,
    pub default_branch: String,
    pub branch_tips: HashMap<String, String>,
    pub recent_commits: HashSet<String>,
    pub open_pull_requests: HashSet<String>,
}

/// Key under which an open pull request (and a fork branch) is looked up.
pub fn pr_key(owner: &str, branch: &str) -> String {
    format!("{owner}/{branch}")
}

impl UpstreamSnapshot {
    /// Runs the five upstream queries concurrently. Any failure aborts the
    /// whole fetch; no partial snapshot is ever returned.
    pub async fn fetch(
        api: &dyn HostingApi,
        owner: &str,
        name: &str,
        since: DateTime<Utc>,
    ) -> Result<(Self, Vec<ForkInfo>)> {
        let (meta, commits, branches, forks, pulls) = futures::try_join!(
            api.repository(owner, name),
            api.commits_since(owner, name, since),
            api.branches(owner, name),
            api.forks(owner, name),
            api.open_pull_requests(owner, name),
        )?;

        let newest_upstream = commits.iter().map(|c| c.authored_at).max();
        let snapshot = Self {
            full_name: meta.full_name,
            default_branch: meta.default_branch,
            branch_tips: branches.into_iter().map(|b| (b.name, b.tip_sha)).collect(),
            recent_commits: commits.into_iter().map(|c| c.sha).collect(),
            open_pull_requests: pulls
                .iter()
                .map(|pr| pr_key(&pr.author, &pr.head_ref))
                .collect(),
        };

        info!(
            repo = %snapshot.full_name,
            default_branch = %snapshot.default_branch,
            branches = snapshot.branch_tips.len(),
            recent_commits = snapshot.recent_commits.len(),
            open_pull_requests = snapshot.open_pull_requests.len(),
            forks = forks.len(),
            newest_upstream = ?newest_upstream,
            "Upstream snapshot built"
        );

        Ok((snapshot, forks))
    }
}
