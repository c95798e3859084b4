#![cfg(test)]

use crate::error::{ForkStalkError, Result};
use crate::github::api::HostingApi;
use crate::github::types::*;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn days_ago(days: i64) -> DateTime<Utc> {
    Utc::now() - Duration::days(days)
}

pub fn branch(name: &str, sha: &str) -> BranchRef {
    BranchRef {
        name: name.to_string(),
        tip_sha: sha.to_string(),
    }
}

/// A fork named `<owner>/widget`.
pub fn fork(owner: &str, pushed_at: DateTime<Utc>) -> ForkInfo {
    ForkInfo {
        full_name: format!("{owner}/widget"),
        owner: owner.to_string(),
        repo: "widget".to_string(),
        pushed_at: Some(pushed_at),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Op {
    Repository,
    Commits,
    Branches,
    Forks,
    PullRequests,
    BranchTip,
}

/// In-memory hosting API. Fork repos share the upstream repo name.
pub struct FakeHosting {
    owner: String,
    name: String,
    default_branch: String,
    upstream_branches: Vec<BranchRef>,
    upstream_commits: Vec<UpstreamCommit>,
    forks: Vec<ForkInfo>,
    pulls: Vec<PullRequestRef>,
    fork_branches: HashMap<String, Vec<BranchRef>>,
    tips: HashMap<String, TipCommit>,
    failures: HashSet<(Op, String)>,
    delay: Option<std::time::Duration>,
    tip_fetches: AtomicUsize,
    tips_in_flight: AtomicUsize,
    peak_tips_in_flight: AtomicUsize,
}

impl FakeHosting {
    pub fn new(owner: &str, name: &str, default_branch: &str) -> Self {
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
            default_branch: default_branch.to_string(),
            upstream_branches: Vec::new(),
            upstream_commits: Vec::new(),
            forks: Vec::new(),
            pulls: Vec::new(),
            fork_branches: HashMap::new(),
            tips: HashMap::new(),
            failures: HashSet::new(),
            delay: None,
            tip_fetches: AtomicUsize::new(0),
            tips_in_flight: AtomicUsize::new(0),
            peak_tips_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_upstream_branch(mut self, name: &str, sha: &str) -> Self {
        self.upstream_branches.push(branch(name, sha));
        self
    }

    pub fn with_upstream_commit(mut self, sha: &str, authored_at: DateTime<Utc>) -> Self {
        self.upstream_commits.push(UpstreamCommit {
            sha: sha.to_string(),
            authored_at,
        });
        self
    }

    pub fn with_pull_request(mut self, author: &str, head_ref: &str) -> Self {
        self.pulls.push(PullRequestRef {
            author: author.to_string(),
            head_ref: head_ref.to_string(),
        });
        self
    }

    pub fn with_fork(mut self, fork: ForkInfo) -> Self {
        self.forks.push(fork);
        self
    }

    pub fn with_fork_branch(
        mut self,
        fork_owner: &str,
        name: &str,
        sha: &str,
        authored_at: DateTime<Utc>,
    ) -> Self {
        let repo = format!("{fork_owner}/{}", self.name);
        self.tips.insert(
            format!("{repo}:{name}"),
            TipCommit {
                sha: sha.to_string(),
                authored_at,
            },
        );
        self.fork_branches
            .entry(repo)
            .or_default()
            .push(branch(name, sha));
        self
    }

    /// `target` is `owner/repo`, or `owner/repo:branch` for [`Op::BranchTip`].
    pub fn failing(mut self, op: Op, target: &str) -> Self {
        self.failures.insert((op, target.to_string()));
        self
    }

    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn tip(&self, fork_owner: &str, name: &str) -> TipCommit {
        self.tips[&format!("{fork_owner}/{}:{name}", self.name)].clone()
    }

    pub fn tip_fetches(&self) -> usize {
        self.tip_fetches.load(Ordering::SeqCst)
    }

    pub fn peak_tip_fetches(&self) -> usize {
        self.peak_tips_in_flight.load(Ordering::SeqCst)
    }

    async fn call(&self, op: Op, target: &str) -> Result<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failures.contains(&(op, target.to_string())) {
            return Err(ForkStalkError::GitHub(format!("{op:?} {target}: 404 Not Found")));
        }
        Ok(())
    }

    fn is_upstream(&self, owner: &str, name: &str) -> bool {
        owner == self.owner && name == self.name
    }
}

#[async_trait]
impl HostingApi for FakeHosting {
    async fn repository(&self, owner: &str, name: &str) -> Result<RepoMeta> {
        self.call(Op::Repository, &format!("{owner}/{name}")).await?;
        Ok(RepoMeta {
            full_name: format!("{owner}/{name}"),
            default_branch: self.default_branch.clone(),
        })
    }

    async fn commits_since(
        &self,
        owner: &str,
        name: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<UpstreamCommit>> {
        self.call(Op::Commits, &format!("{owner}/{name}")).await?;
        Ok(self
            .upstream_commits
            .iter()
            .filter(|c| c.authored_at >= since)
            .cloned()
            .collect())
    }

    async fn branches(&self, owner: &str, name: &str) -> Result<Vec<BranchRef>> {
        let repo = format!("{owner}/{name}");
        self.call(Op::Branches, &repo).await?;
        if self.is_upstream(owner, name) {
            return Ok(self.upstream_branches.clone());
        }
        Ok(self.fork_branches.get(&repo).cloned().unwrap_or_default())
    }

    async fn forks(&self, owner: &str, name: &str) -> Result<Vec<ForkInfo>> {
        self.call(Op::Forks, &format!("{owner}/{name}")).await?;
        Ok(self.forks.clone())
    }

    async fn open_pull_requests(&self, owner: &str, name: &str) -> Result<Vec<PullRequestRef>> {
        self.call(Op::PullRequests, &format!("{owner}/{name}")).await?;
        Ok(self.pulls.clone())
    }

    async fn branch_tip(&self, owner: &str, repo: &str, branch: &str) -> Result<TipCommit> {
        let key = format!("{owner}/{repo}:{branch}");
        self.tip_fetches.fetch_add(1, Ordering::SeqCst);
        let now = self.tips_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_tips_in_flight.fetch_max(now, Ordering::SeqCst);

        let outcome = self.call(Op::BranchTip, &key).await;
        self.tips_in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome?;

        self.tips
            .get(&key)
            .cloned()
            .ok_or_else(|| ForkStalkError::GitHub(format!("no branch {key}")))
    }
}
