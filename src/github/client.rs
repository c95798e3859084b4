use crate::config::Config;
use crate::error::{ForkStalkError, Result};
use crate::github::api::HostingApi;
use crate::github::types::{BranchRef, ForkInfo, PullRequestRef, RepoMeta, TipCommit, UpstreamCommit};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use octocrab::{params, Octocrab};
use std::future::Future;
use std::time::Duration;

const PER_PAGE: u8 = 100;

#[derive(Clone)]
pub struct GitHubClient {
    octo: Octocrab,
    request_timeout: Option<Duration>,
}

impl GitHubClient {
    /// Token auth wins over username/password; with neither the client is
    /// anonymous and gets the lower per-IP rate limit.
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = Octocrab::builder();
        match (&config.github_token, &config.username, &config.password) {
            (Some(token), _, _) if !token.is_empty() => {
                builder = builder.personal_token(token.clone());
            }
            (_, Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => {
                builder = builder.basic_auth(user.clone(), pass.clone());
            }
            _ => {}
        }
        let octo = builder.build()?;

        Ok(Self {
            octo,
            request_timeout: config.request_timeout_secs.map(Duration::from_secs),
        })
    }

    async fn send<T, F>(&self, operation: &str, request: F) -> Result<T>
    where
        F: Future<Output = octocrab::Result<T>>,
    {
        match self.request_timeout {
            Some(limit) => tokio::time::timeout(limit, request)
                .await
                .map_err(|_| ForkStalkError::Timeout {
                    operation: operation.to_string(),
                    secs: limit.as_secs(),
                })?
                .map_err(ForkStalkError::from),
            None => request.await.map_err(ForkStalkError::from),
        }
    }
}

#[async_trait]
impl HostingApi for GitHubClient {
    async fn repository(&self, owner: &str, name: &str) -> Result<RepoMeta> {
        let handler = self.octo.repos(owner, name);
        let repo = self
            .send(&format!("get {owner}/{name}"), handler.get())
            .await?;

        let default_branch = repo.default_branch.clone().ok_or_else(|| {
            ForkStalkError::GitHub(format!("{owner}/{name} has no default branch"))
        })?;

        Ok(RepoMeta {
            full_name: repo
                .full_name
                .clone()
                .unwrap_or_else(|| format!("{owner}/{name}")),
            default_branch,
        })
    }

    async fn commits_since(
        &self,
        owner: &str,
        name: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<UpstreamCommit>> {
        let mut commits = Vec::new();
        let mut page = 1u32;

        loop {
            let handler = self.octo.repos(owner, name);
            let request = handler
                .list_commits()
                .since(since)
                .per_page(PER_PAGE)
                .page(page)
                .send();
            let result = self
                .send(&format!("list commits of {owner}/{name}"), request)
                .await?;

            if result.items.is_empty() {
                break;
            }

            for c in &result.items {
                commits.push(UpstreamCommit {
                    sha: c.sha.clone(),
                    authored_at: author_date(c, owner, name)?,
                });
            }

            if result.next.is_none() {
                break;
            }
            page += 1;
        }

        Ok(commits)
    }

    async fn branches(&self, owner: &str, name: &str) -> Result<Vec<BranchRef>> {
        let mut branches = Vec::new();
        let mut page = 1u32;

        loop {
            let handler = self.octo.repos(owner, name);
            let request = handler.list_branches().per_page(PER_PAGE).page(page).send();
            let result = self
                .send(&format!("list branches of {owner}/{name}"), request)
                .await?;

            if result.items.is_empty() {
                break;
            }

            branches.extend(result.items.iter().map(|b| BranchRef {
                name: b.name.clone(),
                tip_sha: b.commit.sha.clone(),
            }));

            if result.next.is_none() {
                break;
            }
            page += 1;
        }

        Ok(branches)
    }

    async fn forks(&self, owner: &str, name: &str) -> Result<Vec<ForkInfo>> {
        let mut forks = Vec::new();
        let mut page = 1u32;

        loop {
            let handler = self.octo.repos(owner, name);
            let request = handler.list_forks().per_page(PER_PAGE).page(page).send();
            let result = self
                .send(&format!("list forks of {owner}/{name}"), request)
                .await?;

            if result.items.is_empty() {
                break;
            }

            for fork in &result.items {
                let fork_owner = fork
                    .owner
                    .as_ref()
                    .map(|o| o.login.clone())
                    .unwrap_or_default();
                let full_name = fork
                    .full_name
                    .clone()
                    .unwrap_or_else(|| format!("{fork_owner}/{}", fork.name));
                forks.push(ForkInfo {
                    full_name,
                    owner: fork_owner,
                    repo: fork.name.clone(),
                    pushed_at: fork.pushed_at,
                });
            }

            if result.next.is_none() {
                break;
            }
            page += 1;
        }

        Ok(forks)
    }

    async fn open_pull_requests(&self, owner: &str, name: &str) -> Result<Vec<PullRequestRef>> {
        let mut pulls = Vec::new();
        let mut page = 1u32;

        loop {
            let handler = self.octo.pulls(owner, name);
            let request = handler
                .list()
                .state(params::State::Open)
                .per_page(PER_PAGE)
                .page(page)
                .send();
            let result = self
                .send(&format!("list pull requests of {owner}/{name}"), request)
                .await?;

            if result.items.is_empty() {
                break;
            }

            pulls.extend(result.items.iter().map(|pr| PullRequestRef {
                author: pr
                    .user
                    .as_ref()
                    .map(|u| u.login.clone())
                    .unwrap_or_default(),
                head_ref: pr.head.ref_field.clone(),
            }));

            if result.next.is_none() {
                break;
            }
            page += 1;
        }

        Ok(pulls)
    }

    async fn branch_tip(&self, owner: &str, repo: &str, branch: &str) -> Result<TipCommit> {
        let handler = self.octo.repos(owner, repo);
        let request = handler.list_commits().sha(branch).per_page(1u8).send();
        let result = self
            .send(&format!("get tip of {owner}/{repo}:{branch}"), request)
            .await?;

        let tip = result.items.first().ok_or_else(|| {
            ForkStalkError::GitHub(format!("{owner}/{repo}:{branch} has no commits"))
        })?;

        Ok(TipCommit {
            sha: tip.sha.clone(),
            authored_at: author_date(tip, owner, repo)?,
        })
    }
}

fn author_date(
    commit: &octocrab::models::repos::RepoCommit,
    owner: &str,
    repo: &str,
) -> Result<DateTime<Utc>> {
    commit
        .commit
        .author
        .as_ref()
        .and_then(|a| a.date.as_ref())
        .cloned()
        .ok_or_else(|| {
            ForkStalkError::GitHub(format!(
                "commit {} in {owner}/{repo} has no author date",
                commit.sha
            ))
        })
}
