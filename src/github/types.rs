use chrono::{DateTime, Utc};

#[derive(Clone, Debug)]
pub struct RepoMeta {
    pub full_name: String,
    pub default_branch: String,
}

#[derive(Clone, Debug)]
pub struct UpstreamCommit {
    pub sha: String,
    pub authored_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BranchRef {
    pub name: String,
    pub tip_sha: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForkInfo {
    /// `owner/repo`
    pub full_name: String,
    pub owner: String,
    pub repo: String,
    pub pushed_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug)]
pub struct PullRequestRef {
    pub author: String,
    pub head_ref: String,
}

#[derive(Clone, Debug)]
pub struct TipCommit {
    pub sha: String,
    pub authored_at: DateTime<Utc>,
}
