use crate::github::types::{BranchRef, TipCommit};
use crate::stalk::snapshot::{pr_key, UpstreamSnapshot};
use chrono::{DateTime, Utc};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    OpenPullRequest,
    Stale,
    MirrorsUpstream,
    Merged,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SkipReason::OpenPullRequest => "open pull request",
            SkipReason::Stale => "tip older than window",
            SkipReason::MirrorsUpstream => "same tip as upstream branch",
            SkipReason::Merged => "tip already merged upstream",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Interesting,
    Skip(SkipReason),
}

/// Decides whether a single fork branch carries new, unmerged, un-PR'd work.
pub struct Classifier<'a> {
    snapshot: &'a UpstreamSnapshot,
    since: DateTime<Utc>,
}

impl<'a> Classifier<'a> {
    pub fn new(snapshot: &'a UpstreamSnapshot, since: DateTime<Utc>) -> Self {
        Self { snapshot, since }
    }

    /// Checked before the tip is fetched so covered branches cost no request.
    pub fn open_pull_request(&self, fork_owner: &str, branch: &str) -> bool {
        self.snapshot
            .open_pull_requests
            .contains(&pr_key(fork_owner, branch))
    }

    /// SHA comparisons use the branch listing's tip; only the author date
    /// comes from the fetched tip commit.
    pub fn classify(&self, fork_owner: &str, branch: &BranchRef, tip: &TipCommit) -> Verdict {
        if self.open_pull_request(fork_owner, &branch.name) {
            return Verdict::Skip(SkipReason::OpenPullRequest);
        }

        if tip.authored_at < self.since {
            return Verdict::Skip(SkipReason::Stale);
        }

        // A fork's copy of the default branch is never compared by tip here;
        // only the merged check below can drop it.
        if branch.name != self.snapshot.default_branch
            && self.snapshot.branch_tips.get(&branch.name) == Some(&branch.tip_sha)
        {
            return Verdict::Skip(SkipReason::MirrorsUpstream);
        }

        if self.snapshot.recent_commits.contains(&branch.tip_sha) {
            return Verdict::Skip(SkipReason::Merged);
        }

        Verdict::Interesting
    }
}
