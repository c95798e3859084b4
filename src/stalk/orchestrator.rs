use crate::config::{Config, FailurePolicy};
use crate::error::{ForkStalkError, Result};
use crate::github::api::HostingApi;
use crate::github::types::{BranchRef, ForkInfo};
use crate::stalk::filter::{Classifier, Verdict};
use crate::stalk::result::{BranchResult, InterestingResult, ResultCollector};
use crate::stalk::select::select_forks;
use crate::stalk::snapshot::UpstreamSnapshot;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info, warn};

#[derive(Clone, Debug)]
pub struct StalkOptions {
    pub since: DateTime<Utc>,
    pub fork_count: usize,
    /// Forks scanned at once; `None` is unbounded.
    pub fork_concurrency: Option<usize>,
    /// Tip fetches in flight per fork; `None` is unbounded.
    pub branch_concurrency: Option<usize>,
    pub on_error: FailurePolicy,
}

impl StalkOptions {
    pub fn from_config(config: &Config, since: DateTime<Utc>) -> Self {
        Self {
            since,
            fork_count: config.fork_count,
            fork_concurrency: config.fork_concurrency,
            branch_concurrency: config.branch_concurrency,
            on_error: config.on_error,
        }
    }
}

#[derive(Clone, Debug)]
pub struct StalkReport {
    /// `owner/name` of the upstream repository.
    pub upstream: String,
    pub default_branch: String,
    pub since: DateTime<Utc>,
    /// One entry per fork with at least one interesting branch, most
    /// recently pushed fork first.
    pub forks: Vec<InterestingResult>,
}

impl StalkReport {
    #[cfg(test)]
    pub fn get(&self, fork_name: &str) -> Option<&InterestingResult> {
        self.forks.iter().find(|r| r.fork_name == fork_name)
    }

    pub fn len(&self) -> usize {
        self.forks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forks.is_empty()
    }
}

pub struct ForkStalker {
    options: StalkOptions,
}

impl ForkStalker {
    pub fn new(options: StalkOptions) -> Self {
        Self { options }
    }

    pub async fn get_forks(
        &self,
        api: &dyn HostingApi,
        owner: &str,
        name: &str,
    ) -> Result<StalkReport> {
        let since = self.options.since;
        let (snapshot, forks) = UpstreamSnapshot::fetch(api, owner, name, since).await?;

        let total = forks.len();
        let selected = select_forks(forks, since, self.options.fork_count);
        info!(
            total,
            selected = selected.len(),
            since = %since,
            "Forks selected"
        );

        let classifier = Classifier::new(&snapshot, since);
        let collector = ResultCollector::new();

        stream::iter(
            selected
                .iter()
                .map(|fork| self.stalk_fork(api, &classifier, &collector, fork)),
        )
        .buffer_unordered(limit(self.options.fork_concurrency))
        .try_collect::<Vec<()>>()
        .await?;

        info!(interesting = collector.fork_count(), "Fork scan finished");
        let results = collector.into_results(selected.iter().map(|f| f.full_name.as_str()));

        Ok(StalkReport {
            upstream: snapshot.full_name.clone(),
            default_branch: snapshot.default_branch.clone(),
            since,
            forks: results,
        })
    }

    async fn stalk_fork(
        &self,
        api: &dyn HostingApi,
        classifier: &Classifier<'_>,
        collector: &ResultCollector,
        fork: &ForkInfo,
    ) -> Result<()> {
        let branches = match api.branches(&fork.owner, &fork.repo).await {
            Ok(b) => b,
            Err(e) => return self.tolerate(e, &fork.full_name),
        };
        debug!(fork = %fork.full_name, branches = branches.len(), "Fork branches listed");

        stream::iter(
            branches
                .iter()
                .map(|branch| self.stalk_branch(api, classifier, collector, fork, branch)),
        )
        .buffer_unordered(limit(self.options.branch_concurrency))
        .try_collect::<Vec<()>>()
        .await?;

        Ok(())
    }

    async fn stalk_branch(
        &self,
        api: &dyn HostingApi,
        classifier: &Classifier<'_>,
        collector: &ResultCollector,
        fork: &ForkInfo,
        branch: &BranchRef,
    ) -> Result<()> {
        if classifier.open_pull_request(&fork.owner, &branch.name) {
            debug!(fork = %fork.full_name, branch = %branch.name, "Skipped: open pull request");
            return Ok(());
        }

        let tip = match api.branch_tip(&fork.owner, &fork.repo, &branch.name).await {
            Ok(t) => t,
            Err(e) => return self.tolerate(e, &format!("{}:{}", fork.full_name, branch.name)),
        };

        match classifier.classify(&fork.owner, branch, &tip) {
            Verdict::Interesting => {
                debug!(fork = %fork.full_name, branch = %branch.name, sha = %tip.sha, "Interesting branch");
                collector.record(
                    &fork.full_name,
                    BranchResult {
                        name: branch.name.clone(),
                        last_modified: tip.authored_at,
                    },
                );
            }
            Verdict::Skip(reason) => {
                debug!(fork = %fork.full_name, branch = %branch.name, %reason, "Skipped");
            }
        }

        Ok(())
    }

    fn tolerate(&self, err: ForkStalkError, target: &str) -> Result<()> {
        match self.options.on_error {
            FailurePolicy::Abort => Err(err),
            FailurePolicy::Skip => {
                warn!(target_ref = target, error = %err, "Fetch failed, skipping");
                Ok(())
            }
        }
    }
}

fn limit(concurrency: Option<usize>) -> usize {
    concurrency.unwrap_or(usize::MAX)
}
