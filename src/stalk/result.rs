use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BranchResult {
    pub name: String,
    /// Author date of the branch's tip commit.
    pub last_modified: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterestingResult {
    /// `owner/repo`
    pub fork_name: String,
    pub branches: Vec<BranchResult>,
}

impl InterestingResult {
    fn new(fork_name: &str) -> Self {
        Self {
            fork_name: fork_name.to_string(),
            branches: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn branch_names(&self) -> impl Iterator<Item = &str> {
        self.branches.iter().map(|b| b.name.as_str())
    }
}

/// Shared sink for concurrently classified branches.
#[derive(Debug, Default)]
pub struct ResultCollector {
    forks: Mutex<HashMap<String, InterestingResult>>,
}

impl ResultCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get-or-create the fork's entry and append, as one locked step.
    pub fn record(&self, fork_name: &str, branch: BranchResult) {
        let mut forks = self.forks.lock().unwrap_or_else(|e| e.into_inner());
        forks
            .entry(fork_name.to_string())
            .or_insert_with(|| InterestingResult::new(fork_name))
            .branches
            .push(branch);
    }

    pub fn fork_count(&self) -> usize {
        self.forks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Entries in the order their fork names appear in `order`; forks not
    /// named there follow, sorted by name.
    pub fn into_results<'a>(self, order: impl IntoIterator<Item = &'a str>) -> Vec<InterestingResult> {
        let mut forks = self.forks.into_inner().unwrap_or_else(|e| e.into_inner());
        let mut out: Vec<InterestingResult> = order
            .into_iter()
            .filter_map(|name| forks.remove(name))
            .collect();
        let mut rest: Vec<InterestingResult> = forks.into_values().collect();
        rest.sort_by(|a, b| a.fork_name.cmp(&b.fork_name));
        out.extend(rest);
        out
    }
}
