use crate::github::types::ForkInfo;
use chrono::{DateTime, Utc};

/// Most recently pushed forks first, dropping any not pushed since `since`
/// before the `count` cap applies. Forks with no push date never qualify.
pub fn select_forks(forks: Vec<ForkInfo>, since: DateTime<Utc>, count: usize) -> Vec<ForkInfo> {
    let mut active: Vec<ForkInfo> = forks
        .into_iter()
        .filter(|f| f.pushed_at.is_some_and(|pushed| pushed >= since))
        .collect();
    active.sort_by(|a, b| b.pushed_at.cmp(&a.pushed_at));
    active.truncate(count);
    active
}
