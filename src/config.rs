use crate::error::{ForkStalkError, Result};
use chrono::{DateTime, Duration, Utc};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// What to do when a fork's branch list or a branch tip can't be fetched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Fail the whole run on the first error.
    #[default]
    Abort,
    /// Log and drop only the affected fork or branch.
    Skip,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    pub github_token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub since_days: i64,
    pub fork_count: usize,
    pub fork_concurrency: Option<usize>,
    pub branch_concurrency: Option<usize>,
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub on_error: FailurePolicy,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("github_token", &self.github_token.as_ref().map(|_| "[REDACTED]"))
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("since_days", &self.since_days)
            .field("fork_count", &self.fork_count)
            .field("fork_concurrency", &self.fork_concurrency)
            .field("branch_concurrency", &self.branch_concurrency)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("on_error", &self.on_error)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github_token: None,
            username: None,
            password: None,
            since_days: 30,
            fork_count: 20,
            fork_concurrency: None,
            branch_concurrency: None,
            request_timeout_secs: None,
            on_error: FailurePolicy::Abort,
        }
    }
}

/// Values given on the command line. Unset fields leave lower layers alone.
#[derive(Debug, Default, Serialize)]
pub struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since_days: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fork_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fork_concurrency: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_concurrency: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_error: Option<FailurePolicy>,
}

impl Config {
    pub fn load(overrides: &Overrides) -> Result<Self> {
        let config_file = config_dir().join("forkstalk").join("config.toml");
        Self::load_from(&config_file, overrides)
    }

    /// Defaults, then the TOML file if present, then `FORKSTALK_*` and
    /// `GITHUB_TOKEN`, then command-line overrides.
    pub fn load_from(config_file: &Path, overrides: &Overrides) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        if config_file.exists() {
            figment = figment.merge(Toml::file(config_file));
        }

        figment = figment
            .merge(Env::prefixed("FORKSTALK_"))
            .merge(
                Env::raw()
                    .only(&["GITHUB_TOKEN"])
                    .map(|_| "github_token".into()),
            )
            .merge(Serialized::defaults(overrides));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.since_days < 0 {
            return Err(ForkStalkError::Config(format!(
                "since_days must not be negative, got {}",
                self.since_days
            )));
        }
        for (key, limit) in [
            ("fork_concurrency", self.fork_concurrency),
            ("branch_concurrency", self.branch_concurrency),
        ] {
            if limit == Some(0) {
                return Err(ForkStalkError::Config(format!("{key} must be at least 1")));
            }
        }
        if self.request_timeout_secs == Some(0) {
            return Err(ForkStalkError::Config(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Start of the lookback window, `since_days` before `now`.
    pub fn window_start(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        Duration::try_days(self.since_days)
            .and_then(|window| now.checked_sub_signed(window))
            .ok_or_else(|| {
                ForkStalkError::Config(format!(
                    "since_days out of range: {}",
                    self.since_days
                ))
            })
    }
}

/// Accepts `owner/name` or a GitHub URL.
pub fn parse_repo(input: &str) -> Result<(String, String)> {
    let trimmed = input.trim().trim_end_matches('/').trim_end_matches(".git");
    let slug = trimmed
        .split_once("github.com/")
        .or_else(|| trimmed.split_once("github.com:"))
        .map(|(_, rest)| rest)
        .unwrap_or(trimmed);

    match slug.split_once('/') {
        Some((owner, name))
            if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
        {
            Ok((owner.to_string(), name.to_string()))
        }
        _ => Err(ForkStalkError::InvalidRepo(input.to_string())),
    }
}

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".config"))
        })
        .unwrap_or_else(|| PathBuf::from("."))
}
