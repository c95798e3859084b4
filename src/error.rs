use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForkStalkError {
    #[error("github error: {0}")]
    GitHub(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("invalid repository {0:?}: expected owner/name")]
    InvalidRepo(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: String, secs: u64 },
}

impl From<octocrab::Error> for ForkStalkError {
    fn from(e: octocrab::Error) -> Self {
        ForkStalkError::GitHub(e.to_string())
    }
}

impl From<figment::Error> for ForkStalkError {
    fn from(e: figment::Error) -> Self {
        ForkStalkError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ForkStalkError>;
