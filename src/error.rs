use thiserror::Error;

/// Every fallible league operation reports one of these kinds.
///
/// `InvalidInput` is the caller's fault and must not be retried. `Dependency`
/// covers the result store and the outcome predictor; callers may retry it.
#[derive(Error, Debug)]
pub enum LeagueError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{source_name} failed: {message}")]
    Dependency {
        source_name: &'static str,
        message: String,
    },

    #[error("not found: {0}")]
    NotFound(String),
}

impl LeagueError {
    pub fn invalid(message: impl Into<String>) -> Self {
        LeagueError::InvalidInput(message.into())
    }

    pub fn store(message: impl Into<String>) -> Self {
        LeagueError::Dependency {
            source_name: "result store",
            message: message.into(),
        }
    }

    pub fn predictor(message: impl Into<String>) -> Self {
        LeagueError::Dependency {
            source_name: "outcome predictor",
            message: message.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, LeagueError::Dependency { .. })
    }
}

impl From<rusqlite::Error> for LeagueError {
    fn from(err: rusqlite::Error) -> Self {
        LeagueError::store(err.to_string())
    }
}

impl From<std::io::Error> for LeagueError {
    fn from(err: std::io::Error) -> Self {
        LeagueError::predictor(err.to_string())
    }
}

impl From<serde_json::Error> for LeagueError {
    fn from(err: serde_json::Error) -> Self {
        LeagueError::predictor(format!("invalid json: {err}"))
    }
}

impl From<reqwest::Error> for LeagueError {
    fn from(err: reqwest::Error) -> Self {
        LeagueError::predictor(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LeagueError>;
