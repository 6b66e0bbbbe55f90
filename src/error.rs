use axum::http::StatusCode;

/// Errors produced while talking to the statistics backend.
///
/// Readers always return these to the caller; the loader layer decides
/// whether to degrade (see `page::settle`). The recorder never surfaces them.
#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    #[error("invalid backend base url {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("backend returned HTTP {status} for {path}")]
    Status { path: String, status: StatusCode },

    #[error("unexpected payload from {path}: {reason}")]
    Decode { path: String, reason: String },
}

impl StatsError {
    /// Path of the backend endpoint involved, when there is one.
    pub fn path(&self) -> Option<&str> {
        match self {
            StatsError::InvalidBaseUrl { .. } => None,
            StatsError::Transport { path, .. }
            | StatsError::Status { path, .. }
            | StatsError::Decode { path, .. } => Some(path),
        }
    }
}

pub type StatsResult<T> = Result<T, StatsError>;
