use reqwest::StatusCode;

pub type MirrorResult<T> = Result<T, MirrorError>;

/// Errors surfaced by the mirror. Cache I/O problems are deliberately not
/// represented: the cache degrades and logs instead of failing callers.
#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    /// Connectivity failure or a body that failed to decode.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response status: {0}")]
    UnexpectedStatus(StatusCode),

    /// A cache-only read for data that was never mirrored.
    #[error("archive is not cached: {0}")]
    NotCached(String),

    #[error("game not found ({user} - {id})")]
    GameNotFound { user: String, id: String },

    #[error("mock response not configured for: {0}")]
    NotConfigured(String),
}
