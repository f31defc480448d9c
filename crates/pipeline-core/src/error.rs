use thiserror::Error;

/// Failure taxonomy for the news/sentiment pipeline.
///
/// The variants matter to callers: `Validation` means the request itself was
/// malformed and retrying is pointless, `UpstreamUnavailable` means a required
/// external capability is not configured, and `Transient` covers network
/// errors, timeouts and non-success statuses where a retry may succeed.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Upstream not configured: {0}")]
    UpstreamUnavailable(String),

    #[error("Upstream request failed: {0}")]
    Transient(String),
}

impl PipelineError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, PipelineError::Transient(_))
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
