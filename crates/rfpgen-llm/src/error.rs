use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("rate limited")]
    RateLimited,

    #[error("service temporarily unavailable (status {status})")]
    Transient { status: u16 },

    #[error("request rejected (status {status})")]
    Permanent { status: u16 },

    #[error("empty response from {provider}")]
    EmptyResponse { provider: &'static str },

    #[error("embedding not supported by {provider}")]
    EmbedUnsupported { provider: &'static str },

    #[error("{0}")]
    Other(String),
}

impl LlmError {
    /// Whether a retry has a reasonable chance of succeeding.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::RateLimited | Self::Transient { .. } => true,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, LlmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(LlmError::RateLimited.is_transient());
        assert!(LlmError::Timeout(Duration::from_secs(5)).is_transient());
        assert!(LlmError::Transient { status: 503 }.is_transient());
        assert!(!LlmError::Permanent { status: 401 }.is_transient());
        assert!(!LlmError::EmptyResponse { provider: "openai" }.is_transient());
        assert!(!LlmError::Other("boom".into()).is_transient());
    }

    #[test]
    fn timeout_display_uses_seconds() {
        let err = LlmError::Timeout(Duration::from_secs(120));
        assert_eq!(err.to_string(), "request timed out after 120s");
    }
}
