//! Error types for the abstraction engine.

use thiserror::Error;

/// Main error type for abstraction sessions.
#[derive(Error, Debug)]
pub enum AbstractionError {
    #[error("Mapping collision for {placeholder} in scope {scope}")]
    MappingCollision { placeholder: String, scope: usize },

    #[error("Remote transport error: {0}")]
    RemoteTransport(String),

    #[error("Remote protocol error: {0}")]
    RemoteProtocol(String),

    #[error("Remote service rejected credentials (HTTP {0})")]
    AuthRejected(u16),

    #[error("Remote quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Token budget exceeded: estimated {estimated} tokens, budget {budget}")]
    BudgetExceeded { estimated: usize, budget: usize },

    #[error("Boundary violation: response contains {0} not present in the request")]
    BoundaryViolation(String),

    #[error("Remote analysis timed out after {0} seconds")]
    Timeout(u64),

    #[error("Session cancelled")]
    Cancelled,

    #[error("Session mismatch: document belongs to {found}, store belongs to {expected}")]
    SessionMismatch { expected: String, found: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid secret pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

impl AbstractionError {
    /// Whether the remote call that produced this error may be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            AbstractionError::RemoteTransport(_) => true,
            AbstractionError::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.is_request()
                    || e.status().is_some_and(|s| s.is_server_error())
            }
            _ => false,
        }
    }
}

/// Result type alias for abstraction operations.
pub type Result<T> = std::result::Result<T, AbstractionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(AbstractionError::RemoteTransport("reset".into()).is_retryable());
        assert!(!AbstractionError::RemoteProtocol("bad json".into()).is_retryable());
        assert!(!AbstractionError::AuthRejected(401).is_retryable());
        assert!(!AbstractionError::QuotaExceeded("daily".into()).is_retryable());
        assert!(!AbstractionError::Cancelled.is_retryable());
    }

    #[test]
    fn test_budget_message() {
        let err = AbstractionError::BudgetExceeded {
            estimated: 120,
            budget: 100,
        };
        assert_eq!(
            err.to_string(),
            "Token budget exceeded: estimated 120 tokens, budget 100"
        );
    }
}
