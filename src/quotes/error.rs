//! Producer error types.
//!
//! These never escape a producer; they exist so the failure path can be
//! logged precisely before falling back to estimates.

use std::fmt;

/// Errors from fetching live quotes upstream.
#[derive(Debug)]
pub enum ProducerError {
    /// HTTP request failed (network error, connect timeout, etc.)
    Http(reqwest::Error),

    /// The hard per-producer deadline elapsed
    Timeout,

    /// Upstream returned an error status
    Upstream { status: u16, message: String },

    /// Upstream refused the request (anti-automation block)
    Blocked,

    /// Response body could not be decoded
    Json {
        message: String,
        body: Option<String>,
    },

    /// Producer has no upstream configured
    NotConfigured,
}

impl fmt::Display for ProducerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProducerError::Http(e) => write!(f, "HTTP error: {e}"),
            ProducerError::Timeout => write!(f, "upstream timed out"),
            ProducerError::Upstream { status, message } => {
                write!(f, "upstream error {status}: {message}")
            }
            ProducerError::Blocked => write!(f, "blocked by upstream"),
            ProducerError::Json { message, body } => {
                write!(f, "JSON parse error: {message}")?;
                if let Some(body) = body {
                    write!(f, " (body: {body})")?;
                }
                Ok(())
            }
            ProducerError::NotConfigured => write!(f, "no upstream configured"),
        }
    }
}

impl std::error::Error for ProducerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProducerError::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ProducerError {
    fn from(err: reqwest::Error) -> Self {
        ProducerError::Http(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(ProducerError::Timeout.to_string(), "upstream timed out");
        assert_eq!(
            ProducerError::Upstream {
                status: 503,
                message: "unavailable".into()
            }
            .to_string(),
            "upstream error 503: unavailable"
        );

        let err = ProducerError::Json {
            message: "expected array".into(),
            body: Some("{}".into()),
        };
        assert!(err.to_string().contains("JSON parse error"));
        assert!(err.to_string().contains("{}"));
    }
}
