use thiserror::Error;

/// Failure of a single collaborator call.
///
/// Always recovered locally by the stage that made the call; never surfaced to
/// the caller of [`crate::PipelineOrchestrator::run`].
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{stage} timed out after {after_ms}ms")]
    Timeout { stage: &'static str, after_ms: u128 },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("provider API error: {0}")]
    Api(String),

    #[error("empty response from {0}")]
    EmptyResponse(&'static str),

    #[error("unsupported sentiment class: {0}")]
    UnsupportedLabel(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProviderError {
    /// Transient failures worth another attempt after a back-off delay.
    ///
    /// Network timeouts, connect failures, 5xx and 429 responses are retried.
    /// Everything else is a hard failure: retrying won't change the answer.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            ProviderError::Http(e) => {
                e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
            }
            ProviderError::UnexpectedStatus { status, .. } => *status == 429 || *status >= 500,
            ProviderError::Timeout { .. }
            | ProviderError::Deserialize { .. }
            | ProviderError::Xml(_)
            | ProviderError::Api(_)
            | ProviderError::EmptyResponse(_)
            | ProviderError::UnsupportedLabel(_)
            | ProviderError::Io(_) => false,
        }
    }
}

/// Request-level failure: the only error a caller of the orchestrator sees.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("company name must not be empty")]
    EmptyCompanyName,

    #[error("internal pipeline fault: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deserialize_err() -> ProviderError {
        let src = serde_json::from_str::<()>("invalid").unwrap_err();
        ProviderError::Deserialize {
            context: "test".to_owned(),
            source: src,
        }
    }

    #[test]
    fn server_errors_and_rate_limits_are_retriable() {
        let err = ProviderError::UnexpectedStatus {
            status: 503,
            url: "https://example.com".to_owned(),
        };
        assert!(err.is_retriable());
        let err = ProviderError::UnexpectedStatus {
            status: 429,
            url: "https://example.com".to_owned(),
        };
        assert!(err.is_retriable());
    }

    #[test]
    fn client_errors_are_not_retriable() {
        let err = ProviderError::UnexpectedStatus {
            status: 404,
            url: "https://example.com".to_owned(),
        };
        assert!(!err.is_retriable());
    }

    #[test]
    fn decode_and_api_errors_are_not_retriable() {
        assert!(!deserialize_err().is_retriable());
        assert!(!ProviderError::Api("bad key".to_owned()).is_retriable());
        assert!(!ProviderError::EmptyResponse("summarizer").is_retriable());
    }

    #[test]
    fn timeout_display_names_stage() {
        let err = ProviderError::Timeout {
            stage: "discovery",
            after_ms: 1500,
        };
        assert_eq!(err.to_string(), "discovery timed out after 1500ms");
    }
}
