//! Error types for the Sarvam API client.

use thiserror::Error;

/// Result type alias for Sarvam operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for Sarvam API operations.
#[derive(Error, Debug)]
pub enum Error {
    /// API error returned by Sarvam.
    #[error("sarvam: {message} (status={http_status}, code={code}, request_id={request_id})")]
    Api {
        http_status: u16,
        code: String,
        message: String,
        request_id: String,
    },

    /// HTTP request error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Base64 decoding error.
    #[error("base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The response carried no audio.
    #[error("empty audio payload")]
    EmptyAudio,

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Creates a new API error.
    pub fn api(http_status: u16, message: impl Into<String>) -> Self {
        Error::Api {
            http_status,
            code: String::new(),
            message: message.into(),
            request_id: String::new(),
        }
    }

    /// Returns the HTTP status of an API error.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Error::Api { http_status, .. } => Some(*http_status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns true if this is a rate limit error.
    pub fn is_rate_limit(&self) -> bool {
        self.http_status() == Some(429)
    }

    /// Returns true if this is an invalid API key error.
    pub fn is_invalid_api_key(&self) -> bool {
        matches!(self.http_status(), Some(401) | Some(403))
    }

    /// Returns true if this is a server-side error.
    pub fn is_server_error(&self) -> bool {
        matches!(self.http_status(), Some(s) if s >= 500)
    }

    /// Returns true if the request can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) if e.is_timeout() || e.is_connect() => true,
            _ => self.is_rate_limit() || self.is_server_error(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = Error::Api {
            http_status: 400,
            code: "invalid_request_error".to_string(),
            message: "speaker not supported".to_string(),
            request_id: "req_1".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("speaker not supported"));
        assert!(msg.contains("status=400"));
        assert!(msg.contains("req_1"));
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::api(429, "slow down").is_rate_limit());
        assert!(Error::api(429, "slow down").is_retryable());
        assert!(Error::api(503, "unavailable").is_server_error());
        assert!(Error::api(503, "unavailable").is_retryable());
        assert!(Error::api(403, "forbidden").is_invalid_api_key());
        assert!(!Error::api(400, "bad").is_retryable());
        assert!(!Error::EmptyAudio.is_retryable());
        assert_eq!(Error::Other("x".to_string()).http_status(), None);
    }
}
