//! HTTP client implementation for the Sarvam API.

use std::time::Duration;

use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT},
    Client as ReqwestClient, Response,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use super::error::{Error, Result};

const API_KEY_HEADER: &str = "api-subscription-key";

/// HTTP client for the Sarvam API.
///
/// Wraps one pooled `reqwest` client; safe to share across tasks.
pub struct HttpClient {
    client: ReqwestClient,
    base_url: String,
    headers: HeaderMap,
    max_retries: u32,
    retry_backoff: Duration,
}

impl HttpClient {
    /// Creates a new HTTP client.
    pub fn new(
        base_url: String,
        api_key: String,
        timeout: Duration,
        max_retries: u32,
        retry_backoff: Duration,
    ) -> Result<Self> {
        let client = ReqwestClient::builder().timeout(timeout).build()?;

        let mut headers = HeaderMap::new();
        headers.insert(
            API_KEY_HEADER,
            HeaderValue::from_str(&api_key).map_err(|e| Error::Config(e.to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("kahani-sarvam-rust/1.0"));

        Ok(Self {
            client,
            base_url,
            headers,
            max_retries,
            retry_backoff,
        })
    }

    /// Makes a JSON POST request with retry support.
    pub async fn post<T, R>(&self, path: &str, body: &T) -> Result<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                tokio::time::sleep(backoff_delay(self.retry_backoff, attempt)).await;
            }

            match self.do_post(path, body).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if e.is_retryable() {
                        debug!(path, attempt, error = %e, "sarvam: retryable error");
                        last_err = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| Error::Other("max retries exceeded".to_string())))
    }

    /// Performs a single HTTP request.
    async fn do_post<T, R>(&self, path: &str, body: &T) -> Result<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .post(&url)
            .headers(self.headers.clone())
            .json(body)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Handles the API response.
    async fn handle_response<R>(&self, response: Response) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(parse_error(&body, status.as_u16()));
        }

        serde_json::from_slice(&body).map_err(Error::from)
    }
}

/// Error envelope returned by the API.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: String,
    #[serde(default)]
    request_id: Option<String>,
}

/// Parses an error response body.
fn parse_error(body: &[u8], http_status: u16) -> Error {
    if let Ok(envelope) = serde_json::from_slice::<ErrorEnvelope>(body) {
        return Error::Api {
            http_status,
            code: envelope.error.code,
            message: envelope.error.message,
            request_id: envelope.error.request_id.unwrap_or_default(),
        };
    }

    Error::api(http_status, String::from_utf8_lossy(body).to_string())
}

const MAX_BACKOFF_DOUBLINGS: u32 = 16;

/// Exponential backoff before retry `attempt` (1-based): base, 2*base,
/// 4*base, ... The doubling stops at [`MAX_BACKOFF_DOUBLINGS`] and the
/// product saturates.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let doublings = attempt.saturating_sub(1).min(MAX_BACKOFF_DOUBLINGS);
    base.saturating_mul(1 << doublings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_envelope() {
        let body = br#"{"error":{"message":"Invalid API key","code":"invalid_api_key_error","request_id":"20250101_abc"}}"#;
        match parse_error(body, 403) {
            Error::Api {
                http_status,
                code,
                message,
                request_id,
            } => {
                assert_eq!(http_status, 403);
                assert_eq!(code, "invalid_api_key_error");
                assert_eq!(message, "Invalid API key");
                assert_eq!(request_id, "20250101_abc");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_backoff_delay() {
        let base = Duration::from_millis(500);
        assert_eq!(backoff_delay(base, 1), base);
        assert_eq!(backoff_delay(base, 2), Duration::from_secs(1));
        assert_eq!(backoff_delay(base, 4), Duration::from_secs(4));

        let capped = base * (1 << MAX_BACKOFF_DOUBLINGS);
        assert_eq!(backoff_delay(base, 17), capped);
        assert_eq!(backoff_delay(base, 40), capped);
        assert_eq!(backoff_delay(base, u32::MAX), capped);
        assert_eq!(backoff_delay(Duration::MAX, 3), Duration::MAX);
    }

    #[test]
    fn test_parse_error_plain_text() {
        let err = parse_error(b"Bad Gateway", 502);
        assert!(err.is_server_error());
        assert!(err.to_string().contains("Bad Gateway"));
    }

    #[test]
    fn test_rejects_invalid_api_key_header() {
        let result = HttpClient::new(
            "http://localhost".to_string(),
            "bad\nkey".to_string(),
            Duration::from_secs(1),
            0,
            Duration::ZERO,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
