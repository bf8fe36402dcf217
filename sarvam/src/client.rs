//! Sarvam API client.

use std::sync::Arc;
use std::time::Duration;

use super::{
    error::{Error, Result},
    http::HttpClient,
    tts::TtsService,
};

/// Default Sarvam API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.sarvam.ai";

/// Default maximum number of retries.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Sarvam API client.
///
/// Cloning is cheap; clones share one connection pool.
///
/// # Example
///
/// ```rust,no_run
/// use kahani_sarvam::{Client, Language, TtsRequest};
///
/// # async fn run() -> kahani_sarvam::Result<()> {
/// let client = Client::new("your-api-key")?;
/// let req = TtsRequest::new("नमस्ते", Language::Hindi, "anushka");
/// let resp = client.tts().synthesize(&req).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    http: Arc<HttpClient>,
    config: ClientConfig,
}

#[derive(Clone)]
struct ClientConfig {
    api_key: String,
    base_url: String,
}

impl Client {
    /// Creates a new Sarvam API client with default settings.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        ClientBuilder::new(api_key).build()
    }

    /// Creates a new client builder for more configuration options.
    pub fn builder(api_key: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(api_key)
    }

    /// Returns the configured API key.
    pub fn api_key(&self) -> &str {
        &self.config.api_key
    }

    /// Returns the configured base URL.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Returns the text-to-speech service.
    pub fn tts(&self) -> TtsService {
        TtsService::new(self.http.clone())
    }
}

/// Builder for creating a Sarvam API client.
pub struct ClientBuilder {
    api_key: String,
    base_url: String,
    timeout: Duration,
    max_retries: u32,
    retry_backoff: Duration,
}

impl ClientBuilder {
    /// Creates a new client builder.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff: Duration::from_secs(1),
        }
    }

    /// Sets a custom base URL for the API.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the maximum number of retries for transient errors.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Sets the first retry delay; later retries double it.
    pub fn retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Builds the client.
    pub fn build(self) -> Result<Client> {
        if self.api_key.is_empty() {
            return Err(Error::Config("api_key must be non-empty".to_string()));
        }
        let base_url = self.base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(Error::Config("base_url must be non-empty".to_string()));
        }

        let http = HttpClient::new(
            base_url.clone(),
            self.api_key.clone(),
            self.timeout,
            self.max_retries,
            self.retry_backoff,
        )?;

        Ok(Client {
            http: Arc::new(http),
            config: ClientConfig {
                api_key: self.api_key,
                base_url,
            },
        })
    }
}
