//! Text-to-speech service.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};

use super::{
    error::{Error, Result},
    http::HttpClient,
    models::MODEL_BULBUL_V2,
    types::Language,
};

/// Text-to-speech service.
pub struct TtsService {
    http: Arc<HttpClient>,
}

impl TtsService {
    pub(crate) fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// Performs synchronous speech synthesis.
    ///
    /// The returned audio buffers are decoded from base64. The speaker name is
    /// lowercased before sending, and an empty model falls back to
    /// [`MODEL_BULBUL_V2`].
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # use kahani_sarvam::{Client, Language, TtsRequest};
    /// # async fn run(client: Client) -> kahani_sarvam::Result<()> {
    /// let req = TtsRequest {
    ///     pace: Some(0.9),
    ///     ..TtsRequest::new("It was a stormy night.", Language::English, "Karun")
    /// };
    /// let resp = client.tts().synthesize(&req).await?;
    /// let wav = resp.into_first_audio()?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn synthesize(&self, request: &TtsRequest) -> Result<TtsResponse> {
        let speaker = request.speaker.to_lowercase();
        let body = TtsApiRequest {
            model: if request.model.is_empty() {
                MODEL_BULBUL_V2
            } else {
                request.model.as_str()
            },
            text: &request.text,
            target_language_code: request.language.code(),
            speaker: &speaker,
            pitch: request.pitch,
            pace: request.pace,
            loudness: request.loudness,
            speech_sample_rate: request.speech_sample_rate,
            enable_preprocessing: request.enable_preprocessing,
        };

        let api_resp: TtsApiResponse = self.http.post("/text-to-speech", &body).await?;

        let mut audios = Vec::with_capacity(api_resp.audios.len());
        for encoded in &api_resp.audios {
            if encoded.is_empty() {
                continue;
            }
            audios.push(BASE64.decode(encoded)?);
        }

        Ok(TtsResponse {
            request_id: api_resp.request_id,
            audios,
        })
    }
}

// ==================== Request/Response Types ====================

/// Request for speech synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsRequest {
    /// Model version; empty means [`MODEL_BULBUL_V2`].
    #[serde(default)]
    pub model: String,

    /// Text to synthesize.
    pub text: String,

    /// Target language.
    pub language: Language,

    /// Speaker voice id.
    #[serde(default)]
    pub speaker: String,

    /// Pitch adjustment (-0.75 to 0.75).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f64>,

    /// Speech pace (0.3 to 1.0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pace: Option<f64>,

    /// Loudness (0.1 to 3.0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loudness: Option<f64>,

    /// Output sample rate in Hz.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speech_sample_rate: Option<u32>,

    /// Normalizes numbers and mixed-language text before synthesis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_preprocessing: Option<bool>,
}

impl TtsRequest {
    /// Creates a request with provider defaults for all voice parameters.
    pub fn new(text: impl Into<String>, language: Language, speaker: impl Into<String>) -> Self {
        Self {
            model: String::new(),
            text: text.into(),
            language,
            speaker: speaker.into(),
            pitch: None,
            pace: None,
            loudness: None,
            speech_sample_rate: None,
            enable_preprocessing: None,
        }
    }
}

/// Response from speech synthesis.
#[derive(Debug, Clone, Default)]
pub struct TtsResponse {
    /// Request id assigned by the provider.
    pub request_id: Option<String>,

    /// Decoded audio buffers, one per input text; empty entries are dropped.
    pub audios: Vec<Vec<u8>>,
}

impl TtsResponse {
    /// Returns the first audio buffer, if any.
    pub fn first_audio(&self) -> Option<&[u8]> {
        self.audios.first().map(|a| a.as_slice())
    }

    /// Consumes the response and returns the first non-empty audio buffer.
    pub fn into_first_audio(self) -> Result<Vec<u8>> {
        self.audios
            .into_iter()
            .find(|a| !a.is_empty())
            .ok_or(Error::EmptyAudio)
    }
}

// ==================== Internal Types ====================

#[derive(Serialize)]
struct TtsApiRequest<'a> {
    model: &'a str,
    text: &'a str,
    target_language_code: &'a str,
    speaker: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pitch: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pace: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    loudness: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speech_sample_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    enable_preprocessing: Option<bool>,
}

#[derive(Deserialize)]
struct TtsApiResponse {
    #[serde(default)]
    request_id: Option<String>,
    #[serde(default)]
    audios: Vec<String>,
}
