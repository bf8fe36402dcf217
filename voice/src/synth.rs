//! Text-to-speech provider interface.

use async_trait::async_trait;
use kahani_sarvam::{Client, Language, TtsRequest, MODEL_BULBUL_V2};

use crate::script::EffectiveVoice;

/// Error returned by a [`Synthesizer`] for one line.
#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("provider returned no audio")]
    EmptyAudio,
    #[error("{0}")]
    Provider(String),
}

/// Interface for a text-to-speech provider.
///
/// Implementations are shared by every worker of a pool and must be safe for
/// concurrent use.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesizes one line and returns the encoded audio.
    async fn synthesize(
        &self,
        text: &str,
        language: Language,
        voice: &EffectiveVoice,
    ) -> Result<Vec<u8>, SynthesisError>;
}

/// [`Synthesizer`] backed by the Sarvam text-to-speech API.
#[derive(Clone)]
pub struct SarvamSynthesizer {
    client: Client,
    model: String,
}

impl SarvamSynthesizer {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            model: MODEL_BULBUL_V2.to_string(),
        }
    }

    /// Overrides the synthesis model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait]
impl Synthesizer for SarvamSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        language: Language,
        voice: &EffectiveVoice,
    ) -> Result<Vec<u8>, SynthesisError> {
        let req = TtsRequest {
            model: self.model.clone(),
            pitch: Some(voice.pitch),
            pace: Some(voice.pace),
            loudness: Some(voice.loudness),
            ..TtsRequest::new(text, language, voice.speaker.as_str())
        };

        let resp = self
            .client
            .tts()
            .synthesize(&req)
            .await
            .map_err(|e| SynthesisError::Provider(e.to_string()))?;

        resp.into_first_audio().map_err(|e| match e {
            kahani_sarvam::Error::EmptyAudio => SynthesisError::EmptyAudio,
            other => SynthesisError::Provider(other.to_string()),
        })
    }
}
