//! Script, persona and dialogue item types.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use kahani_sarvam::Language;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ==================== Voice Configuration ====================

/// Voice parameters as written in a script line or a persona.
///
/// Every field is optional so that a persona can override any subset of a
/// line's parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VoiceConfig {
    /// Provider voice id. Also accepted as `voice_model`.
    #[serde(default, alias = "voice_model", skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,

    /// Pitch (-0.75 to 0.75).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f64>,

    /// Pace (0.3 to 1.0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pace: Option<f64>,

    /// Loudness (0.1 to 3.0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loudness: Option<f64>,
}

impl VoiceConfig {
    /// Returns `self` with every field that is set in `over` replaced.
    /// A blank speaker in `over` counts as unset.
    pub fn overlay(&self, over: &VoiceConfig) -> VoiceConfig {
        VoiceConfig {
            speaker: over
                .speaker
                .clone()
                .filter(|s| !s.trim().is_empty())
                .or_else(|| self.speaker.clone()),
            pitch: over.pitch.or(self.pitch),
            pace: over.pace.or(self.pace),
            loudness: over.loudness.or(self.loudness),
        }
    }
}

/// Fully resolved voice parameters sent to the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveVoice {
    pub speaker: String,
    pub pitch: f64,
    pub pace: f64,
    pub loudness: f64,
}

// ==================== Script & Persona ====================

/// One line of dialogue as produced by the script generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueLine {
    pub speaker: String,
    pub text: String,
    #[serde(default)]
    pub voice_config: VoiceConfig,
}

impl DialogueLine {
    /// Creates a line with an empty voice configuration.
    pub fn new(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
            voice_config: VoiceConfig::default(),
        }
    }

    /// Sets the line's voice configuration.
    pub fn with_voice(mut self, voice_config: VoiceConfig) -> Self {
        self.voice_config = voice_config;
        self
    }
}

/// Persona of one character. Only the voice configuration is used here;
/// other persona attributes are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonaEntry {
    #[serde(default)]
    pub voice_config: VoiceConfig,
}

/// Character personas keyed by lowercased speaker id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "HashMap<String, PersonaEntry>", into = "HashMap<String, PersonaEntry>")]
pub struct Persona {
    entries: HashMap<String, PersonaEntry>,
}

impl Persona {
    /// Creates an empty persona map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry; the speaker key is lowercased.
    pub fn insert(&mut self, speaker: &str, entry: PersonaEntry) {
        self.entries.insert(speaker.to_lowercase(), entry);
    }

    /// Looks up a speaker case-insensitively.
    pub fn get(&self, speaker: &str) -> Option<&PersonaEntry> {
        self.entries.get(&speaker.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<HashMap<String, PersonaEntry>> for Persona {
    fn from(map: HashMap<String, PersonaEntry>) -> Self {
        let mut persona = Persona::new();
        for (speaker, entry) in map {
            persona.insert(&speaker, entry);
        }
        persona
    }
}

impl From<Persona> for HashMap<String, PersonaEntry> {
    fn from(persona: Persona) -> Self {
        persona.entries
    }
}

/// Input of one pipeline invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceRequest {
    pub script: Vec<DialogueLine>,
    #[serde(default)]
    pub persona: Persona,
    pub language: Language,
}

// ==================== Request Id ====================

/// Opaque token scoping every file of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RequestId(String);

impl RequestId {
    /// Generates a fresh id of 16 lowercase hex characters.
    pub fn generate() -> Result<Self> {
        let mut bytes = [0u8; 8];
        getrandom::fill(&mut bytes).map_err(|e| Error::Random(e.to_string()))?;
        Ok(Self(hex::encode(bytes)))
    }

    /// Accepts a caller-supplied id made only of `[A-Za-z0-9-]`.
    ///
    /// `_` is reserved for the separators in segment and artifact names, so
    /// no id can be a prefix of another id's segment names.
    pub fn parse(id: &str) -> Result<Self> {
        let valid = !id.is_empty()
            && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !valid {
            return Err(Error::InvalidRequestId(id.to_string()));
        }
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the segment for the line at `index`.
    pub fn segment_file_name(&self, index: usize, ext: &str) -> String {
        format!("{}__{:03}.{}", self.0, index, ext)
    }

    /// Glob matching every segment file of this request and no other.
    pub fn segment_pattern(&self, ext: &str) -> String {
        format!("{}__[0-9][0-9][0-9]*.{}", self.0, ext)
    }

    /// File name of the merged artifact.
    pub fn compiled_file_name(&self, ext: &str) -> String {
        format!("{}_compiled.{}", self.0, ext)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ==================== Dialogue Item ====================

/// A script line annotated for synthesis.
#[derive(Debug, Clone)]
pub struct DialogueItem {
    /// Position in the original script; the only ordering key.
    pub index: usize,
    pub speaker: String,
    pub text: String,
    pub voice: EffectiveVoice,
    pub language: Language,
    pub request_id: RequestId,
    /// Set once a worker has written the segment.
    pub segment_path: Option<PathBuf>,
}
