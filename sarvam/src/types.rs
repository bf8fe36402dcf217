//! Common types for the Sarvam API.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ==================== Language ====================

/// Target language for speech synthesis.
///
/// Serialized by name (`"hindi"`); parsing also accepts the BCP-47 code
/// (`"hi-IN"`), case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    English,
    Hindi,
    Bengali,
    Kannada,
    Malayalam,
    Marathi,
    Odia,
    Punjabi,
    Tamil,
    Telugu,
    Gujarati,
}

impl Language {
    /// All supported languages.
    pub const ALL: [Language; 11] = [
        Language::English,
        Language::Hindi,
        Language::Bengali,
        Language::Kannada,
        Language::Malayalam,
        Language::Marathi,
        Language::Odia,
        Language::Punjabi,
        Language::Tamil,
        Language::Telugu,
        Language::Gujarati,
    ];

    /// Returns the language code sent as `target_language_code`.
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en-IN",
            Language::Hindi => "hi-IN",
            Language::Bengali => "bn-IN",
            Language::Kannada => "kn-IN",
            Language::Malayalam => "ml-IN",
            Language::Marathi => "mr-IN",
            Language::Odia => "od-IN",
            Language::Punjabi => "pa-IN",
            Language::Tamil => "ta-IN",
            Language::Telugu => "te-IN",
            Language::Gujarati => "gu-IN",
        }
    }

    /// Returns the lowercase language name.
    pub fn name(&self) -> &'static str {
        match self {
            Language::English => "english",
            Language::Hindi => "hindi",
            Language::Bengali => "bengali",
            Language::Kannada => "kannada",
            Language::Malayalam => "malayalam",
            Language::Marathi => "marathi",
            Language::Odia => "odia",
            Language::Punjabi => "punjabi",
            Language::Tamil => "tamil",
            Language::Telugu => "telugu",
            Language::Gujarati => "gujarati",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unsupported language.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown language: {0:?}")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Language::ALL
            .into_iter()
            .find(|lang| {
                lang.name().eq_ignore_ascii_case(needle) || lang.code().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| UnknownLanguage(s.to_string()))
    }
}

impl Serialize for Language {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Language {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
