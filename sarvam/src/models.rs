//! Model constants and predefined values for the Sarvam API.

// ==================== Speech Models ====================

/// bulbul:v2, multi-speaker Indic text-to-speech.
pub const MODEL_BULBUL_V2: &str = "bulbul:v2";

// ==================== Speakers ====================

pub const SPEAKER_ANUSHKA: &str = "anushka";
pub const SPEAKER_ABHILASH: &str = "abhilash";
pub const SPEAKER_MANISHA: &str = "manisha";
pub const SPEAKER_VIDYA: &str = "vidya";
pub const SPEAKER_ARYA: &str = "arya";
pub const SPEAKER_KARUN: &str = "karun";
pub const SPEAKER_HITESH: &str = "hitesh";

/// Speakers available on [`MODEL_BULBUL_V2`].
pub const SPEAKERS_BULBUL_V2: &[&str] = &[
    SPEAKER_ANUSHKA,
    SPEAKER_ABHILASH,
    SPEAKER_MANISHA,
    SPEAKER_VIDYA,
    SPEAKER_ARYA,
    SPEAKER_KARUN,
    SPEAKER_HITESH,
];

// ==================== Voice Parameter Ranges ====================

/// Pitch range accepted by bulbul models.
pub const PITCH_RANGE: (f64, f64) = (-0.75, 0.75);

/// Pace range accepted by bulbul models.
pub const PACE_RANGE: (f64, f64) = (0.3, 1.0);

/// Loudness range accepted by bulbul models.
pub const LOUDNESS_RANGE: (f64, f64) = (0.1, 3.0);

pub const DEFAULT_PITCH: f64 = 0.0;
pub const DEFAULT_PACE: f64 = 0.9;
pub const DEFAULT_LOUDNESS: f64 = 1.0;
