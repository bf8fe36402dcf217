//! Per-line voice parameter resolution.

use kahani_sarvam::{Language, DEFAULT_LOUDNESS, DEFAULT_PACE, DEFAULT_PITCH, PACE_RANGE};

use crate::error::{Error, Result};
use crate::script::{DialogueItem, DialogueLine, EffectiveVoice, Persona, RequestId, VoiceConfig};

/// Clamps pace to the provider's upper bound. Lower values pass through.
pub fn clamp_pace(pace: f64) -> f64 {
    pace.min(PACE_RANGE.1)
}

/// Resolves the voice for one line.
///
/// The persona entry for the line's speaker, if any, overrides the line's
/// own parameters field by field. A missing voice id falls back to
/// `default_speaker`.
pub fn resolve_voice(
    index: usize,
    line: &DialogueLine,
    persona: &Persona,
    default_speaker: Option<&str>,
) -> Result<EffectiveVoice> {
    let merged = match persona.get(&line.speaker) {
        Some(entry) => line.voice_config.overlay(&entry.voice_config),
        None => line.voice_config.clone(),
    };
    effective_voice(index, &merged, default_speaker)
}

fn effective_voice(
    index: usize,
    cfg: &VoiceConfig,
    default_speaker: Option<&str>,
) -> Result<EffectiveVoice> {
    let speaker = cfg
        .speaker
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or(default_speaker.filter(|s| !s.is_empty()))
        .ok_or_else(|| Error::validation(index, "no voice id for speaker and no default voice"))?;

    let pitch = finite(index, "pitch", cfg.pitch.unwrap_or(DEFAULT_PITCH))?;
    let pace = finite(index, "pace", cfg.pace.unwrap_or(DEFAULT_PACE))?;
    let loudness = finite(index, "loudness", cfg.loudness.unwrap_or(DEFAULT_LOUDNESS))?;

    Ok(EffectiveVoice {
        speaker: speaker.to_string(),
        pitch,
        pace: clamp_pace(pace),
        loudness,
    })
}

fn finite(index: usize, field: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Error::validation(index, format!("{field} is not a finite number")))
    }
}

/// Annotates every script line for synthesis.
///
/// Items keep script order; `index` equals the line's position. An empty
/// script is rejected.
pub fn resolve_script(
    lines: &[DialogueLine],
    persona: &Persona,
    language: Language,
    request_id: &RequestId,
    default_speaker: Option<&str>,
) -> Result<Vec<DialogueItem>> {
    if lines.is_empty() {
        return Err(Error::EmptyScript);
    }
    lines
        .iter()
        .enumerate()
        .map(|(index, line)| {
            if line.text.trim().is_empty() {
                return Err(Error::validation(index, "text is empty"));
            }
            let voice = resolve_voice(index, line, persona, default_speaker)?;
            Ok(DialogueItem {
                index,
                speaker: line.speaker.clone(),
                text: line.text.clone(),
                voice,
                language,
                request_id: request_id.clone(),
                segment_path: None,
            })
        })
        .collect()
}
