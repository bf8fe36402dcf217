//! Single-line speech synthesis commands.

use clap::{Args, Subcommand};
use tracing::debug;

use kahani_cli::{format_bytes, load_request, output_result, print_success};
use kahani_sarvam::{
    Language, TtsRequest, LOUDNESS_RANGE, MODEL_BULBUL_V2, PACE_RANGE, PITCH_RANGE,
    SPEAKERS_BULBUL_V2,
};
use kahani_voice::clamp_pace;

use super::{create_client, get_context, output_format, require_input_file};
use crate::Cli;

/// Single-line speech synthesis.
///
/// Useful for auditioning a voice before using it in a script.
#[derive(Args)]
pub struct TtsCommand {
    #[command(subcommand)]
    command: TtsSubcommand,
}

#[derive(Subcommand)]
enum TtsSubcommand {
    /// Synthesize one line of text (-f request, -o audio file)
    Synthesize,
    /// List voices, languages and parameter ranges
    Voices,
}

impl TtsCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        match &self.command {
            TtsSubcommand::Synthesize => self.synthesize(cli).await,
            TtsSubcommand::Voices => self.voices(cli),
        }
    }

    async fn synthesize(&self, cli: &Cli) -> anyhow::Result<()> {
        let input_file = require_input_file(cli)?;
        let ctx = get_context(cli)?;

        let mut req: TtsRequest = load_request(input_file)?;
        if req.model.is_empty() {
            req.model = ctx
                .get_extra("model")
                .unwrap_or(MODEL_BULBUL_V2)
                .to_string();
        }
        if req.speaker.is_empty() {
            if ctx.default_voice.is_empty() {
                anyhow::bail!("no speaker in request and no default voice in context");
            }
            req.speaker = ctx.default_voice.clone();
        }
        req.pace = req.pace.map(clamp_pace);

        debug!(
            context = %ctx.name,
            model = %req.model,
            speaker = %req.speaker,
            language = %req.language,
            chars = req.text.chars().count(),
            "tts: synthesizing"
        );

        let client = create_client(&ctx)?;
        let resp = client.tts().synthesize(&req).await?;
        let request_id = resp.request_id.clone();
        let audio = resp.into_first_audio()?;

        if let Some(path) = cli.output.as_deref() {
            std::fs::write(path, &audio)?;
            print_success(&format!(
                "Audio saved to: {} ({})",
                path,
                format_bytes(audio.len() as u64)
            ));
        }

        let result = serde_json::json!({
            "audio_size": audio.len(),
            "request_id": request_id,
            "speaker": req.speaker,
            "language": req.language.code(),
            "output_file": cli.output,
        });
        output_result(&result, None, output_format(cli))
    }

    fn voices(&self, cli: &Cli) -> anyhow::Result<()> {
        let languages: Vec<_> = Language::ALL
            .iter()
            .map(|l| serde_json::json!({"name": l.name(), "code": l.code()}))
            .collect();

        let result = serde_json::json!({
            "model": MODEL_BULBUL_V2,
            "speakers": SPEAKERS_BULBUL_V2,
            "languages": languages,
            "ranges": {
                "pitch": [PITCH_RANGE.0, PITCH_RANGE.1],
                "pace": [PACE_RANGE.0, PACE_RANGE.1],
                "loudness": [LOUDNESS_RANGE.0, LOUDNESS_RANGE.1],
            },
        });
        output_result(&result, None, output_format(cli))
    }
}
