//! Script-to-audio pipeline commands.

use clap::{Args, Subcommand};

use kahani_cli::{load_request, output_result, print_success, print_warning};
use kahani_voice::{Janitor, RequestId, SweepMode, VoiceRequest};

use super::{
    create_voice_context, get_context, output_format, output_path, require_input_file,
};
use crate::Cli;

/// Script-to-audio pipeline.
///
/// Request files hold `language`, a `script` list of
/// `{speaker, text, voice_config}` lines and an optional `persona` map whose
/// voice settings override the lines of the matching speaker.
#[derive(Args)]
pub struct VoiceCommand {
    #[command(subcommand)]
    command: VoiceSubcommand,
}

#[derive(Subcommand)]
enum VoiceSubcommand {
    /// Generate one audio file from a script (-f request)
    Generate {
        /// Reuse this request id instead of generating one
        #[arg(long)]
        request_id: Option<String>,
    },
    /// Remove leftover segment files of a request
    Clean {
        /// Request id whose segments should be removed
        #[arg(long)]
        request_id: String,
        /// Only list the files that would be removed
        #[arg(long)]
        dry_run: bool,
    },
}

impl VoiceCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        match &self.command {
            VoiceSubcommand::Generate { request_id } => {
                self.generate(cli, request_id.as_deref()).await
            }
            VoiceSubcommand::Clean {
                request_id,
                dry_run,
            } => self.clean(cli, request_id, *dry_run).await,
        }
    }

    async fn generate(&self, cli: &Cli, request_id: Option<&str>) -> anyhow::Result<()> {
        let input_file = require_input_file(cli)?;
        let req: VoiceRequest = load_request(input_file)?;
        let ctx = get_context(cli)?;
        let voice = create_voice_context(&ctx)?;

        let out = match request_id {
            Some(id) => voice.generate_with_id(&req, RequestId::parse(id)?).await?,
            None => voice.generate(&req).await?,
        };

        if out.summary.failed > 0 {
            print_warning(&format!(
                "{} of {} lines produced no audio",
                out.summary.failed, out.summary.total
            ));
        }
        print_success(&format!("Audio saved to: {}", out.path.display()));

        output_result(&out, output_path(cli), output_format(cli))
    }

    async fn clean(&self, cli: &Cli, request_id: &str, dry_run: bool) -> anyhow::Result<()> {
        let id = RequestId::parse(request_id)?;
        let ctx = get_context(cli)?;
        let config = ctx.pipeline_config()?;

        let mode = if dry_run {
            SweepMode::DryRun
        } else {
            SweepMode::Live
        };
        let report = Janitor::new(&config.temp_dir)
            .sweep(&id.segment_pattern(&config.audio_extension), mode)
            .await;

        for err in &report.errors {
            print_warning(err);
        }
        output_result(&report, output_path(cli), output_format(cli))
    }
}
