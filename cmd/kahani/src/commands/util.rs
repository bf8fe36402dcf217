//! Utility functions for CLI commands.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use kahani_cli::config::API_KEY_ENV;
use kahani_cli::{load_config, Config, Context, OutputFormat};
use kahani_sarvam::Client;
use kahani_voice::{SarvamSynthesizer, VoiceContext};

use crate::Cli;

const APP_NAME: &str = "kahani";

/// Gets the global configuration.
pub fn get_config(cli: &Cli) -> anyhow::Result<Config> {
    load_config(APP_NAME, cli.config.as_deref())
}

/// Gets the context to use.
///
/// Without `-c` and without a current context an empty context is returned,
/// so that the API key can still come from the environment.
pub fn get_context(cli: &Cli) -> anyhow::Result<Context> {
    let cfg = get_config(cli)?;

    match (cfg.resolve_context(cli.context.as_deref()), cli.context.as_deref()) {
        (Some(ctx), _) => Ok(ctx.clone()),
        (None, Some(name)) => anyhow::bail!("context '{}' not found", name),
        (None, None) => Ok(Context::default()),
    }
}

/// Requires the input file to be provided.
pub fn require_input_file(cli: &Cli) -> anyhow::Result<&str> {
    cli.input
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("input file is required, use -f flag"))
}

/// Output format selected by the global flags.
pub fn output_format(cli: &Cli) -> OutputFormat {
    OutputFormat::from_flag(cli.json)
}

/// Output path selected by `-o`, if any.
pub fn output_path(cli: &Cli) -> Option<&Path> {
    cli.output.as_deref().map(Path::new)
}

/// Creates a Sarvam API client from context configuration.
pub fn create_client(ctx: &Context) -> anyhow::Result<Client> {
    let api_key = ctx.resolve_api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "no API key: add a context with 'kahani config add-context' or set {}",
            API_KEY_ENV
        )
    })?;

    let mut builder = Client::builder(api_key);
    if !ctx.base_url.is_empty() {
        builder = builder.base_url(ctx.base_url.as_str());
    }
    if ctx.timeout > 0 {
        builder = builder.timeout(Duration::from_secs(ctx.timeout));
    }
    if ctx.max_retries > 0 {
        builder = builder.max_retries(u32::try_from(ctx.max_retries).unwrap_or(u32::MAX));
    }

    Ok(builder.build()?)
}

/// Creates a pipeline context backed by the Sarvam API.
pub fn create_voice_context(ctx: &Context) -> anyhow::Result<VoiceContext> {
    let client = create_client(ctx)?;
    let mut synthesizer = SarvamSynthesizer::new(client);
    if let Some(model) = ctx.get_extra("model") {
        synthesizer = synthesizer.with_model(model);
    }
    let config = ctx.pipeline_config()?;

    Ok(VoiceContext::from_config(Arc::new(synthesizer), config)?)
}
