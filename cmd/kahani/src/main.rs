//! Kahani CLI - turns dialogue scripts into narrated audio.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{ConfigCommand, ServeCommand, TtsCommand, VoiceCommand};

/// Kahani CLI - turns dialogue scripts into narrated audio.
///
/// Every line of a script is synthesized with the Sarvam text-to-speech API
/// in parallel, and the clips are stitched together with ffmpeg in script
/// order.
///
/// Configuration is stored in ~/.kahani/kahani/ and supports multiple contexts,
/// similar to kubectl's context management.
#[derive(Parser)]
#[command(name = "kahani")]
#[command(about = "Script-to-audio voice pipeline")]
#[command(version)]
pub struct Cli {
    /// Config file (default is ~/.kahani/kahani/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Context name to use
    #[arg(short = 'c', long, global = true)]
    pub context: Option<String>,

    /// Output file (default: stdout)
    #[arg(short = 'o', long, global = true)]
    pub output: Option<String>,

    /// Input request file (YAML or JSON, '-' for stdin)
    #[arg(short = 'f', long = "file", global = true)]
    pub input: Option<String>,

    /// Output as JSON (for piping)
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage CLI configuration
    Config(ConfigCommand),
    /// Single-line speech synthesis
    Tts(TtsCommand),
    /// Script-to-audio pipeline
    Voice(VoiceCommand),
    /// Run the HTTP service
    Serve(ServeCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Config(cmd) => cmd.run(&cli).await,
        Commands::Tts(cmd) => cmd.run(&cli).await,
        Commands::Voice(cmd) => cmd.run(&cli).await,
        Commands::Serve(cmd) => cmd.run(&cli).await,
    }
}
