//! Configuration management commands.

use clap::{Args, Subcommand};

use kahani_cli::{mask_api_key, print_success, Context as CliContext};

use super::get_config;
use crate::Cli;

/// Manage CLI configuration.
///
/// Contexts allow you to manage multiple API configurations,
/// similar to kubectl's context management.
///
/// Configuration is stored in ~/.kahani/kahani/config.yaml
#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Subcommand)]
enum ConfigSubcommand {
    /// Add a new context
    #[command(name = "add-context")]
    AddContext {
        /// Context name
        name: String,
        /// API subscription key (falls back to SARVAM_API_KEY when omitted)
        #[arg(long)]
        api_key: Option<String>,
        /// API base URL
        #[arg(long)]
        base_url: Option<String>,
        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
        /// Maximum retries
        #[arg(long)]
        max_retries: Option<u64>,
        /// Default voice id
        #[arg(long)]
        default_voice: Option<String>,
        /// Pipeline setting, e.g. --set workers=8 (repeatable)
        #[arg(long = "set", value_name = "KEY=VALUE")]
        settings: Vec<String>,
    },
    /// Delete a context
    #[command(name = "delete-context")]
    DeleteContext {
        /// Context name
        name: String,
    },
    /// Set the current context
    #[command(name = "use-context")]
    UseContext {
        /// Context name
        name: String,
    },
    /// Display the current context
    #[command(name = "get-context")]
    GetContext,
    /// List all contexts
    #[command(name = "list-contexts", alias = "get-contexts")]
    ListContexts,
    /// View the current configuration
    View,
}

impl ConfigCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        match &self.command {
            ConfigSubcommand::AddContext {
                name,
                api_key,
                base_url,
                timeout,
                max_retries,
                default_voice,
                settings,
            } => {
                let mut cfg = get_config(cli)?;

                let mut ctx = CliContext {
                    api_key: api_key.clone().unwrap_or_default(),
                    base_url: base_url.clone().unwrap_or_default(),
                    timeout: timeout.unwrap_or(0),
                    max_retries: max_retries.unwrap_or(0),
                    default_voice: default_voice.clone().unwrap_or_default(),
                    ..Default::default()
                };
                for setting in settings {
                    let (key, value) = setting
                        .split_once('=')
                        .ok_or_else(|| anyhow::anyhow!("expected KEY=VALUE, got '{}'", setting))?;
                    ctx.set_extra(key.trim(), value.trim());
                }
                // Reject malformed pipeline settings before saving them.
                ctx.pipeline_config()?;

                cfg.add_context(name, ctx)?;
                print_success(&format!("Context \"{}\" added successfully", name));
                Ok(())
            }

            ConfigSubcommand::DeleteContext { name } => {
                let mut cfg = get_config(cli)?;
                cfg.delete_context(name)?;
                print_success(&format!("Context \"{}\" deleted", name));
                Ok(())
            }

            ConfigSubcommand::UseContext { name } => {
                let mut cfg = get_config(cli)?;
                cfg.use_context(name)?;
                print_success(&format!("Switched to context \"{}\"", name));
                Ok(())
            }

            ConfigSubcommand::GetContext => {
                let cfg = get_config(cli)?;
                if cfg.current_context.is_empty() {
                    println!("No current context set");
                } else {
                    println!("{}", cfg.current_context);
                }
                Ok(())
            }

            ConfigSubcommand::ListContexts => {
                let cfg = get_config(cli)?;

                if cfg.contexts.is_empty() {
                    println!("No contexts configured");
                    return Ok(());
                }

                println!("{:<8} {:<20} {:<30} {}", "CURRENT", "NAME", "BASE_URL", "DEFAULT_VOICE");
                for (name, ctx) in cfg.list_contexts().into_iter().filter_map(|n| {
                    cfg.contexts.get(n).map(|c| (n, c))
                }) {
                    let current = if name == cfg.current_context { "*" } else { "" };
                    let base_url = if ctx.base_url.is_empty() {
                        "(default)"
                    } else {
                        &ctx.base_url
                    };
                    println!("{:<8} {:<20} {:<30} {}", current, name, base_url, ctx.default_voice);
                }
                Ok(())
            }

            ConfigSubcommand::View => {
                let cfg = get_config(cli)?;

                println!("Config file: {}", cfg.path().display());
                println!("Current context: {}", cfg.current_context);
                println!("Contexts: {}", cfg.contexts.len());

                for name in cfg.list_contexts() {
                    let Some(ctx) = cfg.contexts.get(name) else { continue };
                    println!("\n  {}:", name);
                    if ctx.api_key.is_empty() {
                        println!("    API Key: (from environment)");
                    } else {
                        println!("    API Key: {}", mask_api_key(&ctx.api_key));
                    }
                    if !ctx.base_url.is_empty() {
                        println!("    Base URL: {}", ctx.base_url);
                    }
                    if ctx.timeout > 0 {
                        println!("    Timeout: {}s", ctx.timeout);
                    }
                    if !ctx.default_voice.is_empty() {
                        println!("    Default Voice: {}", ctx.default_voice);
                    }
                    let mut keys: Vec<_> = ctx.extra.keys().collect();
                    keys.sort();
                    for key in keys {
                        println!("    {}: {}", key, ctx.extra[key]);
                    }
                }
                Ok(())
            }
        }
    }
}
