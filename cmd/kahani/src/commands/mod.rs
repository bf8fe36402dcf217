//! CLI commands module.

mod config;
mod serve;
mod tts;
mod util;
mod voice;

pub use config::ConfigCommand;
pub use serve::ServeCommand;
pub use tts::TtsCommand;
pub use voice::VoiceCommand;

pub(crate) use util::*;
