//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::janitor::SweepMode;
use crate::pool::{PoolConfig, DEFAULT_WORKERS};

/// Default directory for segment files.
pub const DEFAULT_TEMP_DIR: &str = "/tmp/kahani";

/// Default directory for merged artifacts.
pub const DEFAULT_OUTPUT_DIR: &str = "/tmp/kahani/compiled";

/// Default audio container extension.
pub const DEFAULT_AUDIO_EXTENSION: &str = "wav";

/// Settings of a [`VoiceContext`](crate::VoiceContext).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of concurrent synthesis workers.
    pub workers: usize,
    /// Directory for segment files.
    pub temp_dir: PathBuf,
    /// Directory for merged artifacts.
    pub output_dir: PathBuf,
    pub audio_extension: String,
    /// Timeout of one provider call in seconds.
    pub call_timeout_secs: u64,
    /// Upper bound for one invocation in seconds; 0 disables it.
    pub deadline_secs: u64,
    /// Minimum fraction of lines that must produce audio.
    pub min_success_ratio: f64,
    /// Explicit ffmpeg executable; searched for when unset.
    pub ffmpeg: Option<PathBuf>,
    pub cleanup: SweepMode,
    /// Voice used for lines that name none.
    pub default_speaker: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            temp_dir: PathBuf::from(DEFAULT_TEMP_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            audio_extension: DEFAULT_AUDIO_EXTENSION.to_string(),
            call_timeout_secs: 60,
            deadline_secs: 600,
            min_success_ratio: 0.0,
            ffmpeg: None,
            cleanup: SweepMode::Live,
            default_speaker: None,
        }
    }
}

impl PipelineConfig {
    /// Worker pool settings derived from this configuration.
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            workers: self.workers.max(1),
            call_timeout: Duration::from_secs(self.call_timeout_secs.max(1)),
            deadline: (self.deadline_secs > 0).then(|| Duration::from_secs(self.deadline_secs)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.workers, 4);
        assert_eq!(cfg.temp_dir, PathBuf::from("/tmp/kahani"));
        assert_eq!(cfg.output_dir, PathBuf::from("/tmp/kahani/compiled"));
        assert_eq!(cfg.cleanup, SweepMode::Live);

        let pool = cfg.pool_config();
        assert_eq!(pool.call_timeout, Duration::from_secs(60));
        assert_eq!(pool.deadline, Some(Duration::from_secs(600)));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let cfg: PipelineConfig =
            serde_json::from_str(r#"{"workers": 8, "deadline_secs": 0, "cleanup": "dry_run"}"#)
                .unwrap();
        assert_eq!(cfg.workers, 8);
        assert_eq!(cfg.audio_extension, "wav");
        assert_eq!(cfg.cleanup, SweepMode::DryRun);
        assert_eq!(cfg.pool_config().deadline, None);
    }

    #[test]
    fn test_zero_workers_floor() {
        let cfg = PipelineConfig {
            workers: 0,
            ..Default::default()
        };
        assert_eq!(cfg.pool_config().workers, 1);
    }
}
