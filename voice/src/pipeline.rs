//! Script-to-audio pipeline entry point.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, info_span, warn, Instrument};

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::janitor::{CleanupReport, Janitor, SweepMode};
use crate::merge::Merger;
use crate::pool::WorkerPool;
use crate::resolve::resolve_script;
use crate::script::{RequestId, VoiceRequest};
use crate::sequence::{sequence, SynthesisSummary};
use crate::synth::Synthesizer;

/// Result of one successful invocation.
#[derive(Debug, Clone, Serialize)]
pub struct VoiceOutput {
    pub request_id: RequestId,
    /// Merged audio artifact.
    pub path: PathBuf,
    pub summary: SynthesisSummary,
    pub cleanup: CleanupReport,
}

/// Shared state for pipeline invocations.
///
/// Built once by the caller and reused; concurrent invocations are isolated
/// by their request ids.
pub struct VoiceContext {
    synthesizer: Arc<dyn Synthesizer>,
    merger: Merger,
    config: PipelineConfig,
}

impl VoiceContext {
    pub fn new(synthesizer: Arc<dyn Synthesizer>, merger: Merger, config: PipelineConfig) -> Self {
        Self {
            synthesizer,
            merger,
            config,
        }
    }

    /// Creates a context, locating ffmpeg from the configuration.
    pub fn from_config(synthesizer: Arc<dyn Synthesizer>, config: PipelineConfig) -> Result<Self> {
        let merger = Merger::locate(config.ffmpeg.as_deref())?;
        Ok(Self::new(synthesizer, merger, config))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Converts a script into one merged audio file under a fresh request id.
    pub async fn generate(&self, request: &VoiceRequest) -> Result<VoiceOutput> {
        self.generate_with_id(request, RequestId::generate()?).await
    }

    /// Like [`generate`](Self::generate) with a caller-chosen request id.
    pub async fn generate_with_id(
        &self,
        request: &VoiceRequest,
        request_id: RequestId,
    ) -> Result<VoiceOutput> {
        let span = info_span!("voice", request_id = %request_id);
        self.run(request, request_id).instrument(span).await
    }

    /// Sweeps the segment files of `request_id`.
    pub async fn clean(&self, request_id: &RequestId, mode: SweepMode) -> CleanupReport {
        Janitor::new(&self.config.temp_dir)
            .sweep(&request_id.segment_pattern(&self.config.audio_extension), mode)
            .await
    }

    async fn run(&self, request: &VoiceRequest, request_id: RequestId) -> Result<VoiceOutput> {
        let cfg = &self.config;
        let ext = cfg.audio_extension.as_str();

        let items = resolve_script(
            &request.script,
            &request.persona,
            request.language,
            &request_id,
            cfg.default_speaker.as_deref(),
        )?;
        let total = items.len();

        tokio::fs::create_dir_all(&cfg.temp_dir).await?;
        tokio::fs::create_dir_all(&cfg.output_dir).await?;

        info!(
            lines = total,
            workers = cfg.workers,
            language = %request.language,
            "voice: synthesizing script"
        );

        let outcomes = WorkerPool::new(cfg.pool_config())
            .run(items, self.synthesizer.clone(), &cfg.temp_dir, ext)
            .await;
        let sequenced = sequence(outcomes, total);

        let output = cfg.output_dir.join(request_id.compiled_file_name(ext));
        let merged = match sequenced.require_audio(cfg.min_success_ratio) {
            Ok(segments) => self.merger.merge(segments, &output).await,
            Err(e) => Err(e),
        };

        match merged {
            Ok(path) => {
                let cleanup = self.clean(&request_id, cfg.cleanup).await;
                let summary = sequenced.summary;
                info!(
                    path = %path.display(),
                    succeeded = summary.succeeded,
                    failed = summary.failed,
                    "voice: script compiled"
                );
                Ok(VoiceOutput {
                    request_id,
                    path,
                    summary,
                    cleanup,
                })
            }
            Err(e) => {
                if !sequenced.segments.is_empty() {
                    self.clean(&request_id, SweepMode::Live).await;
                }
                warn!(
                    error = %e,
                    succeeded = sequenced.summary.succeeded,
                    failed = sequenced.summary.failed,
                    "voice: script failed"
                );
                Err(e)
            }
        }
    }
}
