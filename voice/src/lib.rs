//! Script-to-audio voice pipeline.
//!
//! Converts a dialogue script into a single audio file. Each line is
//! synthesized independently by a pool of concurrent workers, the resulting
//! segments are put back into script order and concatenated with ffmpeg,
//! and the per-request segment files are removed afterwards.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use kahani_voice::{PipelineConfig, SarvamSynthesizer, VoiceContext};
//!
//! let client = kahani_sarvam::Client::new(api_key)?;
//! let ctx = VoiceContext::from_config(
//!     Arc::new(SarvamSynthesizer::new(client)),
//!     PipelineConfig::default(),
//! )?;
//! let out = ctx.generate(&request).await?;
//! println!("{} ({} of {} lines)", out.path.display(), out.summary.succeeded, out.summary.total);
//! ```

mod config;
mod error;
mod janitor;
mod merge;
mod pipeline;
mod pool;
mod resolve;
mod script;
mod sequence;
mod synth;

pub use config::*;
pub use error::{Error, Result};
pub use janitor::{CleanupReport, Janitor, SweepMode};
pub use merge::{concat_manifest, find_ffmpeg, Merger};
pub use pipeline::{VoiceContext, VoiceOutput};
pub use pool::{FailureReason, PoolConfig, SegmentOutcome, SegmentProducer, WorkerPool, DEFAULT_CALL_TIMEOUT, DEFAULT_WORKERS};
pub use resolve::{clamp_pace, resolve_script, resolve_voice};
pub use script::{
    DialogueItem, DialogueLine, EffectiveVoice, Persona, PersonaEntry, RequestId, VoiceConfig,
    VoiceRequest,
};
pub use sequence::{sequence, SegmentFailure, Sequenced, SynthesisSummary};
pub use synth::{SarvamSynthesizer, SynthesisError, Synthesizer};

pub use kahani_sarvam::Language;
