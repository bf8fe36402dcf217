//! Error types for the voice pipeline.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Result type alias for voice pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for voice pipeline operations.
///
/// Per-line synthesis failures are not errors; they are reported as
/// [`FailureReason`](crate::FailureReason) values in the summary.
#[derive(Error, Debug)]
pub enum Error {
    /// A script line was rejected at ingestion.
    #[error("invalid script line {index}: {reason}")]
    Validation { index: usize, reason: String },

    /// The script has no lines.
    #[error("script is empty")]
    EmptyScript,

    /// A caller-supplied request id is not safe to use in file names.
    #[error("invalid request id: {0:?}")]
    InvalidRequestId(String),

    /// Every line failed; nothing to merge.
    #[error("no audio produced ({failed} of {total} lines failed)")]
    NoAudioProduced { total: usize, failed: usize },

    /// Too few lines succeeded to accept the merge.
    #[error("only {succeeded} of {total} lines produced audio, below the required ratio {required}")]
    InsufficientAudio {
        total: usize,
        succeeded: usize,
        required: f64,
    },

    /// The merger was called with no inputs.
    #[error("nothing to merge")]
    NothingToMerge,

    /// A segment listed for merging does not exist on disk.
    #[error("segment file not found: {}", .0.display())]
    MissingSegment(PathBuf),

    /// No ffmpeg executable could be located.
    #[error("ffmpeg not found; install ffmpeg and make sure it is on PATH")]
    FfmpegNotFound,

    /// ffmpeg exited unsuccessfully.
    #[error("ffmpeg concat failed ({status}): {stderr}")]
    Merge { status: ExitStatus, stderr: String },

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Random source failure while generating a request id.
    #[error("random source error: {0}")]
    Random(String),
}

impl Error {
    /// Creates a validation error for the line at `index`.
    pub fn validation(index: usize, reason: impl Into<String>) -> Self {
        Error::Validation {
            index,
            reason: reason.into(),
        }
    }

    /// Returns true if the error was caused by the caller's input.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Error::Validation { .. } | Error::EmptyScript | Error::InvalidRequestId(_)
        )
    }

    /// Returns true if the provider produced too little audio.
    pub fn is_synthesis_failure(&self) -> bool {
        matches!(
            self,
            Error::NoAudioProduced { .. } | Error::InsufficientAudio { .. }
        )
    }
}
