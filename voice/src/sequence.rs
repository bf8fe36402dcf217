//! Restores script order from completion-ordered outcomes.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::pool::{FailureReason, SegmentOutcome};

/// One line that produced no segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentFailure {
    pub index: usize,
    /// Empty when the line never reported an outcome.
    pub speaker: String,
    pub reason: FailureReason,
}

/// Per-invocation synthesis counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SynthesisSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<SegmentFailure>,
}

impl SynthesisSummary {
    /// Fraction of lines that produced audio; 0 for an empty script.
    pub fn success_ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.succeeded as f64 / self.total as f64
        }
    }
}

/// Segments in script order plus the summary of the run.
#[derive(Debug, Clone)]
pub struct Sequenced {
    pub segments: Vec<PathBuf>,
    pub summary: SynthesisSummary,
}

impl Sequenced {
    /// Returns the ordered segments when enough lines succeeded.
    ///
    /// An empty segment list is always an error. Otherwise the success ratio
    /// must reach `min_ratio`; a ratio of 0 accepts any partial result.
    pub fn require_audio(&self, min_ratio: f64) -> Result<&[PathBuf]> {
        let summary = &self.summary;
        if self.segments.is_empty() {
            return Err(Error::NoAudioProduced {
                total: summary.total,
                failed: summary.failed,
            });
        }
        if summary.success_ratio() < min_ratio {
            return Err(Error::InsufficientAudio {
                total: summary.total,
                succeeded: summary.succeeded,
                required: min_ratio,
            });
        }
        Ok(&self.segments)
    }
}

/// Orders outcomes by line index and drops failed lines.
///
/// `total` is the number of items handed to the pool; an index below it
/// without an outcome is reported as [`FailureReason::NotReported`].
pub fn sequence(mut outcomes: Vec<SegmentOutcome>, total: usize) -> Sequenced {
    outcomes.sort_by_key(SegmentOutcome::index);

    let mut seen = HashSet::with_capacity(outcomes.len());
    let mut segments = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();

    for outcome in outcomes {
        let index = outcome.index();
        if !seen.insert(index) {
            continue;
        }
        match (outcome.failure, outcome.item.segment_path) {
            (None, Some(path)) => segments.push(path),
            (failure, _) => failures.push(SegmentFailure {
                index,
                speaker: outcome.item.speaker,
                reason: failure.unwrap_or(FailureReason::NotReported),
            }),
        }
    }

    for index in (0..total).filter(|i| !seen.contains(i)) {
        failures.push(SegmentFailure {
            index,
            speaker: String::new(),
            reason: FailureReason::NotReported,
        });
    }
    failures.sort_by_key(|f| f.index);

    let total = total.max(seen.len());
    Sequenced {
        summary: SynthesisSummary {
            total,
            succeeded: segments.len(),
            failed: failures.len(),
            failures,
        },
        segments,
    }
}
