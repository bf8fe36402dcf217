//! Concurrent segment production.
//!
//! A [`WorkerPool`] loads every [`DialogueItem`] into one shared queue and
//! starts a fixed number of [`SegmentProducer`]s. Each producer pulls items
//! until the queue is empty, calls the provider, writes the segment file and
//! reports a [`SegmentOutcome`]. Completions arrive in whatever order the
//! provider answers; ordering is restored by the sequencer.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_queue::ArrayQueue;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{timeout, Instant};
use tracing::{debug, warn};

use crate::script::DialogueItem;
use crate::synth::{SynthesisError, Synthesizer};

/// Default number of concurrent workers.
pub const DEFAULT_WORKERS: usize = 4;

/// Default timeout of one provider call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Why a line produced no segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    #[error("provider error: {message}")]
    Provider { message: String },
    #[error("provider returned no audio")]
    EmptyAudio,
    #[error("provider call timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },
    #[error("invocation deadline exceeded")]
    DeadlineExceeded,
    #[error("failed to write segment: {message}")]
    Write { message: String },
    #[error("no outcome reported")]
    NotReported,
}

/// Terminal state of one dialogue item.
#[derive(Debug, Clone)]
pub struct SegmentOutcome {
    /// The item; `segment_path` is set when the segment was produced.
    pub item: DialogueItem,
    pub failure: Option<FailureReason>,
}

impl SegmentOutcome {
    pub fn index(&self) -> usize {
        self.item.index
    }

    pub fn is_produced(&self) -> bool {
        self.failure.is_none() && self.item.segment_path.is_some()
    }
}

/// Worker pool settings.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of concurrent workers.
    pub workers: usize,
    /// Timeout of a single provider call.
    pub call_timeout: Duration,
    /// Upper bound for the whole run; `None` disables it.
    pub deadline: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            deadline: None,
        }
    }
}

/// Fixed-size pool of homogeneous segment producers.
pub struct WorkerPool {
    config: PoolConfig,
}

impl WorkerPool {
    pub fn new(config: PoolConfig) -> Self {
        Self { config }
    }

    /// Produces a segment for every item and returns one outcome per item,
    /// in completion order.
    ///
    /// Segment files are written to `segment_dir` under names derived from
    /// each item's request id and index.
    pub async fn run(
        &self,
        items: Vec<DialogueItem>,
        synthesizer: Arc<dyn Synthesizer>,
        segment_dir: &Path,
        ext: &str,
    ) -> Vec<SegmentOutcome> {
        let total = items.len();
        if total == 0 {
            return Vec::new();
        }

        let queue = Arc::new(ArrayQueue::new(total));
        for item in items {
            // Capacity equals the item count.
            let _ = queue.push(item);
        }

        let deadline = self.config.deadline.map(|d| Instant::now() + d);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut workers = JoinSet::new();

        let count = self.config.workers.clamp(1, total);
        for worker in 0..count {
            let producer = SegmentProducer {
                worker,
                queue: queue.clone(),
                outcomes: tx.clone(),
                synthesizer: synthesizer.clone(),
                segment_dir: segment_dir.to_path_buf(),
                ext: ext.to_string(),
                call_timeout: self.config.call_timeout,
                deadline,
            };
            workers.spawn(producer.run());
        }
        drop(tx);

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "voice: worker aborted");
            }
        }

        let mut outcomes = Vec::with_capacity(total);
        while let Some(outcome) = rx.recv().await {
            outcomes.push(outcome);
        }
        outcomes
    }
}

/// One worker of a [`WorkerPool`].
pub struct SegmentProducer {
    worker: usize,
    queue: Arc<ArrayQueue<DialogueItem>>,
    outcomes: mpsc::UnboundedSender<SegmentOutcome>,
    synthesizer: Arc<dyn Synthesizer>,
    segment_dir: PathBuf,
    ext: String,
    call_timeout: Duration,
    deadline: Option<Instant>,
}

impl SegmentProducer {
    /// Pulls items until the queue is empty.
    async fn run(self) {
        let mut handled = 0usize;

        while let Some(mut item) = self.queue.pop() {
            handled += 1;
            let failure = match self.produce(&item).await {
                Ok(path) => {
                    debug!(
                        worker = self.worker,
                        index = item.index,
                        path = %path.display(),
                        "voice: segment produced"
                    );
                    item.segment_path = Some(path);
                    None
                }
                Err(reason) => {
                    warn!(
                        worker = self.worker,
                        index = item.index,
                        speaker = %item.speaker,
                        error = %reason,
                        "voice: segment failed"
                    );
                    Some(reason)
                }
            };

            // The receiver lives until every worker has been joined.
            let _ = self.outcomes.send(SegmentOutcome { item, failure });
        }

        debug!(worker = self.worker, handled, "voice: queue drained");
    }

    async fn produce(&self, item: &DialogueItem) -> Result<PathBuf, FailureReason> {
        let (budget, bounded_by_deadline) = match self.deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return Err(FailureReason::DeadlineExceeded);
                }
                let remaining = deadline - now;
                if remaining < self.call_timeout {
                    (remaining, true)
                } else {
                    (self.call_timeout, false)
                }
            }
            None => (self.call_timeout, false),
        };

        let call = self
            .synthesizer
            .synthesize(&item.text, item.language, &item.voice);

        let audio = match timeout(budget, call).await {
            Err(_) if bounded_by_deadline => return Err(FailureReason::DeadlineExceeded),
            Err(_) => {
                return Err(FailureReason::Timeout {
                    after_ms: budget.as_millis() as u64,
                })
            }
            Ok(Err(SynthesisError::EmptyAudio)) => return Err(FailureReason::EmptyAudio),
            Ok(Err(SynthesisError::Provider(message))) => {
                return Err(FailureReason::Provider { message })
            }
            Ok(Ok(audio)) if audio.is_empty() => return Err(FailureReason::EmptyAudio),
            Ok(Ok(audio)) => audio,
        };

        let path = self
            .segment_dir
            .join(item.request_id.segment_file_name(item.index, &self.ext));
        tokio::fs::write(&path, &audio)
            .await
            .map_err(|e| FailureReason::Write {
                message: e.to_string(),
            })?;

        Ok(path)
    }
}
