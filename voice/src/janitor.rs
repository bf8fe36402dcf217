//! Removal of per-request segment files.

use std::path::PathBuf;

use glob::Pattern;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Whether a sweep deletes files or only lists them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepMode {
    /// Only report the files that would be removed.
    DryRun,
    #[default]
    Live,
}

/// Result of one sweep.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupReport {
    pub mode: SweepMode,
    /// Files matching the pattern.
    pub matched: Vec<PathBuf>,
    /// Files actually deleted; always empty in dry-run mode.
    pub removed: Vec<PathBuf>,
    /// Per-file problems. A sweep never fails as a whole.
    pub errors: Vec<String>,
}

/// Deletes files matching a glob pattern inside one directory.
#[derive(Debug, Clone)]
pub struct Janitor {
    dir: PathBuf,
}

impl Janitor {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Removes (or lists, in dry-run mode) every regular file in the
    /// directory whose name matches `pattern`.
    ///
    /// Failures are logged and recorded in the report.
    pub async fn sweep(&self, pattern: &str, mode: SweepMode) -> CleanupReport {
        let mut report = CleanupReport {
            mode,
            ..Default::default()
        };

        let pattern = match Pattern::new(pattern) {
            Ok(p) => p,
            Err(e) => {
                warn!(pattern, error = %e, "voice: invalid cleanup pattern");
                report.errors.push(format!("invalid pattern {pattern:?}: {e}"));
                return report;
            }
        };

        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return report,
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "voice: cannot read cleanup directory");
                report.errors.push(format!("{}: {e}", self.dir.display()));
                return report;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!(dir = %self.dir.display(), error = %e, "voice: cleanup listing failed");
                    report.errors.push(format!("{}: {e}", self.dir.display()));
                    break;
                }
            };

            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !pattern.matches(name) {
                continue;
            }
            match entry.file_type().await {
                Ok(ft) if ft.is_file() => {}
                _ => continue,
            }

            let path = entry.path();
            report.matched.push(path.clone());
            if mode == SweepMode::DryRun {
                continue;
            }

            match tokio::fs::remove_file(&path).await {
                Ok(()) => report.removed.push(path),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "voice: failed to remove segment");
                    report.errors.push(format!("{}: {e}", path.display()));
                }
            }
        }

        report.matched.sort();
        report.removed.sort();
        debug!(
            dir = %self.dir.display(),
            matched = report.matched.len(),
            removed = report.removed.len(),
            dry_run = mode == SweepMode::DryRun,
            "voice: cleanup sweep"
        );
        report
    }
}
