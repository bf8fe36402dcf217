//! Segment concatenation with ffmpeg.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{Error, Result};

#[cfg(windows)]
const FFMPEG_BIN: &str = "ffmpeg.exe";
#[cfg(not(windows))]
const FFMPEG_BIN: &str = "ffmpeg";

/// Concatenates ordered segments into one artifact.
#[derive(Debug, Clone)]
pub struct Merger {
    ffmpeg: PathBuf,
}

impl Merger {
    /// Uses the given ffmpeg executable without checking it.
    pub fn new(ffmpeg: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
        }
    }

    /// Uses `configured` when set, otherwise searches for ffmpeg.
    pub fn locate(configured: Option<&Path>) -> Result<Self> {
        match configured {
            Some(path) if is_executable(path) => Ok(Self::new(path)),
            Some(path) => {
                warn!(path = %path.display(), "voice: configured ffmpeg is not executable");
                Err(Error::FfmpegNotFound)
            }
            None => find_ffmpeg().map(Self::new).ok_or(Error::FfmpegNotFound),
        }
    }

    pub fn ffmpeg(&self) -> &Path {
        &self.ffmpeg
    }

    /// Merges `segments` in the given order into `output`.
    ///
    /// A single segment is copied byte for byte. Several segments are joined
    /// with ffmpeg's concat demuxer using stream copy, so every segment must
    /// share the same encoding. `output` is overwritten.
    pub async fn merge(&self, segments: &[PathBuf], output: &Path) -> Result<PathBuf> {
        if segments.is_empty() {
            return Err(Error::NothingToMerge);
        }
        for segment in segments {
            if !tokio::fs::try_exists(segment).await? {
                return Err(Error::MissingSegment(segment.clone()));
            }
        }
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        if let [single] = segments {
            tokio::fs::copy(single, output).await?;
            debug!(output = %output.display(), "voice: single segment copied");
            return Ok(output.to_path_buf());
        }

        // Removed when dropped.
        let manifest = tempfile::Builder::new()
            .prefix("kahani-concat-")
            .suffix(".txt")
            .tempfile()?
            .into_temp_path();
        tokio::fs::write(&manifest, concat_manifest(segments)?).await?;

        let mut cmd = Command::new(&self.ffmpeg);
        cmd.arg("-hide_banner").arg("-loglevel").arg("error").arg("-y");
        cmd.arg("-f").arg("concat").arg("-safe").arg("0");
        cmd.arg("-i").arg(&*manifest);
        cmd.arg("-c").arg("copy");
        cmd.arg(output);
        cmd.stdin(Stdio::null()).kill_on_drop(true);

        let out = cmd.output().await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::FfmpegNotFound,
            _ => Error::Io(e),
        })?;

        if !out.status.success() {
            let _ = tokio::fs::remove_file(output).await;
            return Err(Error::Merge {
                status: out.status,
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }

        debug!(
            segments = segments.len(),
            output = %output.display(),
            "voice: segments merged"
        );
        Ok(output.to_path_buf())
    }
}

/// Builds the concat demuxer input listing `segments` by absolute path.
pub fn concat_manifest(segments: &[PathBuf]) -> Result<String> {
    let mut manifest = String::new();
    for segment in segments {
        let abs = std::path::absolute(segment)?;
        let quoted = abs.to_string_lossy().replace('\'', r"'\''");
        manifest.push_str("file '");
        manifest.push_str(&quoted);
        manifest.push_str("'\n");
    }
    Ok(manifest)
}

/// Searches `PATH`, then `~/ffmpeg/bin`.
pub fn find_ffmpeg() -> Option<PathBuf> {
    let on_path = std::env::var_os("PATH").and_then(|paths| {
        std::env::split_paths(&paths)
            .map(|dir| dir.join(FFMPEG_BIN))
            .find(|p| is_executable(p))
    });

    on_path.or_else(|| {
        dirs::home_dir()
            .map(|home| home.join("ffmpeg").join("bin").join(FFMPEG_BIN))
            .filter(|p| is_executable(p))
    })
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
