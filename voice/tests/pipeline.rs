//! End-to-end pipeline tests with an in-process synthesizer and a shell
//! stand-in for ffmpeg.

#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use kahani_voice::{
    DialogueLine, EffectiveVoice, Error, FailureReason, Language, Merger, Persona,
    PipelineConfig, RequestId, SweepMode, SynthesisError, Synthesizer, VoiceConfig,
    VoiceContext, VoiceRequest,
};

const FAKE_FFMPEG: &str = r#"#!/bin/sh
list=""
out=""
while [ $# -gt 0 ]; do
  case "$1" in
    -i) list="$2"; shift 2 ;;
    *) out="$1"; shift ;;
  esac
done
: > "$out"
sed -e "s/^file '//" -e "s/'$//" "$list" | while IFS= read -r f; do
  cat "$f" >> "$out"
done
"#;

const FAILING_FFMPEG: &str = "#!/bin/sh\necho 'concat: invalid data' >&2\nexit 1\n";

fn script_dir() -> &'static Path {
    static DIR: OnceLock<PathBuf> = OnceLock::new();
    DIR.get_or_init(|| {
        use std::os::unix::fs::PermissionsExt;

        let dir = std::env::temp_dir().join(format!("kahani-ffmpeg-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        for (name, body) in [("ffmpeg", FAKE_FFMPEG), ("ffmpeg-broken", FAILING_FFMPEG)] {
            let path = dir.join(name);
            std::fs::write(&path, body).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        dir
    })
}

fn fake_ffmpeg() -> PathBuf {
    script_dir().join("ffmpeg")
}

fn broken_ffmpeg() -> PathBuf {
    script_dir().join("ffmpeg-broken")
}

/// Answers with `<speaker:text>` after a text-dependent delay.
///
/// Texts starting with `empty` produce no audio; texts starting with `boom`
/// produce a provider error.
#[derive(Default)]
struct MockSynth {
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

#[async_trait]
impl Synthesizer for MockSynth {
    async fn synthesize(
        &self,
        text: &str,
        _language: Language,
        voice: &EffectiveVoice,
    ) -> Result<Vec<u8>, SynthesisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = text.bytes().map(u64::from).sum::<u64>() % 23;
        tokio::time::sleep(Duration::from_millis(delay)).await;

        let result = if text.starts_with("empty") {
            Err(SynthesisError::EmptyAudio)
        } else if text.starts_with("boom") {
            Err(SynthesisError::Provider("upstream 500".to_string()))
        } else {
            Ok(format!("<{}:{}>", voice.speaker, text).into_bytes())
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

fn request(texts: &[&str]) -> VoiceRequest {
    VoiceRequest {
        script: texts
            .iter()
            .enumerate()
            .map(|(i, t)| {
                DialogueLine::new(format!("s{i}"), *t).with_voice(VoiceConfig {
                    speaker: Some("karun".to_string()),
                    ..Default::default()
                })
            })
            .collect(),
        persona: Persona::new(),
        language: Language::English,
    }
}

fn expected(texts: &[&str]) -> String {
    texts.iter().map(|t| format!("<karun:{t}>")).collect()
}

fn config(dir: &Path, workers: usize) -> PipelineConfig {
    PipelineConfig {
        workers,
        temp_dir: dir.join("segments"),
        output_dir: dir.join("compiled"),
        ..Default::default()
    }
}

fn context(synth: &Arc<MockSynth>, dir: &Path, workers: usize, ffmpeg: PathBuf) -> VoiceContext {
    VoiceContext::new(synth.clone(), Merger::new(ffmpeg), config(dir, workers))
}

fn segment_files(dir: &Path) -> Vec<String> {
    match std::fs::read_dir(dir.join("segments")) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_merged_audio_follows_script_order() {
    let dir = tempfile::tempdir().unwrap();
    let synth = Arc::new(MockSynth::default());
    let ctx = context(&synth, dir.path(), 3, fake_ffmpeg());

    let texts = [
        "It was a dark night",
        "Who goes there?",
        "Only the wind",
        "The wind does not knock",
        "Then open the door",
        "Never",
        "So be it",
    ];
    let out = ctx.generate(&request(&texts)).await.unwrap();

    let audio = std::fs::read_to_string(&out.path).unwrap();
    assert_eq!(audio, expected(&texts));
    assert_eq!(
        out.path.file_name().unwrap().to_str().unwrap(),
        format!("{}_compiled.wav", out.request_id)
    );
    assert_eq!(out.summary.total, 7);
    assert_eq!(out.summary.succeeded, 7);
    assert_eq!(synth.calls.load(Ordering::SeqCst), 7);
    assert!(synth.max_in_flight.load(Ordering::SeqCst) <= 3);

    assert_eq!(out.cleanup.removed.len(), 7);
    assert!(segment_files(dir.path()).is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failed_lines_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let synth = Arc::new(MockSynth::default());
    let ctx = context(&synth, dir.path(), 4, fake_ffmpeg());

    let texts = ["first", "empty line", "third", "boom", "fifth"];
    let out = ctx.generate(&request(&texts)).await.unwrap();

    let audio = std::fs::read_to_string(&out.path).unwrap();
    assert_eq!(audio, expected(&["first", "third", "fifth"]));

    let s = &out.summary;
    assert_eq!((s.total, s.succeeded, s.failed), (5, 3, 2));
    assert_eq!(s.failures[0].index, 1);
    assert_eq!(s.failures[0].reason, FailureReason::EmptyAudio);
    assert_eq!(s.failures[1].index, 3);
    assert!(matches!(s.failures[1].reason, FailureReason::Provider { .. }));
    assert!(segment_files(dir.path()).is_empty());
}

#[tokio::test]
async fn test_all_lines_failing_produces_no_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let synth = Arc::new(MockSynth::default());
    let ctx = context(&synth, dir.path(), 2, fake_ffmpeg());
    let id = RequestId::parse("allfail").unwrap();

    let err = ctx
        .generate_with_id(&request(&["empty a", "empty b", "boom c"]), id.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NoAudioProduced { total: 3, failed: 3 }));
    assert!(!dir.path().join("compiled").join(id.compiled_file_name("wav")).exists());
    assert!(segment_files(dir.path()).is_empty());
}

#[tokio::test]
async fn test_empty_script_never_calls_provider() {
    let dir = tempfile::tempdir().unwrap();
    let synth = Arc::new(MockSynth::default());
    let ctx = context(&synth, dir.path(), 4, fake_ffmpeg());

    let err = ctx.generate(&request(&[])).await.unwrap_err();
    assert!(matches!(err, Error::EmptyScript));
    assert!(err.is_invalid_input());
    assert_eq!(synth.calls.load(Ordering::SeqCst), 0);
    assert!(!dir.path().join("segments").exists());
}

#[tokio::test]
async fn test_more_workers_than_lines() {
    let dir = tempfile::tempdir().unwrap();
    let synth = Arc::new(MockSynth::default());
    let ctx = context(&synth, dir.path(), 16, fake_ffmpeg());

    let out = ctx.generate(&request(&["one", "two"])).await.unwrap();
    assert_eq!(std::fs::read_to_string(&out.path).unwrap(), expected(&["one", "two"]));
    assert_eq!(synth.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_single_line_is_copied_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let synth = Arc::new(MockSynth::default());
    // The broken ffmpeg must not be invoked for one segment.
    let ctx = context(&synth, dir.path(), 4, broken_ffmpeg());

    let out = ctx.generate(&request(&["alone"])).await.unwrap();
    assert_eq!(std::fs::read(&out.path).unwrap(), b"<karun:alone>");
}

#[tokio::test]
async fn test_merge_failure_cleans_segments() {
    let dir = tempfile::tempdir().unwrap();
    let synth = Arc::new(MockSynth::default());
    let ctx = context(&synth, dir.path(), 2, broken_ffmpeg());
    let id = RequestId::parse("mergefail").unwrap();

    let err = ctx
        .generate_with_id(&request(&["a", "b", "c"]), id.clone())
        .await
        .unwrap_err();
    match err {
        Error::Merge { stderr, .. } => assert!(stderr.contains("invalid data")),
        other => panic!("unexpected error: {other}"),
    }
    assert!(segment_files(dir.path()).is_empty());
    assert!(!dir.path().join("compiled").join(id.compiled_file_name("wav")).exists());
}

#[tokio::test]
async fn test_validation_error_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let synth = Arc::new(MockSynth::default());
    let ctx = context(&synth, dir.path(), 2, fake_ffmpeg());

    let mut req = request(&["fine", "also fine"]);
    req.script[1].voice_config.pace = Some(f64::INFINITY);

    let err = ctx.generate(&req).await.unwrap_err();
    assert!(matches!(err, Error::Validation { index: 1, .. }));
    assert_eq!(synth.calls.load(Ordering::SeqCst), 0);
    assert!(!dir.path().join("segments").exists());
}

#[tokio::test]
async fn test_min_success_ratio() {
    let dir = tempfile::tempdir().unwrap();
    let synth = Arc::new(MockSynth::default());
    let ctx = VoiceContext::new(
        synth.clone(),
        Merger::new(fake_ffmpeg()),
        PipelineConfig {
            min_success_ratio: 0.75,
            ..config(dir.path(), 2)
        },
    );

    let err = ctx
        .generate(&request(&["ok", "empty", "ok again", "boom"]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::InsufficientAudio {
            total: 4,
            succeeded: 2,
            ..
        }
    ));
    assert!(segment_files(dir.path()).is_empty());
}

#[tokio::test]
async fn test_dry_run_cleanup_keeps_segments() {
    let dir = tempfile::tempdir().unwrap();
    let synth = Arc::new(MockSynth::default());
    let ctx = VoiceContext::new(
        synth.clone(),
        Merger::new(fake_ffmpeg()),
        PipelineConfig {
            cleanup: SweepMode::DryRun,
            ..config(dir.path(), 2)
        },
    );

    let out = ctx.generate(&request(&["x", "y"])).await.unwrap();
    assert_eq!(out.cleanup.matched.len(), 2);
    assert!(out.cleanup.removed.is_empty());
    assert_eq!(segment_files(dir.path()).len(), 2);

    let report = ctx.clean(&out.request_id, SweepMode::Live).await;
    assert_eq!(report.removed.len(), 2);
    assert!(segment_files(dir.path()).is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_invocations_are_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let synth = Arc::new(MockSynth::default());
    let ctx = context(&synth, dir.path(), 3, fake_ffmpeg());

    let a = ["alpha one", "alpha two", "alpha three", "alpha four"];
    let b = ["beta one", "beta two", "beta three"];
    let (req_a, req_b) = (request(&a), request(&b));
    let (ra, rb) = tokio::join!(ctx.generate(&req_a), ctx.generate(&req_b));
    let (ra, rb) = (ra.unwrap(), rb.unwrap());

    assert_ne!(ra.request_id, rb.request_id);
    assert_eq!(std::fs::read_to_string(&ra.path).unwrap(), expected(&a));
    assert_eq!(std::fs::read_to_string(&rb.path).unwrap(), expected(&b));
    assert!(segment_files(dir.path()).is_empty());
}

#[tokio::test]
async fn test_clean_leaves_segments_of_similar_ids() {
    let dir = tempfile::tempdir().unwrap();
    let synth = Arc::new(MockSynth::default());
    let ctx = context(&synth, dir.path(), 2, fake_ffmpeg());

    // Segments a request id containing `_` would have written, plus those of
    // a valid id sharing the same prefix.
    let segments = dir.path().join("segments");
    std::fs::create_dir_all(&segments).unwrap();
    let story = RequestId::parse("story").unwrap();
    let sibling = RequestId::parse("story-2").unwrap();
    let foreign = [
        "story___000.wav".to_string(),
        "story__2__000.wav".to_string(),
        sibling.segment_file_name(0, "wav"),
    ];
    for name in foreign.iter().chain([&story.segment_file_name(0, "wav")]) {
        std::fs::write(segments.join(name), b"x").unwrap();
    }

    let report = ctx.clean(&story, SweepMode::Live).await;
    assert_eq!(report.removed, vec![segments.join("story__000.wav")]);

    let mut left = segment_files(dir.path());
    left.sort();
    let mut expected_left = foreign.to_vec();
    expected_left.sort();
    assert_eq!(left, expected_left);
}
