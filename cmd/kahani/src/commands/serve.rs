//! HTTP service exposing the pipeline.
//!
//! API endpoints:
//! - POST /voice   - `{script, persona?, language}` → `{request_id, path, summary}`
//! - GET /healthz  - liveness probe

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use clap::Args;
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::info;

use kahani_voice::{Error, RequestId, SynthesisSummary, VoiceContext, VoiceRequest};

use super::{create_voice_context, get_context};
use crate::Cli;

/// Run the HTTP service.
#[derive(Args)]
pub struct ServeCommand {
    /// Listen address (":8080" binds all interfaces)
    #[arg(long, default_value = "127.0.0.1:8080")]
    addr: String,
}

impl ServeCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let ctx = get_context(cli)?;
        let voice = Arc::new(create_voice_context(&ctx)?);

        let addr = parse_addr(&self.addr)?;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "serve: listening");

        axum::serve(listener, router(voice))
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

#[derive(Clone)]
struct AppState {
    voice: Arc<VoiceContext>,
}

#[derive(Serialize)]
struct VoiceResponse {
    request_id: RequestId,
    path: PathBuf,
    summary: SynthesisSummary,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Builds the service router.
pub fn router(voice: Arc<VoiceContext>) -> Router {
    Router::new()
        .route("/voice", post(generate_voice))
        .route("/healthz", get(|| async { "ok" }))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { voice })
}

async fn generate_voice(State(state): State<AppState>, body: Bytes) -> Response {
    // Parsed by hand so that malformed bodies and unknown languages are 400.
    let req: VoiceRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    match state.voice.generate(&req).await {
        Ok(out) => Json(VoiceResponse {
            request_id: out.request_id,
            path: out.path,
            summary: out.summary,
        })
        .into_response(),
        Err(e) => error_response(status_for(&e), e.to_string()),
    }
}

fn status_for(err: &Error) -> StatusCode {
    if matches!(err, Error::EmptyScript) {
        return StatusCode::BAD_REQUEST;
    }
    if err.is_invalid_input() {
        return StatusCode::UNPROCESSABLE_ENTITY;
    }
    match err {
        Error::Io(_) | Error::Random(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_GATEWAY,
    }
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

fn parse_addr(addr: &str) -> anyhow::Result<SocketAddr> {
    let addr = if addr.starts_with(':') {
        format!("0.0.0.0{}", addr)
    } else {
        addr.to_string()
    };
    addr.parse()
        .map_err(|e| anyhow::anyhow!("invalid address '{}': {}", addr, e))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("serve: shutting down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use kahani_voice::{
        EffectiveVoice, Language, Merger, PipelineConfig, SynthesisError, Synthesizer,
    };
    use serde_json::{json, Value};

    struct EchoSynth;

    #[async_trait]
    impl Synthesizer for EchoSynth {
        async fn synthesize(
            &self,
            text: &str,
            _language: Language,
            voice: &EffectiveVoice,
        ) -> Result<Vec<u8>, SynthesisError> {
            if text == "silence" {
                return Err(SynthesisError::EmptyAudio);
            }
            Ok(format!("{}:{}", voice.speaker, text).into_bytes())
        }
    }

    async fn spawn(dir: &std::path::Path) -> String {
        let config = PipelineConfig {
            temp_dir: dir.join("segments"),
            output_dir: dir.join("compiled"),
            ..Default::default()
        };
        // Single-line scripts never reach ffmpeg.
        let voice = VoiceContext::new(Arc::new(EchoSynth), Merger::new("/nonexistent/ffmpeg"), config);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(Arc::new(voice))).await.unwrap();
        });
        format!("http://{}/voice", addr)
    }

    async fn post(url: &str, body: String) -> (StatusCode, Value) {
        let resp = reqwest::Client::new()
            .post(url)
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .unwrap();
        let status = StatusCode::from_u16(resp.status().as_u16()).unwrap();
        (status, resp.json().await.unwrap())
    }

    #[tokio::test]
    async fn test_voice_ok() {
        let dir = tempfile::tempdir().unwrap();
        let url = spawn(dir.path()).await;

        let body = json!({
            "language": "hindi",
            "script": [{"speaker": "narrator", "text": "namaste"}],
            "persona": {"Narrator": {"voice_config": {"speaker": "vidya"}}},
        });
        let (status, v) = post(&url, body.to_string()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["summary"]["succeeded"], 1);

        let path = PathBuf::from(v["path"].as_str().unwrap());
        assert_eq!(std::fs::read(&path).unwrap(), b"vidya:namaste");
        assert!(path.ends_with(format!("{}_compiled.wav", v["request_id"].as_str().unwrap())));
    }

    #[tokio::test]
    async fn test_voice_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let url = spawn(dir.path()).await;

        let (status, v) = post(&url, "{not json".to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(v["error"].is_string());

        let body = json!({"language": "latin", "script": []});
        let (status, v) = post(&url, body.to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(v["error"].as_str().unwrap().contains("latin"));
    }

    #[tokio::test]
    async fn test_voice_empty_script() {
        let dir = tempfile::tempdir().unwrap();
        let url = spawn(dir.path()).await;

        let body = json!({"language": "hindi", "script": []});
        let (status, v) = post(&url, body.to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(v["error"], "script is empty");
        assert!(!dir.path().join("segments").exists());
    }

    #[tokio::test]
    async fn test_voice_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let url = spawn(dir.path()).await;

        // No voice on the line, no persona, no default voice.
        let body = json!({"language": "tamil", "script": [{"speaker": "a", "text": "vanakkam"}]});
        let (status, v) = post(&url, body.to_string()).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(v["error"].as_str().unwrap().contains("line 0"));
    }

    #[tokio::test]
    async fn test_voice_no_audio() {
        let dir = tempfile::tempdir().unwrap();
        let url = spawn(dir.path()).await;

        let body = json!({
            "language": "english",
            "script": [{"speaker": "a", "text": "silence", "voice_config": {"speaker": "arya"}}],
        });
        let (status, _) = post(&url, body.to_string()).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_parse_addr() {
        assert_eq!(parse_addr(":8080").unwrap().to_string(), "0.0.0.0:8080");
        assert_eq!(parse_addr("127.0.0.1:9000").unwrap().port(), 9000);
        assert!(parse_addr("nowhere").is_err());
    }
}
