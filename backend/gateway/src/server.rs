//! Main HTTP gateway server.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    extract::{DefaultBodyLimit, Form, Multipart, Query, State},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::time::Instant;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{error, info, instrument, warn, Level};

use finsight_logging::{CycleEvent, CycleLogger};
use finsight_media::{select_source, CapturedImage, ImageOrigin};

use crate::attachments::CaptureForm;
use crate::control_ui::{render_page, PageView};
use crate::controller::{Effect, SessionEvent, SessionState};
use crate::pipeline::AnalysisPipeline;
use crate::session_registry::SessionRegistry;

const PRUNE_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Application state shared across routes.
#[derive(Clone)]
pub struct GatewayState {
    pub pipeline: Arc<AnalysisPipeline>,
    pub sessions: SessionRegistry,
    pub max_upload_bytes: usize,
}

impl GatewayState {
    pub fn new(pipeline: AnalysisPipeline, sessions: SessionRegistry, max_upload_bytes: usize) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            sessions,
            max_upload_bytes,
        }
    }
}

pub fn build_router(state: GatewayState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/", get(index))
        .route("/capture", post(capture))
        .route("/analyze", post(analyze))
        .route("/api/health", get(health))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(trace_layer)
        .with_state(state)
}

/// Starts the HTTP server and the idle-session sweeper.
#[instrument(skip(state))]
pub async fn start_server(addr: &str, state: GatewayState) -> Result<()> {
    let sessions = state.sessions.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(PRUNE_INTERVAL);
        loop {
            ticker.tick().await;
            sessions.prune_idle(Instant::now()).await;
        }
    });

    let app = build_router(state);
    let listener = TcpListener::bind(addr).await?;
    info!("Gateway HTTP server listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Debug, Deserialize)]
struct IndexQuery {
    session: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnalyzeForm {
    session_id: String,
}

async fn index(State(state): State<GatewayState>, Query(query): Query<IndexQuery>) -> Html<String> {
    let session_id = state.sessions.resolve(query.session.as_deref()).await;
    page(&state, &session_id, None).await
}

/// `POST /capture`: select and decode the submitted image, then hand it to
/// the session.
async fn capture(State(state): State<GatewayState>, multipart: Multipart) -> Response {
    let form = match CaptureForm::read(multipart).await {
        Ok(form) => form,
        Err(e) => {
            warn!(error = %e, "Rejected capture form");
            return e.into_response();
        }
    };
    let session_id = state.sessions.resolve(form.session_id.as_deref()).await;

    let raw = match select_source(form.camera, form.upload) {
        Ok(Some(raw)) => raw,
        Ok(None) => return page(&state, &session_id, None).await.into_response(),
        Err(e) => return reject(&state, &session_id, &e.to_string()).await,
    };

    let image = match CapturedImage::decode(raw) {
        Ok(image) => image,
        Err(e) => {
            CycleLogger::log_event(&session_id, CycleEvent::CycleFailed { error: e.to_string() });
            return reject(&state, &session_id, &e.to_string()).await;
        }
    };
    CycleLogger::log_event(
        &session_id,
        CycleEvent::ImageAcquired {
            origin: origin_label(image.origin()),
            width: image.width(),
            height: image.height(),
        },
    );

    if let SessionState::Analyzing { cycle, .. } = state.sessions.snapshot(&session_id).await {
        CycleLogger::log_event(&session_id, CycleEvent::CycleSuperseded { cycle });
    }

    let effect = state
        .sessions
        .dispatch(&session_id, SessionEvent::ImageProvided(image))
        .await;
    run_effect(&state, &session_id, effect).await;

    page(&state, &session_id, None).await.into_response()
}

/// A failed submission replaces whatever the session was showing.
async fn reject(state: &GatewayState, session_id: &str, message: &str) -> Response {
    state.sessions.dispatch(session_id, SessionEvent::ImageRejected).await;
    page(state, session_id, Some(message)).await.into_response()
}

/// `POST /analyze`: the manual trigger.
async fn analyze(State(state): State<GatewayState>, Form(form): Form<AnalyzeForm>) -> Html<String> {
    let session_id = state.sessions.resolve(Some(&form.session_id)).await;
    let effect = state
        .sessions
        .dispatch(&session_id, SessionEvent::AnalysisRequested)
        .await;
    run_effect(&state, &session_id, effect).await;
    page(&state, &session_id, None).await
}

async fn health(State(state): State<GatewayState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "finsight",
        "version": env!("CARGO_PKG_VERSION"),
        "profile": state.pipeline.profile().to_string(),
        "trigger": state.sessions.trigger().to_string(),
    }))
}

/// Run a started cycle to completion. The cycle runs on its own task so it
/// still reaches the session if the client goes away.
async fn run_effect(state: &GatewayState, session_id: &str, effect: Effect) {
    let Effect::StartAnalysis { cycle, image } = effect else {
        return;
    };

    let task_state = state.clone();
    let task_session = session_id.to_string();
    let handle = tokio::spawn(async move {
        let report = task_state.pipeline.run(&task_session, cycle, &image).await;
        task_state
            .sessions
            .dispatch(&task_session, SessionEvent::AnalysisCompleted { cycle, report })
            .await;
    });

    if let Err(e) = handle.await {
        error!(session = %session_id, cycle, error = %e, "Analysis task failed");
    }
}

async fn page(state: &GatewayState, session_id: &str, notice: Option<&str>) -> Html<String> {
    let snapshot = state.sessions.snapshot(session_id).await;
    Html(render_page(&PageView {
        session_id,
        state: &snapshot,
        trigger: state.sessions.trigger(),
        notice,
    }))
}

fn origin_label(origin: &ImageOrigin) -> String {
    match origin {
        ImageOrigin::Camera => "camera".to_string(),
        ImageOrigin::Upload { filename } => format!("upload:{filename}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use ::image::ImageFormat;
    use finsight_core::{
        AnalysisProfile, TriggerPolicy, VisionError, ACCESS_HINT, ANALYSIS_FAILED_MESSAGE,
    };
    use finsight_tts::{InlineAudioPlayer, MockTts, SpeechRenderer};
    use finsight_vision::{InferenceClient, MockVisionProvider};

    use crate::pipeline::tests::encoded;

    const BOUNDARY: &str = "finsight-test-boundary";

    struct Harness {
        state: GatewayState,
        vision: Arc<MockVisionProvider>,
        tts: Arc<MockTts>,
        audio_dir: tempfile::TempDir,
    }

    impl Harness {
        fn new(vision: MockVisionProvider, tts: MockTts, profile: AnalysisProfile, trigger: TriggerPolicy) -> Self {
            Self::with_limit(vision, tts, profile, trigger, 20 * 1024 * 1024)
        }

        fn with_limit(
            vision: MockVisionProvider,
            tts: MockTts,
            profile: AnalysisProfile,
            trigger: TriggerPolicy,
            max_upload_bytes: usize,
        ) -> Self {
            let audio_dir = tempfile::tempdir().unwrap();
            let vision = Arc::new(vision);
            let tts = Arc::new(tts);
            let renderer =
                SpeechRenderer::new(tts.clone(), Arc::new(InlineAudioPlayer), audio_dir.path(), "en");
            let pipeline = AnalysisPipeline::new(InferenceClient::new(vision.clone(), "gpt-4o-mini"), profile)
                .with_speech(Arc::new(renderer));
            let state = GatewayState::new(pipeline, SessionRegistry::new(trigger), max_upload_bytes);
            Self {
                state,
                vision,
                tts,
                audio_dir,
            }
        }

        async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
            let response = build_router(self.state.clone()).oneshot(request).await.unwrap();
            let status = response.status();
            let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
            (status, String::from_utf8_lossy(&body).into_owned())
        }

        fn audio_files(&self) -> usize {
            std::fs::read_dir(self.audio_dir.path()).unwrap().count()
        }
    }

    enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a str, &'a [u8]),
    }

    fn capture_request(parts: &[Part<'_>]) -> Request<Body> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n").as_bytes(),
                    );
                }
                Part::File(name, filename, data) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                             Content-Type: application/octet-stream\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(data);
                    body.extend_from_slice(b"\r\n");
                }
            }
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/capture")
            .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap()
    }

    fn analyze_request(session_id: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/analyze")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(format!("session_id={session_id}")))
            .unwrap()
    }

    #[tokio::test]
    async fn empty_submission_stays_idle() {
        let h = Harness::new(
            MockVisionProvider::new("mock"),
            MockTts::new(),
            AnalysisProfile::Enhanced,
            TriggerPolicy::Automatic,
        );
        let session = h.state.sessions.resolve(None).await;

        let (status, html) = h
            .send(capture_request(&[
                Part::Text("session_id", &session),
                Part::File("camera", "", b""),
                Part::File("upload", "", b""),
            ]))
            .await;

        assert_eq!(status, StatusCode::OK);
        assert!(!html.contains("Uploaded Image"));
        assert!(matches!(h.state.sessions.snapshot(&session).await, SessionState::Idle));
        assert_eq!(h.vision.calls(), 0);
        assert_eq!(h.tts.calls(), 0);
    }

    #[tokio::test]
    async fn fish_jpeg_is_reported_and_spoken() {
        let report = "# Clownfish\n## Characteristics\n...";
        let summary = "Clownfish, a small orange reef fish.";
        let h = Harness::new(
            MockVisionProvider::new("mock").with_script([Ok(report.to_string()), Ok(summary.to_string())]),
            MockTts::new(),
            AnalysisProfile::Enhanced,
            TriggerPolicy::Automatic,
        );
        let session = h.state.sessions.resolve(None).await;
        let jpeg = encoded(ImageFormat::Jpeg);

        let (status, html) = h
            .send(capture_request(&[
                Part::Text("session_id", &session),
                Part::File("upload", "clownfish.jpg", &jpeg),
            ]))
            .await;

        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("<h3>Analysis Result:</h3>"));
        assert!(html.contains("<h1>Clownfish</h1>\n<h2>Characteristics</h2>\n<p>...</p>"));
        assert!(html.contains("<audio id=\"speech\" controls autoplay src=\"data:audio/mpeg;base64,"));
        assert_eq!(h.vision.calls(), 2);
        assert_eq!(h.tts.texts(), vec![summary]);
        assert_eq!(h.audio_files(), 0);
        assert!(matches!(
            h.state.sessions.snapshot(&session).await,
            SessionState::Displaying { .. }
        ));
    }

    #[tokio::test]
    async fn no_fish_png_still_speaks_summary_unchanged() {
        let summary = "Just rocks and water, no fish here.";
        let h = Harness::new(
            MockVisionProvider::new("mock").with_script([
                Ok("# Image Description\nA rocky shoreline.".to_string()),
                Ok(summary.to_string()),
            ]),
            MockTts::new(),
            AnalysisProfile::Enhanced,
            TriggerPolicy::Automatic,
        );
        let png = encoded(ImageFormat::Png);

        let (_, html) = h.send(capture_request(&[Part::File("camera", "capture.png", &png)])).await;

        assert!(html.contains("<h1>Image Description</h1>\n<p>A rocky shoreline.</p>"));
        assert_eq!(h.vision.calls(), 2);
        assert_eq!(h.tts.texts(), vec![summary]);
    }

    #[tokio::test]
    async fn inference_failure_still_displays() {
        let h = Harness::new(
            MockVisionProvider::new("mock").failing(VisionError::Network("connection refused".into())),
            MockTts::new(),
            AnalysisProfile::Enhanced,
            TriggerPolicy::Automatic,
        );
        let session = h.state.sessions.resolve(None).await;
        let png = encoded(ImageFormat::Png);

        let (status, html) = h
            .send(capture_request(&[
                Part::Text("session_id", &session),
                Part::File("upload", "reef.png", &png),
            ]))
            .await;

        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Error analyzing image: network error: connection refused"));
        assert!(html.contains(ACCESS_HINT));
        assert!(html.contains(ANALYSIS_FAILED_MESSAGE));
        assert!(matches!(
            h.state.sessions.snapshot(&session).await,
            SessionState::Displaying { .. }
        ));
        assert_eq!(h.tts.calls(), 0);
    }

    #[tokio::test]
    async fn speech_failure_keeps_text_and_leaves_no_artifact() {
        let h = Harness::new(
            MockVisionProvider::new("mock").with_response("# Clownfish"),
            MockTts::new().failing("synthesis unavailable"),
            AnalysisProfile::Enhanced,
            TriggerPolicy::Automatic,
        );
        let png = encoded(ImageFormat::Png);

        let (_, html) = h.send(capture_request(&[Part::File("upload", "reef.png", &png)])).await;

        assert!(html.contains("<h1>Clownfish</h1>"));
        assert!(html.contains("Could not play the spoken summary"));
        assert!(!html.contains("<audio"));
        assert_eq!(h.tts.calls(), 1);
        assert_eq!(h.audio_files(), 0);
    }

    #[tokio::test]
    async fn manual_trigger_analyzes_on_each_press() {
        let h = Harness::new(
            MockVisionProvider::new("mock").with_response("No fish detected in this image."),
            MockTts::new(),
            AnalysisProfile::Simple,
            TriggerPolicy::Manual,
        );
        let session = h.state.sessions.resolve(None).await;
        let png = encoded(ImageFormat::Png);

        let (_, html) = h
            .send(capture_request(&[
                Part::Text("session_id", &session),
                Part::File("upload", "reef.png", &png),
            ]))
            .await;
        assert!(html.contains("Analyze Image"));
        assert!(html.contains("Uploaded Image"));
        assert_eq!(h.vision.calls(), 0);

        let (_, html) = h.send(analyze_request(&session)).await;
        assert!(html.contains("No fish detected in this image."));
        assert_eq!(h.vision.calls(), 1);

        h.send(analyze_request(&session)).await;
        assert_eq!(h.vision.calls(), 2);
        assert_eq!(h.tts.calls(), 0);
    }

    #[tokio::test]
    async fn analyze_without_image_is_ignored() {
        let h = Harness::new(
            MockVisionProvider::new("mock"),
            MockTts::new(),
            AnalysisProfile::Simple,
            TriggerPolicy::Manual,
        );
        let session = h.state.sessions.resolve(None).await;

        let (status, _) = h.send(analyze_request(&session)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(h.vision.calls(), 0);
    }

    #[tokio::test]
    async fn unsupported_upload_is_reported() {
        let h = Harness::new(
            MockVisionProvider::new("mock"),
            MockTts::new(),
            AnalysisProfile::Enhanced,
            TriggerPolicy::Automatic,
        );

        let (status, html) = h
            .send(capture_request(&[Part::File("upload", "reef.gif", b"GIF89a")]))
            .await;

        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("unsupported file type"));
        assert_eq!(h.vision.calls(), 0);
    }

    #[tokio::test]
    async fn malformed_image_is_reported() {
        let h = Harness::new(
            MockVisionProvider::new("mock"),
            MockTts::new(),
            AnalysisProfile::Enhanced,
            TriggerPolicy::Automatic,
        );

        let (_, html) = h
            .send(capture_request(&[Part::File("upload", "reef.png", b"definitely not a png")]))
            .await;

        assert!(html.contains("could not decode image"));
        assert_eq!(h.vision.calls(), 0);
    }

    #[tokio::test]
    async fn failed_upload_clears_previous_result() {
        let h = Harness::new(
            MockVisionProvider::new("mock").with_response("# Clownfish"),
            MockTts::new(),
            AnalysisProfile::Simple,
            TriggerPolicy::Automatic,
        );
        let session = h.state.sessions.resolve(None).await;
        let png = encoded(ImageFormat::Png);

        let (_, html) = h
            .send(capture_request(&[
                Part::Text("session_id", &session),
                Part::File("upload", "reef.png", &png),
            ]))
            .await;
        assert!(html.contains("<h1>Clownfish</h1>"));

        let (_, html) = h
            .send(capture_request(&[
                Part::Text("session_id", &session),
                Part::File("upload", "new.png", b"garbage"),
            ]))
            .await;

        assert!(html.contains("could not decode image"));
        assert!(!html.contains("Clownfish"));
        assert!(!html.contains("Uploaded Image"));
        assert!(matches!(h.state.sessions.snapshot(&session).await, SessionState::Idle));

        let (_, html) = h
            .send(capture_request(&[
                Part::Text("session_id", &session),
                Part::File("upload", "reef.gif", b"GIF89a"),
            ]))
            .await;
        assert!(html.contains("unsupported file type"));
        assert!(!html.contains("Uploaded Image"));
        assert_eq!(h.vision.calls(), 1);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let h = Harness::with_limit(
            MockVisionProvider::new("mock"),
            MockTts::new(),
            AnalysisProfile::Enhanced,
            TriggerPolicy::Automatic,
            1024,
        );
        let big = vec![0u8; 8 * 1024];

        let (status, _) = h.send(capture_request(&[Part::File("upload", "reef.png", &big)])).await;

        assert!(status.is_client_error());
        assert_eq!(h.vision.calls(), 0);
    }

    #[tokio::test]
    async fn health_reports_profile_and_trigger() {
        let h = Harness::new(
            MockVisionProvider::new("mock"),
            MockTts::new(),
            AnalysisProfile::Simple,
            TriggerPolicy::Manual,
        );

        let (status, body) = h
            .send(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await;

        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["service"], "finsight");
        assert_eq!(json["profile"], "simple");
        assert_eq!(json["trigger"], "manual");
    }

    #[tokio::test]
    async fn index_opens_a_session() {
        let h = Harness::new(
            MockVisionProvider::new("mock"),
            MockTts::new(),
            AnalysisProfile::Enhanced,
            TriggerPolicy::Automatic,
        );

        let (status, html) = h.send(Request::builder().uri("/").body(Body::empty()).unwrap()).await;

        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Fish Species Identifier"));
        assert_eq!(h.state.sessions.len().await, 1);
    }
}
