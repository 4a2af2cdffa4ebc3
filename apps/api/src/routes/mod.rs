pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::cv::handlers;
use crate::extraction::upload::MULTIPART_OVERHEAD_BYTES;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(health::health_handler))
        // Extraction
        .route(
            "/api/extract-cv",
            post(handlers::handle_extract_cv).layer(DefaultBodyLimit::max(upload_limit)),
        )
        // Editing
        .route(
            "/api/cv",
            get(handlers::handle_get_cv).put(handlers::handle_put_cv),
        )
        .route("/api/cv/actions", post(handlers::handle_dispatch))
        .route("/api/cv/events", get(handlers::handle_events))
        // Rendering
        .route("/api/cv/document", get(handlers::handle_get_document))
        .route("/api/cv/preview", get(handlers::handle_preview))
        .route("/api/cv/export", get(handlers::handle_export))
        .route("/api/generate-cv", post(handlers::handle_generate_cv))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio_stream::StreamExt;
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::cv::store::CvStore;
    use crate::extraction::{ExtractionError, ExtractionGateway};
    use crate::layout::default_page_config;
    use crate::llm_client::LlmError;
    use crate::render::{HtmlPreview, PdfExport};

    const FAKE_PDF: &[u8] = b"%PDF-1.4\n% test fixture\n%%EOF\n";

    enum Reply {
        Text(String),
        Transport,
        Unreadable,
    }

    struct StubGateway {
        reply: Reply,
        calls: AtomicUsize,
        seen: Mutex<Option<PathBuf>>,
    }

    impl StubGateway {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: AtomicUsize::new(0),
                seen: Mutex::new(None),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn seen_path(&self) -> PathBuf {
            self.seen.lock().unwrap().clone().unwrap()
        }
    }

    #[async_trait]
    impl ExtractionGateway for StubGateway {
        async fn extract(&self, pdf: &Path) -> Result<String, ExtractionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(pdf.exists(), "staged upload must exist during extraction");
            *self.seen.lock().unwrap() = Some(pdf.to_path_buf());
            match &self.reply {
                Reply::Text(text) => Ok(text.clone()),
                Reply::Transport => Err(LlmError::EmptyContent.into()),
                Reply::Unreadable => Err(ExtractionError::UnreadablePdf("bad xref".to_string())),
            }
        }
    }

    struct Harness {
        app: Router,
        state: AppState,
        gateway: Arc<StubGateway>,
        upload_dir: TempDir,
    }

    impl Harness {
        fn new(reply: Reply) -> Self {
            Self::with_limit(reply, crate::config::DEFAULT_MAX_UPLOAD_BYTES)
        }

        fn with_limit(reply: Reply, max_upload_bytes: usize) -> Self {
            let upload_dir = tempfile::tempdir().unwrap();
            let mut config = Config::for_tests(upload_dir.path().to_path_buf());
            config.max_upload_bytes = max_upload_bytes;
            let gateway = StubGateway::new(reply);
            let state = AppState {
                config,
                store: Arc::new(CvStore::new()),
                gateway: gateway.clone(),
                preview: Arc::new(HtmlPreview::new(default_page_config()).unwrap()),
                export: Arc::new(PdfExport::new(default_page_config())),
            };
            Self {
                app: build_router(state.clone()),
                state,
                gateway,
                upload_dir,
            }
        }

        async fn send(&self, request: Request<Body>) -> Response {
            self.app.clone().oneshot(request).await.unwrap()
        }

        fn staged_files(&self) -> usize {
            std::fs::read_dir(self.upload_dir.path()).unwrap().count()
        }
    }

    fn multipart(field: &str, content_type: &str, contents: &[u8]) -> Request<Body> {
        let boundary = "cv-test-boundary";
        let mut body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"resume.pdf\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(contents);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/extract-cv")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn json_request(method: &str, uri: &str, payload: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    fn sample_record() -> Value {
        json!({
            "personalInfo": {"firstName": "Ada", "lastName": "Lovelace", "jobTitle": "Engineer"},
            "skills": ["Rust", "Go", "SQL"],
            "experiences": [{"position": "Dev", "company": "Acme", "period": "2020", "description": "Built things"}],
            "degrees": []
        })
    }

    #[tokio::test]
    async fn test_health() {
        let h = Harness::new(Reply::Text(String::new()));
        let response = h.send(get("/health")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["revision"], 0);
    }

    #[tokio::test]
    async fn test_extract_loads_record_and_removes_upload() {
        let answer = "Here you go:\n```json\n{\"skills\": [\"Rust\", \"Go\"], \"experiences\": null,}\n```";
        let h = Harness::new(Reply::Text(answer.to_string()));

        let response = h.send(multipart("cv", "application/pdf", FAKE_PDF)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let record = body_json(response).await;
        assert_eq!(record["skills"], json!(["Rust", "Go"]));
        assert_eq!(record["experiences"], json!([]));
        assert_eq!(record["degrees"], json!([]));

        assert_eq!(h.gateway.calls(), 1);
        assert!(!h.gateway.seen_path().exists());
        assert_eq!(h.staged_files(), 0);

        let session = body_json(h.send(get("/api/cv")).await).await;
        assert_eq!(session["record"]["skills"], json!(["Rust", "Go"]));
        assert_eq!(session["revision"], 1);
        assert_eq!(session["extracting"], false);
        assert!(!h.state.store.is_extracting());
    }

    #[tokio::test]
    async fn test_blank_answer_loads_default_record() {
        let h = Harness::new(Reply::Text(String::new()));
        let response = h.send(multipart("cv", "application/pdf", FAKE_PDF)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let record = body_json(response).await;
        assert_eq!(record["skills"], json!([]));
        assert_eq!(record["personalInfo"]["firstName"], "");
    }

    #[tokio::test]
    async fn test_transport_failure_is_bad_gateway_and_keeps_session() {
        let h = Harness::new(Reply::Transport);
        let put = h.send(json_request("PUT", "/api/cv", sample_record())).await;
        assert_eq!(put.status(), StatusCode::OK);

        let response = h.send(multipart("cv", "application/pdf", FAKE_PDF)).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "EXTRACTION_FAILED");
        assert_eq!(body["error"]["message"], "processing failed, please retry");

        assert_eq!(h.staged_files(), 0);
        let session = h.state.store.snapshot();
        assert_eq!(session.revision, 1);
        assert_eq!(session.record.unwrap().personal_info.first_name, "Ada");
        assert!(!h.state.store.is_extracting());
    }

    #[tokio::test]
    async fn test_unreadable_pdf_is_unprocessable() {
        let h = Harness::new(Reply::Unreadable);
        let response = h.send(multipart("cv", "application/pdf", FAKE_PDF)).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(h.staged_files(), 0);
        assert!(h.state.store.snapshot().record.is_none());
    }

    #[tokio::test]
    async fn test_invalid_uploads_are_rejected_before_extraction() {
        let h = Harness::with_limit(Reply::Text("{}".to_string()), 1024);

        let wrong_type = h.send(multipart("cv", "text/plain", b"hello")).await;
        assert_eq!(wrong_type.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let missing = h.send(multipart("resume", "application/pdf", FAKE_PDF)).await;
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

        let not_pdf = h.send(multipart("cv", "application/pdf", b"GIF89a....")).await;
        assert_eq!(not_pdf.status(), StatusCode::BAD_REQUEST);

        let mut big = FAKE_PDF.to_vec();
        big.resize(4096, b' ');
        let oversize = h.send(multipart("cv", "application/pdf", &big)).await;
        assert_eq!(oversize.status(), StatusCode::PAYLOAD_TOO_LARGE);

        assert_eq!(h.gateway.calls(), 0);
        assert_eq!(h.staged_files(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_extraction_is_conflict() {
        let h = Harness::new(Reply::Text("{}".to_string()));
        let _running = h.state.store.begin_extraction().unwrap();

        let response = h.send(multipart("cv", "application/pdf", FAKE_PDF)).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(h.gateway.calls(), 0);
    }

    #[tokio::test]
    async fn test_actions_before_load_are_not_found() {
        let h = Harness::new(Reply::Text(String::new()));
        let response = h
            .send(json_request(
                "POST",
                "/api/cv/actions",
                json!({"type": "beginEdit", "section": "skills"}),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let document = h.send(get("/api/cv/document")).await;
        assert_eq!(document.status(), StatusCode::NOT_FOUND);
        let export = h.send(get("/api/cv/export")).await;
        assert_eq!(export.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_edit_cycle_through_actions() {
        let h = Harness::new(Reply::Text(String::new()));
        h.send(json_request("PUT", "/api/cv", sample_record())).await;

        let begin = h
            .send(json_request(
                "POST",
                "/api/cv/actions",
                json!({"type": "beginEdit", "section": "skills"}),
            ))
            .await;
        assert_eq!(begin.status(), StatusCode::OK);
        assert_eq!(body_json(begin).await["editing"]["skills"], true);

        let removed = h
            .send(json_request(
                "POST",
                "/api/cv/actions",
                json!({"type": "removeItem", "section": "skills", "index": 1}),
            ))
            .await;
        assert_eq!(removed.status(), StatusCode::OK);
        let session = body_json(removed).await;
        assert_eq!(session["record"]["skills"], json!(["Rust", "SQL"]));
        assert_eq!(session["revision"], 3);

        let out_of_range = h
            .send(json_request(
                "POST",
                "/api/cv/actions",
                json!({"type": "removeItem", "section": "skills", "index": 7}),
            ))
            .await;
        assert_eq!(out_of_range.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(out_of_range).await["error"]["code"], "INVALID_ARGUMENT");
        assert_eq!(h.state.store.snapshot().revision, 3);

        let renamed = h
            .send(json_request(
                "POST",
                "/api/cv/actions",
                json!({
                    "type": "updateItem",
                    "section": "personalInfo",
                    "key": "firstName",
                    "value": "Grace"
                }),
            ))
            .await;
        assert_eq!(renamed.status(), StatusCode::OK);
        assert_eq!(body_json(renamed).await["record"]["personalInfo"]["firstName"], "Grace");
    }

    #[tokio::test]
    async fn test_document_and_preview_follow_session() {
        let h = Harness::new(Reply::Text(String::new()));
        h.send(json_request("PUT", "/api/cv", sample_record())).await;

        let document = body_json(h.send(get("/api/cv/document")).await).await;
        let kinds: Vec<&str> = document["sections"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["kind"].as_str().unwrap())
            .collect();
        assert_eq!(kinds, vec!["header", "skills", "experience"]);

        let preview = h.send(get("/api/cv/preview")).await;
        assert_eq!(preview.status(), StatusCode::OK);
        assert!(preview.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/html"));
        let html = String::from_utf8(body_bytes(preview).await).unwrap();
        assert!(html.contains(">Ada Lovelace</div>"));
    }

    #[tokio::test]
    async fn test_export_is_pdf_attachment() {
        let h = Harness::new(Reply::Text(String::new()));
        h.send(json_request("PUT", "/api/cv", sample_record())).await;

        let response = h.send(get("/api/cv/export")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"cv.pdf\""
        );
        assert!(body_bytes(response).await.starts_with(b"%PDF-"));
    }

    #[tokio::test]
    async fn test_generate_cv_does_not_touch_session() {
        let h = Harness::new(Reply::Text(String::new()));
        let response = h
            .send(json_request("POST", "/api/generate-cv", sample_record()))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_bytes(response).await.starts_with(b"%PDF-"));
        assert!(h.state.store.snapshot().record.is_none());
    }

    #[tokio::test]
    async fn test_posted_load_is_normalized() {
        let h = Harness::new(Reply::Text(String::new()));
        let response = h
            .send(json_request(
                "POST",
                "/api/cv/actions",
                json!({
                    "type": "load",
                    "record": {
                        "personalInfo": {"firstName": "  Ada  "},
                        "skills": ["  Rust ", "", "   "]
                    }
                }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let session = body_json(response).await;
        assert_eq!(session["record"]["personalInfo"]["firstName"], "Ada");
        assert_eq!(session["record"]["skills"], json!(["Rust"]));
    }

    async fn next_event(body: &mut axum::body::BodyDataStream) -> String {
        let mut event = String::new();
        while !event.contains("\n\n") {
            let chunk = tokio::time::timeout(Duration::from_secs(5), body.next())
                .await
                .expect("timed out waiting for an event")
                .expect("event stream ended")
                .unwrap();
            event.push_str(std::str::from_utf8(&chunk).unwrap());
        }
        event
    }

    #[tokio::test]
    async fn test_events_stream_published_snapshots() {
        let h = Harness::new(Reply::Text(String::new()));
        h.send(json_request("PUT", "/api/cv", sample_record())).await;

        let response = h.send(get("/api/cv/events")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/event-stream"));
        let mut body = response.into_body().into_data_stream();

        let current = next_event(&mut body).await;
        assert!(current.contains("event: session"), "{current}");
        assert!(current.contains("\"revision\":1"), "{current}");

        let begin = h
            .send(json_request(
                "POST",
                "/api/cv/actions",
                json!({"type": "beginEdit", "section": "skills"}),
            ))
            .await;
        assert_eq!(begin.status(), StatusCode::OK);

        let published = next_event(&mut body).await;
        assert!(published.contains("\"revision\":2"), "{published}");
        assert!(published.contains("\"skills\":true"), "{published}");
    }
}
