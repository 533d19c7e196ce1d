//! End-to-end tests for request evidence capture.
//!
//! Each test drives the full router in-process and inspects the evidence
//! store the interceptor wrote to.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use chrono::{TimeZone, Utc};
use scratchpad_audit::{AuditEvent, EventWriter, FixedClock, MemoryDiagnostics, Severity};
use scratchpad_server::{AppState, NoteStore, audited, create_router};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

struct Harness {
    _dir: tempfile::TempDir,
    evidence: PathBuf,
    diagnostics: Arc<MemoryDiagnostics>,
    state: AppState,
}

impl Harness {
    fn new(create_evidence_root: bool) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        let evidence = dir.path().join("evidence");
        fs::create_dir(&data).unwrap();
        if create_evidence_root {
            fs::create_dir(&evidence).unwrap();
        }

        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 10, 16, 9, 30, 0).unwrap(),
        ));
        let diagnostics = Arc::new(MemoryDiagnostics::new());
        let writer = EventWriter::new(&evidence, clock.clone(), diagnostics.clone());
        let state = AppState::new(
            NoteStore::new(&data),
            dir.path().join("frontend"),
            Arc::new(writer),
            clock,
        );

        Self {
            _dir: dir,
            evidence,
            diagnostics,
            state,
        }
    }

    fn app(&self) -> Router {
        create_router(self.state.clone())
    }

    fn store(&self) -> PathBuf {
        self.evidence.join("requests_2025-10-16.log")
    }
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Wait until `path` holds at least `count` lines, then return its events.
async fn wait_for_events(path: &Path, count: usize) -> Vec<AuditEvent> {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let content = fs::read_to_string(path).unwrap_or_default();
        if content.lines().count() >= count || tokio::time::Instant::now() > deadline {
            return content
                .lines()
                .map(|line| AuditEvent::from_json_line(line).unwrap())
                .collect();
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

async fn wait_for_errors(diagnostics: &MemoryDiagnostics, count: usize) -> usize {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while diagnostics.count(Severity::Error) < count && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    // Give a stray duplicate a chance to show up.
    tokio::time::sleep(Duration::from_millis(50)).await;
    diagnostics.count(Severity::Error)
}

#[tokio::test]
async fn test_each_request_appends_one_line() {
    let harness = Harness::new(true);
    let app = harness.app();

    let response = app.clone().oneshot(get_request("/folders")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    wait_for_events(&harness.store(), 1).await;

    let response = app
        .clone()
        .oneshot(post_json("/folders", r#"{"name":"q3"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    wait_for_events(&harness.store(), 2).await;

    let response = app
        .clone()
        .oneshot(get_request("/files?folder=nope"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let events = wait_for_events(&harness.store(), 3).await;
    let summary: Vec<_> = events
        .iter()
        .map(|e| (e.method.as_str(), e.path.as_str(), e.status))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("GET", "/folders", 200),
            ("POST", "/folders", 201),
            ("GET", "/files", 404),
        ]
    );

    for event in &events {
        assert_eq!(event.timestamp, Utc.with_ymd_and_hms(2025, 10, 16, 9, 30, 0).unwrap());
        assert_eq!(event.remote_identity, "unknown");
    }

    let raw = fs::read_to_string(harness.store()).unwrap();
    let first: serde_json::Value = serde_json::from_str(raw.lines().next().unwrap()).unwrap();
    let mut keys: Vec<_> = first.as_object().unwrap().keys().cloned().collect();
    keys.sort();
    assert_eq!(
        keys,
        vec!["duration", "method", "path", "remote_identity", "status", "timestamp"]
    );
    assert_eq!(first["timestamp"], "2025-10-16T09:30:00Z");
    assert_eq!(harness.diagnostics.count(Severity::Error), 0);
}

#[tokio::test]
async fn test_missing_evidence_root_does_not_affect_responses() {
    let harness = Harness::new(false);

    let response = harness.app().oneshot(get_request("/folders")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(wait_for_errors(&harness.diagnostics, 1).await, 1);
    assert!(!harness.evidence.exists());
    assert!(
        harness.diagnostics.messages(Severity::Error)[0].contains("audit path missing or invalid")
    );
}

#[tokio::test]
async fn test_concurrent_requests_each_get_a_line() {
    let harness = Harness::new(true);
    let app = harness.app();

    let mut tasks = Vec::new();
    for i in 0..40 {
        let app = app.clone();
        tasks.push(tokio::spawn(async move {
            let uri = if i % 2 == 0 {
                "/folders".to_string()
            } else {
                format!("/file?path=missing-{i}.txt")
            };
            app.oneshot(get_request(&uri)).await.unwrap().status()
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let events = wait_for_events(&harness.store(), 40).await;
    assert_eq!(events.len(), 40);
    assert_eq!(events.iter().filter(|e| e.status == 200).count(), 20);
    assert_eq!(events.iter().filter(|e| e.status == 404).count(), 20);
}

#[tokio::test]
async fn test_unsupported_method_is_captured() {
    let harness = Harness::new(true);
    let request = Request::builder()
        .method("PUT")
        .uri("/file/save")
        .body(Body::empty())
        .unwrap();

    let response = harness.app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let events = wait_for_events(&harness.store(), 1).await;
    assert_eq!(events[0].method, "PUT");
    assert_eq!(events[0].status, 405);
}

async fn boom() -> &'static str {
    panic!("handler failure")
}

#[tokio::test]
async fn test_panicking_handler_is_captured_as_500() {
    let harness = Harness::new(true);
    let router = Router::new().route("/boom", get(boom));
    let app = audited(router, harness.state.clone());

    let response = app.oneshot(get_request("/boom")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let events = wait_for_events(&harness.store(), 1).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].path, "/boom");
    assert_eq!(events[0].status, 500);
}

#[tokio::test]
async fn test_healthz_reports_degraded_capture() {
    let harness = Harness::new(false);
    let app = harness.app();

    app.clone().oneshot(get_request("/folders")).await.unwrap();
    wait_for_errors(&harness.diagnostics, 1).await;

    let response = app.oneshot(get_request("/healthz")).await.unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["audit"], "degraded");
    assert_eq!(body["audit_failures"], 1);
}
