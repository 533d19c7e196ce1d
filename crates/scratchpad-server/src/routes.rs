//! Route definitions for the note API.

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::{catch_panic::CatchPanicLayer, services::ServeDir, trace::TraceLayer};

use crate::handlers;
use crate::middleware::capture;
use crate::state::AppState;

/// Create the application router: the note API, the health document and the
/// static frontend, all behind the request interceptor.
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/folders",
            get(handlers::list_folders)
                .post(handlers::create_folder)
                .fallback(handlers::method_not_allowed),
        )
        .route(
            "/files",
            get(handlers::list_files).fallback(handlers::method_not_allowed),
        )
        .route(
            "/file",
            get(handlers::read_file).fallback(handlers::method_not_allowed),
        )
        .route(
            "/file/save",
            post(handlers::save_file).fallback(handlers::method_not_allowed),
        )
        .route(
            "/file/move",
            post(handlers::move_file).fallback(handlers::method_not_allowed),
        )
        .route(
            "/file/delete",
            post(handlers::delete_file).fallback(handlers::method_not_allowed),
        )
        .route("/healthz", get(handlers::healthz))
        .fallback_service(ServeDir::new(state.static_dir()));

    audited(api, state)
}

/// Wrap `router` with panic containment, HTTP tracing and the interceptor.
///
/// The interceptor is the outermost layer, so every request is captured,
/// including ones whose handler panicked.
pub fn audited(router: Router<AppState>, state: AppState) -> Router {
    router
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn_with_state(state.clone(), capture))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::NoteStore;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use scratchpad_audit::{EventWriter, SystemClock};
    use std::fs;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(dir: &tempfile::TempDir) -> Router {
        fs::create_dir_all(dir.path().join("data")).unwrap();
        fs::create_dir_all(dir.path().join("frontend")).unwrap();
        fs::write(dir.path().join("frontend/index.html"), "<p>scratchpad</p>").unwrap();

        let state = AppState::new(
            NoteStore::new(dir.path().join("data")),
            dir.path().join("frontend"),
            Arc::new(EventWriter::disabled()),
            Arc::new(SystemClock),
        );
        create_router(state)
    }

    fn json_post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_note_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);

        let response = app.clone().oneshot(json_post("/folders", r#"{"name":"q3"}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(json_post("/file/save", r#"{"path":"q3/plan.txt","content":"budget"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.clone().oneshot(get("/files?folder=q3")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, r#"["plan.txt"]"#);

        let response = app.clone().oneshot(get("/file?path=q3/plan.txt")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "text/plain");
        assert_eq!(body_text(response).await, "budget");

        let response = app
            .clone()
            .oneshot(json_post("/file/move", r#"{"from":"q3/plan.txt","to":"plan.txt"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(json_post("/file/delete", r#"{"path":"plan.txt"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!dir.path().join("data/plan.txt").exists());
    }

    #[tokio::test]
    async fn test_list_folders() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);
        fs::create_dir_all(dir.path().join("data/q3/reviews")).unwrap();

        let response = app.oneshot(get("/folders")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, r#"["q3","q3/reviews"]"#);
    }

    #[tokio::test]
    async fn test_missing_folder_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(&dir).oneshot(get("/files?folder=nope")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(response).await, "Folder not found");
    }

    #[tokio::test]
    async fn test_traversal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);

        let response = app.clone().oneshot(get("/file?path=../secret.txt")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "Invalid file path");

        let response = app
            .oneshot(json_post("/folders", r#"{"name":"../../tmp"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "Invalid folder path");
    }

    #[tokio::test]
    async fn test_bad_payloads() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);

        for (uri, body) in [
            ("/folders", "not json"),
            ("/folders", r#"{"name":""}"#),
            ("/file/save", r#"{"content":"x"}"#),
            ("/file/move", r#"{"from":"a.txt"}"#),
        ] {
            let response = app.clone().oneshot(json_post(uri, body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri} {body}");
            assert_eq!(body_text(response).await, "Bad request");
        }
    }

    #[tokio::test]
    async fn test_unsupported_method() {
        let dir = tempfile::tempdir().unwrap();
        let request = Request::builder()
            .method("DELETE")
            .uri("/folders")
            .body(Body::empty())
            .unwrap();

        let response = app(&dir).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body_text(response).await, "Method not allowed");
    }

    #[tokio::test]
    async fn test_static_frontend() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(&dir).oneshot(get("/index.html")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "<p>scratchpad</p>");
    }

    #[tokio::test]
    async fn test_healthz_reports_disabled_capture() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(&dir).oneshot(get("/healthz")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["ok"], true);
        assert_eq!(body["audit"], "disabled");
    }
}
