//! HTTP router tests driven through `tower::ServiceExt::oneshot`.

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use pdfstack::server::{AppState, router};

use crate::common::{library, page_count, session_for};

fn app(dir: &tempfile::TempDir) -> Router {
    router(AppState::new(session_for(dir)))
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    send(app, method, uri, body.map(|body| body.to_string())).await
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<String>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn add(app: &Router, name: &str) -> (StatusCode, Value) {
    call(app, Method::POST, "/add_pdf", Some(json!({ "name": name }))).await
}

#[tokio::test]
async fn test_health() {
    let dir = library(&[]);
    let (status, body) = call(&app(&dir), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], pdfstack::VERSION);
}

#[tokio::test]
async fn test_add_list_and_duplicate() {
    let dir = library(&[("a.pdf", 1)]);
    let app = app(&dir);

    let (status, body) = add(&app, "a.pdf").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["pdfs"], json!(["a.pdf"]));

    let (status, body) = add(&app, "a.pdf").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "duplicate");

    let (_, body) = call(&app, Method::GET, "/get_pdfs", None).await;
    assert_eq!(body, json!(["a.pdf"]));
}

#[tokio::test]
async fn test_add_empty_name_rejected() {
    let dir = library(&[]);
    let (status, body) = add(&app(&dir), "  ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_identifier");
}

#[tokio::test]
async fn test_remove_unknown_is_not_found() {
    let dir = library(&[]);
    let (status, body) = call(
        &app(&dir),
        Method::POST,
        "/remove_pdf",
        Some(json!({ "name": "ghost.pdf" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_reorder_and_out_of_range() {
    let dir = library(&[]);
    let app = app(&dir);
    for name in ["a.pdf", "b.pdf", "c.pdf"] {
        add(&app, name).await;
    }

    let (status, body) = call(
        &app,
        Method::POST,
        "/reorder_pdfs",
        Some(json!({ "oldIndex": 0, "newIndex": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pdfs"], json!(["b.pdf", "c.pdf", "a.pdf"]));

    let (status, body) = call(
        &app,
        Method::POST,
        "/reorder_pdfs",
        Some(json!({ "oldIndex": 0, "newIndex": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "index_out_of_range");

    let (_, body) = call(&app, Method::GET, "/get_pdfs", None).await;
    assert_eq!(body, json!(["b.pdf", "c.pdf", "a.pdf"]));
}

#[tokio::test]
async fn test_metadata_endpoint() {
    let dir = library(&[("two.pdf", 2)]);
    let app = app(&dir);
    add(&app, "two.pdf").await;

    let (status, body) = call(&app, Method::GET, "/pdf_metadata?name=two.pdf", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pageCount"], 2);
    assert!(body["sizeBytes"].as_u64().unwrap() > 0);

    let (status, body) = call(&app, Method::GET, "/pdf_metadata?name=nope.pdf", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_compile_endpoint() {
    let dir = library(&[("a.pdf", 2), ("b.pdf", 1)]);
    let app = app(&dir);
    add(&app, "a.pdf").await;
    add(&app, "b.pdf").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/compile_pdf",
        Some(json!({
            "useCoverPages": true,
            "coverPages": "",
            "outputName": "handout"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["files"], json!(["a.pdf", "b.pdf"]));
    assert_eq!(body["totalPages"], 4);

    let output = dir.path().join("out").join("handout.pdf");
    assert_eq!(body["output"], output.display().to_string());
    assert_eq!(page_count(&output), 4);
}

#[tokio::test]
async fn test_compile_empty_collection() {
    let dir = library(&[]);
    let (status, body) = call(
        &app(&dir),
        Method::POST,
        "/compile_pdf",
        Some(json!({ "useCoverPages": false, "coverPages": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "empty_collection");
}

#[tokio::test]
async fn test_compile_invalid_cover_spec() {
    let dir = library(&[("a.pdf", 1)]);
    let app = app(&dir);
    add(&app, "a.pdf").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/compile_pdf",
        Some(json!({ "useCoverPages": true, "coverPages": "first two" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_options");
}

#[tokio::test]
async fn test_save_and_load_report() {
    let dir = library(&[]);
    let app = app(&dir);
    add(&app, "a.pdf").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/load_report",
        Some(json!({
            "version": 1,
            "pdfs": ["a.pdf", "b.pdf"],
            "useCoverPages": true,
            "coverPages": "1-2"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["added"], json!(["b.pdf"]));
    assert_eq!(body["skipped"], json!(["a.pdf"]));
    assert_eq!(body["pdfs"], json!(["a.pdf", "b.pdf"]));

    let (status, report) = call(&app, Method::GET, "/save_report", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["version"], 1);
    assert_eq!(report["pdfs"], json!(["a.pdf", "b.pdf"]));
    assert_eq!(report["useCoverPages"], true);
    assert_eq!(report["coverPages"], "1-2");
    assert_eq!(report["coverPlacement"], "once");
}

#[tokio::test]
async fn test_load_report_replace_mode() {
    let dir = library(&[]);
    let app = app(&dir);
    add(&app, "old.pdf").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/load_report?mode=replace",
        Some(json!({ "pdfs": ["new.pdf"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pdfs"], json!(["new.pdf"]));
}

#[tokio::test]
async fn test_load_report_future_version() {
    let dir = library(&[]);
    let (status, body) = call(
        &app(&dir),
        Method::POST,
        "/load_report",
        Some(json!({ "version": 99, "pdfs": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "unsupported_report");
}

#[tokio::test]
async fn test_available_and_refresh() {
    let dir = library(&[("x.pdf", 1), ("y.pdf", 1)]);
    let app = app(&dir);

    let (_, body) = call(&app, Method::GET, "/available_pdfs", None).await;
    assert_eq!(body, json!([]));

    let (status, body) = call(&app, Method::POST, "/refresh_library", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["x.pdf", "y.pdf"]));
}

#[tokio::test]
async fn test_pdf_details() {
    let dir = library(&[("a.pdf", 3)]);
    let app = app(&dir);
    add(&app, "a.pdf").await;
    add(&app, "missing.pdf").await;

    let (status, body) = call(&app, Method::GET, "/pdf_details", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "a.pdf");
    assert_eq!(body[0]["metadata"]["pageCount"], 3);
    assert_eq!(body[1]["name"], "missing.pdf");
    assert!(body[1]["error"].is_string());
}

#[tokio::test]
async fn test_malformed_report_body_is_tagged() {
    let dir = library(&[]);
    let (status, body) = send(
        &app(&dir),
        Method::POST,
        "/load_report",
        Some("{not json".to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "unsupported_report");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_unknown_load_mode_is_tagged() {
    let dir = library(&[]);
    let (status, body) = call(
        &app(&dir),
        Method::POST,
        "/load_report?mode=sideways",
        Some(json!({ "pdfs": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "unsupported_report");
}

#[tokio::test]
async fn test_negative_reorder_index() {
    let dir = library(&[]);
    let app = app(&dir);
    add(&app, "a.pdf").await;
    add(&app, "b.pdf").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/reorder_pdfs",
        Some(json!({ "oldIndex": -1, "newIndex": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "index_out_of_range");

    let (_, body) = call(&app, Method::GET, "/get_pdfs", None).await;
    assert_eq!(body, json!(["a.pdf", "b.pdf"]));
}

#[tokio::test]
async fn test_add_without_name_is_tagged() {
    let dir = library(&[]);
    let (status, body) = call(&app(&dir), Method::POST, "/add_pdf", Some(json!({}))).await;
    assert!(status.is_client_error());
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "invalid_identifier");
}

#[tokio::test]
async fn test_metadata_without_name_is_tagged() {
    let dir = library(&[]);
    let (status, body) = call(&app(&dir), Method::GET, "/pdf_metadata", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_identifier");
}

#[tokio::test]
async fn test_add_outside_library_rejected() {
    let dir = library(&[]);
    let app = app(&dir);
    for name in ["../secret.pdf", "/etc/secret.pdf"] {
        let (status, body) = add(&app, name).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_identifier");
    }
    let (_, body) = call(&app, Method::GET, "/available_pdfs", None).await;
    assert_eq!(body, json!([]));
}
