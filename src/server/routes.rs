//! Request handlers.
//!
//! Endpoints:
//! - GET /get_pdfs - Collection in compile order
//! - POST /add_pdf - Append a document
//! - POST /remove_pdf - Remove a document
//! - POST /reorder_pdfs - Move a document to a new index
//! - POST /compile_pdf - Compile the collection
//! - GET /pdf_metadata?name= - Metadata for one document
//! - GET /pdf_details - Metadata for the whole collection
//! - GET /available_pdfs - Documents known to the session
//! - POST /refresh_library - Rescan the library
//! - GET /save_report - Current report
//! - POST /load_report?mode= - Apply a report
//! - GET /health - Liveness

use axum::{
    Json, Router,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use super::AppState;
use super::error::ApiError;
use crate::compile::CompileOptions;
use crate::document::DocumentMetadata;
use crate::report::{LoadMode, Report};
use crate::session::DocumentDetails;

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Body of `/add_pdf` and `/remove_pdf`, query of `/pdf_metadata`.
#[derive(Debug, Deserialize)]
pub struct NameRequest {
    /// Document identifier.
    pub name: String,
}

/// Body of `/reorder_pdfs`.
///
/// Indices are signed so a negative index is answered as out of range
/// rather than as an unreadable body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    /// Current position of the document.
    pub old_index: i64,
    /// Position to move it to.
    pub new_index: i64,
}

/// Query of `/load_report`.
#[derive(Debug, Default, Deserialize)]
pub struct LoadQuery {
    /// How the report combines with the current collection.
    #[serde(default)]
    pub mode: LoadMode,
}

/// Reply to collection mutations.
#[derive(Debug, Serialize)]
pub struct CollectionResponse {
    /// Always `true`; failures use the error body.
    pub success: bool,
    /// What was done.
    pub message: String,
    /// Collection after the change.
    pub pdfs: Vec<String>,
}

impl CollectionResponse {
    fn ok(message: String, pdfs: Vec<String>) -> Self {
        Self {
            success: true,
            message,
            pdfs,
        }
    }
}

/// Reply to `/compile_pdf`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileResponse {
    /// Always `true`; failures use the error body.
    pub success: bool,
    /// Summary line.
    pub message: String,
    /// Path of the written file.
    pub output: String,
    /// Documents compiled, in order.
    pub files: Vec<String>,
    /// Pages in the output, covers included.
    pub total_pages: usize,
}

/// Reply to `/load_report`.
#[derive(Debug, Serialize)]
pub struct LoadResponse {
    /// Always `true`; failures use the error body.
    pub success: bool,
    /// Documents appended.
    pub added: Vec<String>,
    /// Documents already present.
    pub skipped: Vec<String>,
    /// Collection after the load.
    pub pdfs: Vec<String>,
}

/// Reply to `/health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok` while the server answers.
    pub status: &'static str,
    /// Crate version.
    pub version: &'static str,
}

/// Read a JSON body, answering unreadable ones with `kind`.
fn body<T>(kind: &'static str, body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::from_json(kind, rejection))
}

/// Read a query string, answering unreadable ones with `kind`.
fn query<T>(kind: &'static str, query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    query
        .map(|Query(value)| value)
        .map_err(|rejection| ApiError::from_query(kind, rejection))
}

fn index(value: i64) -> Result<usize, ApiError> {
    usize::try_from(value).map_err(|_| {
        ApiError::rejected(
            StatusCode::BAD_REQUEST,
            "index_out_of_range",
            format!("Index {value} is out of range"),
        )
    })
}

/// Routes for one session.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/get_pdfs", get(list_pdfs))
        .route("/add_pdf", post(add_pdf))
        .route("/remove_pdf", post(remove_pdf))
        .route("/reorder_pdfs", post(reorder_pdfs))
        .route("/compile_pdf", post(compile_pdf))
        .route("/pdf_metadata", get(pdf_metadata))
        .route("/pdf_details", get(pdf_details))
        .route("/available_pdfs", get(available_pdfs))
        .route("/refresh_library", post(refresh_library))
        .route("/save_report", get(save_report))
        .route("/load_report", post(load_report))
        .route("/health", get(health))
}

async fn list_pdfs(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.session().store().list().await)
}

async fn add_pdf(
    State(state): State<AppState>,
    request: Result<Json<NameRequest>, JsonRejection>,
) -> ApiResult<CollectionResponse> {
    let request = body("invalid_identifier", request)?;
    let pdfs = state.session().store().add(&request.name).await?;
    tracing::info!(name = %request.name, "Document added");
    Ok(Json(CollectionResponse::ok(
        format!("Added {}", request.name),
        pdfs,
    )))
}

async fn remove_pdf(
    State(state): State<AppState>,
    request: Result<Json<NameRequest>, JsonRejection>,
) -> ApiResult<CollectionResponse> {
    let request = body("invalid_identifier", request)?;
    let pdfs = state.session().store().remove(&request.name).await?;
    tracing::info!(name = %request.name, "Document removed");
    Ok(Json(CollectionResponse::ok(
        format!("Removed {}", request.name),
        pdfs,
    )))
}

async fn reorder_pdfs(
    State(state): State<AppState>,
    request: Result<Json<ReorderRequest>, JsonRejection>,
) -> ApiResult<CollectionResponse> {
    let request = body("index_out_of_range", request)?;
    let pdfs = state
        .session()
        .store()
        .reorder(index(request.old_index)?, index(request.new_index)?)
        .await?;
    Ok(Json(CollectionResponse::ok(
        format!("Moved {} to {}", request.old_index, request.new_index),
        pdfs,
    )))
}

async fn compile_pdf(
    State(state): State<AppState>,
    options: Result<Json<CompileOptions>, JsonRejection>,
) -> ApiResult<CompileResponse> {
    let options = body("invalid_options", options)?;
    let session = state.session();
    session.set_options(options.clone()).await;
    let outcome = session.compile(&options).await?;

    Ok(Json(CompileResponse {
        success: true,
        message: format!(
            "Compiled {} file(s) into {} page(s)",
            outcome.files_merged, outcome.total_pages
        ),
        output: outcome.output.display().to_string(),
        files: outcome.files,
        total_pages: outcome.total_pages,
    }))
}

async fn pdf_metadata(
    State(state): State<AppState>,
    request: Result<Query<NameRequest>, QueryRejection>,
) -> ApiResult<DocumentMetadata> {
    let request = query("invalid_identifier", request)?;
    Ok(Json(state.session().store().metadata(&request.name).await?))
}

async fn pdf_details(State(state): State<AppState>) -> Json<Vec<DocumentDetails>> {
    Json(state.session().describe_collection().await)
}

async fn available_pdfs(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.session().store().available().await)
}

async fn refresh_library(State(state): State<AppState>) -> ApiResult<Vec<String>> {
    Ok(Json(state.session().refresh_library().await?))
}

async fn save_report(State(state): State<AppState>) -> Json<Report> {
    Json(state.session().save_report().await)
}

async fn load_report(
    State(state): State<AppState>,
    mode: Result<Query<LoadQuery>, QueryRejection>,
    report: Result<Json<Report>, JsonRejection>,
) -> ApiResult<LoadResponse> {
    let mode = query("unsupported_report", mode)?.mode;
    let report = body("unsupported_report", report)?;
    let session = state.session();
    let summary = session.load_report(&report, mode).await?;

    Ok(Json(LoadResponse {
        success: true,
        added: summary.added,
        skipped: summary.skipped,
        pdfs: session.store().list().await,
    }))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: crate::VERSION,
    })
}
