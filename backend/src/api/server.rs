//! HTTP server for the merge API.
//!
//! Each request carries its own four uploads; nothing is kept between
//! requests apart from the log stream.
//!
//! # API Endpoints
//!
//! | Method | Path          | Description                                   |
//! |--------|---------------|-----------------------------------------------|
//! | GET    | `/health`     | Health check                                  |
//! | POST   | `/api/merge`  | Merge pre/post exports, return summary counts |
//! | POST   | `/api/export` | Merge pre/post exports, return the workbook   |
//! | GET    | `/api/logs`   | SSE stream for real-time logs                 |
//!
//! Multipart fields: `pre_values`, `pre_labels`, `post_values`, `post_labels`.

use axum::{
    extract::{DefaultBodyLimit, Multipart},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, LOG_BROADCASTER};
use super::types::{error_response, MergeResponse};
use crate::error::ServerError;
use crate::transform::pipeline::{process_survey, Dataset, DatasetKind, SurveyResult, WORKBOOK_FILE_NAME};

/// Largest accepted request body (all four CSV files together).
const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const UPLOAD_FIELDS: [&str; 4] = ["pre_values", "pre_labels", "post_values", "post_labels"];

type ApiError = (StatusCode, Json<Value>);

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Pipeline(e) if e.is_format_error() => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::Pipeline(crate::error::PipelineError::Csv { .. }) => StatusCode::BAD_REQUEST,
            ServerError::Pipeline(_) | ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn into_api_error(self) -> ApiError {
        log_error(self.to_string());
        (self.status(), Json(error_response(&self.to_string())))
    }
}

/// Build the router (separate from [`start_server`] so it can be exercised in tests).
pub fn router() -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/merge", post(merge_uploads))
        .route("/api/export", post(export_workbook))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
}

/// Start the HTTP server
pub async fn start_server(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 Qualtrics merge server running on http://localhost:{}", port);
    println!("   POST /api/merge  - Merge pre/post exports (JSON summary)");
    println!("   POST /api/export - Merge pre/post exports (xlsx download)");
    println!("   GET  /api/logs   - SSE log stream");
    println!("   GET  /health     - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router()).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "qualtrics-merge",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "merge": "POST /api/merge",
            "export": "POST /api/export",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Merge endpoint: JSON summary counts, warnings and previews.
async fn merge_uploads(multipart: Multipart) -> Result<Json<MergeResponse>, ApiError> {
    let result = run_survey(multipart).await.map_err(ServerError::into_api_error)?;
    Ok(Json(MergeResponse::from(&result)))
}

/// Export endpoint: the combined workbook as an attachment.
async fn export_workbook(multipart: Multipart) -> Result<impl IntoResponse, ApiError> {
    let result = run_survey(multipart).await.map_err(ServerError::into_api_error)?;
    let bytes = result
        .workbook()
        .map_err(|e| ServerError::Internal(e.to_string()).into_api_error())?;

    let disposition = format!("attachment; filename=\"{}\"", WORKBOOK_FILE_NAME);
    Ok((
        [(header::CONTENT_TYPE, XLSX_MIME.to_string()), (header::CONTENT_DISPOSITION, disposition)],
        bytes,
    ))
}

async fn run_survey(multipart: Multipart) -> Result<SurveyResult, ServerError> {
    let [pre_values, pre_labels, post_values, post_labels] = read_uploads(multipart).await?;

    println!("\n{}", "=".repeat(70));
    println!(
        "📄 NEW UPLOAD: pre {} + {} bytes, post {} + {} bytes",
        pre_values.len(),
        pre_labels.len(),
        post_values.len(),
        post_labels.len()
    );
    println!("{}\n", "=".repeat(70));

    let pre = Dataset::new(DatasetKind::Pre, pre_values, pre_labels);
    let post = Dataset::new(DatasetKind::Post, post_values, post_labels);
    Ok(process_survey(&pre, &post)?)
}

/// Collect the four CSV uploads, in [`UPLOAD_FIELDS`] order.
async fn read_uploads(mut multipart: Multipart) -> Result<[Vec<u8>; 4], ServerError> {
    let mut files: [Option<Vec<u8>>; 4] = Default::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        let Some(slot) = UPLOAD_FIELDS.iter().position(|f| *f == name) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServerError::BadRequest(format!("Read error on '{}': {}", name, e)))?;
        files[slot] = Some(bytes.to_vec());
    }

    let missing: Vec<&str> = UPLOAD_FIELDS
        .iter()
        .zip(files.iter())
        .filter(|(_, f)| f.as_ref().map_or(true, |b| b.is_empty()))
        .map(|(name, _)| *name)
        .collect();
    if !missing.is_empty() {
        return Err(ServerError::BadRequest(format!(
            "Please upload all four files (missing: {})",
            missing.join(", ")
        )));
    }

    Ok(files.map(Option::unwrap_or_default))
}
