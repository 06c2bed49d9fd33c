//! HTTP surface: job submission and artifact downloads.

use std::future::Future;
use std::io;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use tokio::fs::File;
use tokio::net::TcpListener;
use tokio_util::io::ReaderStream;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::error::SplitError;
use crate::pipeline::{ExtractionOutcome, ExtractionPipeline, ExtractionRequest};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractResponse {
    pub archive_name: String,
    pub files: Vec<FileEntry>,
}

#[derive(Debug, Serialize)]
pub struct FileEntry {
    pub name: String,
}

impl From<&ExtractionOutcome> for ExtractResponse {
    fn from(outcome: &ExtractionOutcome) -> Self {
        Self {
            archive_name: outcome.archive_name.clone(),
            files: outcome
                .files
                .iter()
                .map(|f| FileEntry {
                    name: f.name.clone(),
                })
                .collect(),
        }
    }
}

/// Pipeline failure rendered as `{ "error": ... }` with the matching status.
#[derive(Debug)]
pub struct ApiError(SplitError);

impl From<SplitError> for ApiError {
    fn from(err: SplitError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            SplitError::Busy => (StatusCode::TOO_MANY_REQUESTS, "busy".to_string()),
            SplitError::Validation(_) => (StatusCode::BAD_REQUEST, "missing source".to_string()),
            other => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to process the request. {other}"),
            ),
        };
        error_response(status, message)
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

pub fn router(pipeline: Arc<ExtractionPipeline>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/extract", post(extract))
        .route("/downloads/{file_name}", get(download))
        .layer(TraceLayer::new_for_http())
        .with_state(pipeline)
}

/// Serve until `shutdown` resolves.
pub async fn serve<F>(
    listener: TcpListener,
    pipeline: Arc<ExtractionPipeline>,
    shutdown: F,
) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("Listening on http://{}", addr);
    }
    axum::serve(listener, router(pipeline))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn index(State(pipeline): State<Arc<ExtractionPipeline>>) -> impl IntoResponse {
    Json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "busy": pipeline.gate().is_busy(),
        "retentionSecs": pipeline.config().retention.as_secs(),
        "endpoints": {
            "GET /": "Health check",
            "POST /extract": "Split a video's audio into clips (body: {sourceUrl, timestampText})",
            "GET /downloads/{fileName}": "Download a produced clip or archive"
        }
    }))
}

async fn extract(
    State(pipeline): State<Arc<ExtractionPipeline>>,
    body: Result<Json<ExtractionRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    // The job runs on its own task so a client hanging up cannot stop it midway.
    let job = tokio::spawn(async move {
        pipeline
            .run(&request)
            .await
            .map(|outcome| ExtractResponse::from(&outcome))
    });

    match job.await {
        Ok(Ok(response)) => (StatusCode::OK, Json(response)).into_response(),
        Ok(Err(e)) => ApiError::from(e).into_response(),
        Err(e) => {
            error!("Extraction task panicked: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to process the request. {e}"),
            )
        }
    }
}

async fn download(
    State(pipeline): State<Arc<ExtractionPipeline>>,
    Path(file_name): Path<String>,
) -> Response {
    if !is_safe_file_name(&file_name) {
        return error_response(StatusCode::BAD_REQUEST, "invalid file name");
    }

    let path = pipeline.config().output_dir.join(&file_name);
    let file = match File::open(&path).await {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return error_response(StatusCode::NOT_FOUND, "not found");
        }
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };

    let meta = match file.metadata().await {
        Ok(m) if m.is_file() => m,
        Ok(_) => return error_response(StatusCode::NOT_FOUND, "not found"),
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };

    let Ok(disposition) =
        HeaderValue::from_str(&format!(r#"attachment; filename="{}""#, file_name))
    else {
        return error_response(StatusCode::BAD_REQUEST, "invalid file name");
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content_type_for(&file_name)),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(meta.len()));
    headers.insert(header::CONTENT_DISPOSITION, disposition);
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));

    let body = Body::from_stream(ReaderStream::new(file));
    (headers, body).into_response()
}

/// A bare file name: no separators, no parent references, no quotes.
pub fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '"', '\0'])
}

pub fn content_type_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "zip" => "application/zip",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "opus" | "ogg" => "audio/ogg",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        _ => "application/octet-stream",
    }
}
