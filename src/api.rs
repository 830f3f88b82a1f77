// BIN Checker - HTTP surface
// Every request carries both uploads; the server keeps no session state.

use crate::config::ServerConfig;
use crate::error::BinCheckError;
use crate::export::{to_csv_bytes, EXPORT_FILE_NAME, EXPORT_MIME};
use crate::filter::FilterColumn;
use crate::pipeline::{self, CheckOutcome, CheckReport, CheckRequest, UploadSource, AWAITING_UPLOADS_MESSAGE};
use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, warn};

/// API Response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Body of a successful /api/check call
#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum CheckResponse {
    AwaitingUploads { message: String },
    Ready(Box<CheckReport>),
}

pub enum ApiError {
    Multipart(MultipartError),
    Pipeline(BinCheckError),
    AwaitingUploads,
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        ApiError::Multipart(e)
    }
}

impl From<BinCheckError> for ApiError {
    fn from(e: BinCheckError) -> Self {
        ApiError::Pipeline(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Multipart(e) => {
                warn!("Rejected multipart body: {}", e);
                (StatusCode::BAD_REQUEST, e.body_text())
            }
            ApiError::Pipeline(e) if e.is_input_error() => {
                warn!("Rejected upload: {}", e);
                (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
            }
            ApiError::Pipeline(e) => {
                error!("Pipeline failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            ApiError::AwaitingUploads => (StatusCode::BAD_REQUEST, AWAITING_UPLOADS_MESSAGE.to_string()),
        };

        (status, Json(ApiResponse::<()>::err(message))).into_response()
    }
}

/// Turn the multipart form into a CheckRequest.
///
/// Fields: `reference`, `check_list` (files), repeatable `issuer`, `brand`,
/// `type`, `country`, and optional `lookup`. An empty file part counts as
/// not uploaded.
async fn read_form(mut multipart: Multipart) -> Result<CheckRequest, ApiError> {
    let mut request = CheckRequest::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "reference" | "check_list" => {
                let bytes = field.bytes().await?;
                if bytes.is_empty() {
                    continue;
                }
                let source = Some(UploadSource::Bytes(bytes.to_vec()));
                if name == "reference" {
                    request.reference = source;
                } else {
                    request.check_list = source;
                }
            }
            "lookup" => {
                request.lookup = Some(field.text().await?);
            }
            other => match FilterColumn::from_field_name(other) {
                Some(column) => {
                    let value = field.text().await?;
                    if !value.is_empty() {
                        request.filters.select(column, value);
                    }
                }
                None => debug!(field = other, "Ignoring unknown form field"),
            },
        }
    }

    Ok(request)
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// POST /api/check - Run the pipeline and return the report as JSON
async fn check(multipart: Multipart) -> Result<impl IntoResponse, ApiError> {
    let request = read_form(multipart).await?;

    let body = match pipeline::run(&request)? {
        CheckOutcome::AwaitingUploads => CheckResponse::AwaitingUploads {
            message: AWAITING_UPLOADS_MESSAGE.to_string(),
        },
        CheckOutcome::Ready(report) => CheckResponse::Ready(report),
    };

    Ok(Json(ApiResponse::ok(body)))
}

/// POST /api/export - Run the pipeline and download the filtered table
async fn export(multipart: Multipart) -> Result<impl IntoResponse, ApiError> {
    let request = read_form(multipart).await?;

    let report = match pipeline::run(&request)? {
        CheckOutcome::AwaitingUploads => return Err(ApiError::AwaitingUploads),
        CheckOutcome::Ready(report) => report,
    };

    let csv = to_csv_bytes(&report.filtered)?;
    let disposition = format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME);

    Ok((
        [
            (header::CONTENT_TYPE, EXPORT_MIME.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}

/// GET / - Serve index.html
async fn serve_index() -> impl IntoResponse {
    Html(include_str!("../web/index.html"))
}

pub fn router(config: &ServerConfig) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/check", post(check))
        .route("/export", post(export));

    Router::new()
        .route("/", get(serve_index))
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
