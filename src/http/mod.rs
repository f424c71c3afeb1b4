//! HTTP surface: forms, upload, generation and downloads.
//!
//! | Method | Path | Body |
//! |--------|------|------|
//! | GET  | `/` | — |
//! | POST | `/upload` | multipart: `pattern`, `bust`, `waist`, `hips`, `torso_height`, `svg_file` |
//! | POST | `/generate` | urlencoded: `pattern`, `bust`, `waist` |
//! | GET  | `/download/{job}/{file}` | — |
//!
//! Errors render as an HTML page with the status from
//! [`PatternError::status`].

pub mod pages;

use crate::error::PatternError;
use crate::measurements::MeasurementSet;
use crate::service::{GenerateRequest, PatternService, ResizeRequest};
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;
use tracing::{error, warn};

/// Build the application router.
pub fn router(service: PatternService) -> Router {
    let limit = service.config().max_upload_bytes;
    Router::new()
        .route("/", get(index))
        .route("/upload", post(upload))
        .route("/generate", post(generate))
        .route("/download/{job}/{file}", get(download))
        .layer(DefaultBodyLimit::max(limit))
        .with_state(service)
}

/// An error rendered as an HTML page.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<PatternError> for ApiError {
    fn from(err: PatternError) -> Self {
        let status =
            StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        // Internal details (paths, pdfium messages) stay in the log.
        let message = match &err {
            e if e.is_client_error() => e.to_string(),
            PatternError::ResponseParse(_)
            | PatternError::EstimatorFailed { .. }
            | PatternError::ProviderNotConfigured { .. }
            | PatternError::ScaledPageTooLarge { .. } => err.to_string(),
            _ => "The pattern could not be processed. Please try again.".to_string(),
        };
        if status.is_server_error() {
            error!("{} {}", status.as_u16(), err);
        } else {
            warn!("{} {}", status.as_u16(), err);
        }
        Self { status, message }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Html(pages::error(self.status.as_u16(), &self.message)),
        )
            .into_response()
    }
}

async fn index() -> Html<String> {
    Html(pages::index())
}

async fn upload(
    State(service): State<PatternService>,
    mut multipart: Multipart,
) -> Result<Html<String>, ApiError> {
    let mut pattern_type = String::new();
    let mut fields: [Option<String>; 4] = Default::default();
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "svg_file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(e.body_text()))?;
                if !filename.is_empty() && !bytes.is_empty() {
                    file = Some((filename, bytes.to_vec()));
                }
            }
            "pattern" | "bust" | "waist" | "hips" | "torso_height" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(e.body_text()))?;
                match name.as_str() {
                    "pattern" => pattern_type = text,
                    "bust" => fields[0] = Some(text),
                    "waist" => fields[1] = Some(text),
                    "hips" => fields[2] = Some(text),
                    _ => fields[3] = Some(text),
                }
            }
            _ => {}
        }
    }

    let (filename, bytes) = file.ok_or(PatternError::MissingUpload)?;
    let [bust, waist, hips, torso] = &fields;
    let measurements = MeasurementSet::from_fields(
        bust.as_deref(),
        waist.as_deref(),
        hips.as_deref(),
        torso.as_deref(),
    );

    let output = service
        .resize(ResizeRequest {
            pattern_type,
            measurements,
            filename,
            bytes,
        })
        .await?;
    Ok(Html(pages::resize_result(&output)))
}

#[derive(Debug, Deserialize)]
struct GenerateForm {
    #[serde(default)]
    pattern: String,
    bust: Option<String>,
    waist: Option<String>,
}

async fn generate(
    State(service): State<PatternService>,
    Form(form): Form<GenerateForm>,
) -> Result<Html<String>, ApiError> {
    let pattern = service
        .generate(GenerateRequest {
            pattern: form.pattern,
            bust: form.bust,
            waist: form.waist,
        })
        .await?;
    Ok(Html(pages::generate_result(&pattern)))
}

async fn download(
    State(service): State<PatternService>,
    Path((job, file)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let path = service.download_path(&job, &file)?;
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| PatternError::io(&path, e))?;
    let headers = [
        (header::CONTENT_TYPE, content_type(&file).to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{file}\""),
        ),
    ];
    Ok((headers, bytes).into_response())
}

fn content_type(file: &str) -> &'static str {
    match file.rsplit('.').next().map(str::to_ascii_lowercase).as_deref() {
        Some("svg") => "image/svg+xml",
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        _ => "application/octet-stream",
    }
}
