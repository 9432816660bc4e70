//! services/api/src/web/analyze.rs
//!
//! Contains the Axum handler for the image-analysis endpoint and the master
//! definition for the OpenAPI specification.

use crate::web::state::AppState;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use base64::Engine;
use med_imaging_core::{analysis, domain::UploadedImage, normalize::NormalizeError};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        analyze_handler,
        crate::web::auth::signup_handler,
        crate::web::auth::login_handler,
        crate::web::auth::guest_handler,
        crate::web::auth::logout_handler,
    ),
    components(
        schemas(
            AnalyzeResponse,
            crate::web::auth::SignupRequest,
            crate::web::auth::LoginRequest,
            crate::web::auth::AuthResponse,
        )
    ),
    tags(
        (name = "Medical Image Analysis API", description = "API endpoints for AI-assisted analysis of uploaded medical images.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The response payload for an analysis request. `ok` is false when the
/// remote analysis failed and `report_markdown` carries the failure text.
#[derive(Serialize, ToSchema)]
pub struct AnalyzeResponse {
    pub ok: bool,
    pub report_markdown: String,
    /// The resized image, base64-encoded PNG, for display next to the report.
    pub image_base64: String,
    pub image_width: u32,
    pub image_height: u32,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Analyze an uploaded medical image.
///
/// Accepts a multipart/form-data request with a single image part. Requires
/// an authenticated or guest session cookie.
#[utoipa::path(
    post,
    path = "/analyze",
    request_body(content_type = "multipart/form-data", description = "The medical image to analyze."),
    responses(
        (status = 200, description = "Analysis completed (the report may describe a remote failure)", body = AnalyzeResponse),
        (status = 400, description = "Bad request (missing file or unsupported type)"),
        (status = 401, description = "No authenticated or guest session"),
        (status = 422, description = "The uploaded bytes could not be decoded as an image")
    )
)]
pub async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let upload = if let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("Failed to read multipart data: {}", e),
        )
    })? {
        let content_type = field.content_type().unwrap_or_default().to_string();
        let data = field.bytes().await.map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                format!("Failed to read file bytes: {}", e),
            )
        })?;
        UploadedImage::new(data.to_vec(), content_type)
    } else {
        return Err((
            StatusCode::BAD_REQUEST,
            "Multipart form must include an image file".to_string(),
        ));
    };

    if !upload.mime_type_supported() {
        return Err((
            StatusCode::BAD_REQUEST,
            format!(
                "Unsupported upload type '{}'; expected one of jpeg, jpg, png, bmp, gif",
                upload.declared_mime_type
            ),
        ));
    }

    info!(bytes = upload.raw_bytes.len(), "analysis request received");

    // One token per request; nothing external cancels it today, but the
    // pipeline is wired for it.
    let cancel = CancellationToken::new();
    let outcome = analysis::run_analysis(
        state.vision.as_ref(),
        &upload,
        &state.analysis_options(),
        &cancel,
    )
    .await
    .map_err(|e| match e {
        NormalizeError::Decode(_) | NormalizeError::DegenerateImage => {
            (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        }
        NormalizeError::Artifact(_) => {
            error!("Failed to stage image artifact: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to stage uploaded image".to_string(),
            )
        }
    })?;

    let ok = outcome.result.is_ok();
    if let Err(err) = &outcome.result {
        error!("Remote analysis failed: {:?}", err);
    }
    let report = outcome.into_report();

    let response = AnalyzeResponse {
        ok,
        report_markdown: report.markdown_text,
        image_base64: base64::engine::general_purpose::STANDARD.encode(&report.image.png_bytes),
        image_width: report.image.width,
        image_height: report.image.height,
    };
    Ok((StatusCode::OK, Json(response)))
}
