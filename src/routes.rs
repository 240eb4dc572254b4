use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use crate::{
    encoder::{ImageKind, UploadedImage},
    error::GuideError,
    export,
    gemini::TextGenerator,
    instructions::generate_testing_instructions,
    models::{ExportRequest, GenerateQuery},
};

#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<dyn TextGenerator>,
    pub max_upload_bytes: usize,
}

pub fn router(state: AppState) -> Router {
    let max_upload_bytes = state.max_upload_bytes;
    Router::new()
        .route("/api/health", get(health))
        .route("/api/instructions", post(generate_instructions))
        .route("/api/instructions/export", post(export_instructions))
        .layer(
            ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(max_upload_bytes))
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "status": "ok", "model": state.generator.model_id() }))
}

fn describe_limit(bytes: usize) -> String {
    const MB: usize = 1024 * 1024;
    if bytes >= MB && bytes % MB == 0 {
        format!("{} MB", bytes / MB)
    } else {
        format!("{bytes} bytes")
    }
}

// Over-limit bodies keep their 413; anything else while reading a screenshot is an encoding failure.
fn screenshot_error(e: MultipartError, what: &str, limit: usize) -> GuideError {
    let status = e.status();
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        return GuideError::Upload {
            status,
            message: format!("Upload exceeds the {} limit (reading {what}).", describe_limit(limit)),
        };
    }
    GuideError::Encoding(format!("{what}: {}", e.body_text()))
}

/// Collected multipart input: screenshots in upload order plus optional context.
async fn read_upload(
    mut multipart: Multipart,
    limit: usize,
) -> Result<(Vec<UploadedImage>, Option<String>), GuideError> {
    let mut images = Vec::new();
    let mut context = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| screenshot_error(e, "upload", limit))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_string) {
            // An empty file input still sends a part, with no file name.
            Some(file_name) if file_name.is_empty() => {
                tracing::debug!("Skipping empty file field '{}'", name);
            }
            Some(file_name) => {
                let kind = ImageKind::from_file_name(&file_name)
                    .ok_or_else(|| GuideError::UnsupportedImage(file_name.clone()))?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| screenshot_error(e, &file_name, limit))?;
                tracing::info!("📎 Step {}: {} ({} bytes)", images.len() + 1, file_name, bytes.len());
                images.push(UploadedImage::new(images.len() + 1, file_name, kind, bytes));
            }
            None if name == "context" => {
                let text = field.text().await.map_err(|e| {
                    let status = e.status();
                    let message = if status == StatusCode::PAYLOAD_TOO_LARGE {
                        format!("Upload exceeds the {} limit (reading context).", describe_limit(limit))
                    } else {
                        format!("Error reading context field: {}", e.body_text())
                    };
                    let status = if status.is_client_error() { status } else { StatusCode::BAD_REQUEST };
                    GuideError::Upload { status, message }
                })?;
                context = Some(text);
            }
            None => tracing::debug!("Ignoring unexpected form field '{}'", name),
        }
    }
    Ok((images, context))
}

pub async fn generate_instructions(
    State(state): State<AppState>,
    Query(query): Query<GenerateQuery>,
    multipart: Multipart,
) -> Result<Response, GuideError> {
    let (images, context) = read_upload(multipart, state.max_upload_bytes).await?;
    tracing::info!("🚀 Generating testing instructions for {} screenshot(s)", images.len());

    let guide = generate_testing_instructions(state.generator.as_ref(), &images, context.as_deref()).await?;
    tracing::info!("✅ Guide {} generated ({} chars)", guide.id, guide.instructions.len());

    if query.download {
        return Ok(export::attachment(guide.instructions));
    }
    Ok(Json(guide).into_response())
}

pub async fn export_instructions(Json(body): Json<ExportRequest>) -> Response {
    export::attachment(body.instructions)
}
