use crate::error::{AppError, RouteError};
use crate::extractors::JsonBody;
use crate::models::{
    GenerationRequest, GenerationResult, UploadOptions, UploadRequest, UploadResult,
};
use crate::services::payload::{decode_payload, public_id_for};
use crate::services::{MediaStore, StoryGenerator};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, Any, CorsLayer};
use tower_http::trace::TraceLayer;

const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub story_generator: Arc<dyn StoryGenerator>,
    pub media_store: Arc<dyn MediaStore>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/generate", post(generate_story))
        .route("/api/upload", post(upload_file))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(AllowMethods::any())
                .allow_headers(AllowHeaders::any()),
        )
}

async fn index() -> Json<Value> {
    Json(json!({ "status": "ok", "msg": "Children AI Books backend running" }))
}

async fn generate_story(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<GenerationRequest>,
) -> Result<Json<GenerationResult>, RouteError> {
    let fail = |error| RouteError::new("/api/generate", "Failed to generate story", error);

    let topic = request
        .prompt
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| fail(AppError::Validation("prompt required in body".to_string())))?;

    let story = state
        .story_generator
        .generate(Some(topic.as_str()))
        .await
        .map_err(fail)?;

    Ok(Json(GenerationResult { story }))
}

async fn upload_file(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<UploadRequest>,
) -> Result<Json<UploadResult>, RouteError> {
    let fail = |error| RouteError::new("/api/upload", "Upload failed", error);

    let file = request.file.filter(|f| !f.is_empty()).ok_or_else(|| {
        fail(AppError::Validation(
            "file (base64 or dataURL) required".to_string(),
        ))
    })?;

    let decoded = decode_payload(&file).map_err(fail)?;
    let options = UploadOptions::for_book(public_id_for(request.filename.as_deref()));

    tracing::debug!(
        bytes = decoded.bytes.len(),
        mime_type = ?decoded.mime_type,
        "Decoded upload payload"
    );

    let meta = state
        .media_store
        .upload(decoded.bytes, &options)
        .await
        .map_err(fail)?;

    Ok(Json(UploadResult {
        url: meta.secure_url,
        raw: meta.raw,
    }))
}
