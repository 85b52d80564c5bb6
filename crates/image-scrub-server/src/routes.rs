use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Multipart, Query};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use image_scrub_core::{HistoryRecord, ImagePayload, MediaType, ProcessingOutcome};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::State;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub file_name: String,
    pub status: ProcessingOutcome,
    pub status_label: &'static str,
    pub timestamp: DateTime<Utc>,
}

impl From<HistoryRecord> for HistoryEntry {
    fn from(record: HistoryRecord) -> Self {
        Self {
            file_name: record.filename,
            status: record.outcome,
            status_label: record.outcome.label(),
            timestamp: record.timestamp,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryParams {
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SizeParams {
    pub size: i64,
}

fn multipart_error<E: std::fmt::Display>(e: E) -> ApiError {
    ApiError::BadRequest(format!("Invalid multipart request: {e}"))
}

/// Pull the `file` field out of the form, refusing to buffer more than `max_bytes`.
async fn read_upload(multipart: &mut Multipart, max_bytes: usize) -> Result<ImagePayload, ApiError> {
    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();

        let mut data = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            if data.len() + chunk.len() > max_bytes {
                return Err(ApiError::TooLarge { max_bytes });
            }
            data.extend_from_slice(&chunk);
        }

        return Ok(ImagePayload::new(data, content_type, filename));
    }

    Err(ApiError::BadRequest(
        "Missing multipart field 'file'".to_string(),
    ))
}

/// Header values cannot carry control characters, and quotes would end the filename early.
fn content_disposition(filename: &str) -> String {
    let name: String = filename
        .chars()
        .filter(|c| *c != '"' && !c.is_control())
        .collect();
    format!("attachment; filename=\"{name}\"")
}

async fn process_image_impl(state: &State, payload: ImagePayload) -> Result<Response, ApiError> {
    let filename = payload.filename.clone();
    let content_type = MediaType::from_content_type(&payload.content_type)
        .map_or("application/octet-stream", MediaType::mime);

    info!("Received image upload request for file: {filename}");

    let processor = Arc::clone(&state.processor);
    let bytes = tokio::task::spawn_blocking(move || processor.process(payload))
        .await
        .map_err(|e| ApiError::Internal(format!("processing task failed: {e}")))??;

    info!("Image processed successfully: {filename}");

    let disposition = content_disposition(&filename);
    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

pub async fn process_image(
    Extension(state): Extension<State>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let payload = read_upload(&mut multipart, state.max_upload_bytes).await?;
    process_image_impl(&state, payload).await
}

pub async fn history(
    Extension(state): Extension<State>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<HistoryEntry>>, ApiError> {
    let records = state.processor.query_history(params.status.as_deref())?;
    info!("Retrieved {} image records from history.", records.len());
    Ok(Json(records.into_iter().map(HistoryEntry::from).collect()))
}

pub async fn set_history_size(
    Extension(state): Extension<State>,
    Query(params): Query<SizeParams>,
) -> Result<StatusCode, ApiError> {
    state.processor.set_history_capacity(params.size)?;
    info!("Updated history size to: {}", params.size);
    Ok(StatusCode::OK)
}

pub async fn history_size(Extension(state): Extension<State>) -> Json<usize> {
    let size = state.processor.history_capacity();
    debug!("Retrieved history size: {size}");
    Json(size)
}

pub async fn allowed_types_extensions() -> Json<BTreeMap<&'static str, &'static str>> {
    Json(image_scrub_core::allowed_types())
}

pub async fn health_check() -> Result<Json<()>, (StatusCode, String)> {
    Ok(Json(()))
}
