use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use chrono::Utc;
use rand::{rngs::StdRng, SeedableRng};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use super::{not_found, AppState};
use crate::auth::AuthUser;
use crate::automation::{analyze_document, confidence_score};
use crate::errors::{AppError, ResultExt};
use crate::models::*;
use crate::utils::{file_extension, page_bounds, sanitize_filename};

/// Accepted upload types and the extension used when the name has none.
const ALLOWED_UPLOADS: [(&str, &str); 4] = [
    ("application/pdf", "pdf"),
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    (
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "xlsx",
    ),
];

/// Default extension for an accepted MIME type, `None` when not accepted.
pub fn upload_extension(mime_type: &str) -> Option<&'static str> {
    ALLOWED_UPLOADS
        .iter()
        .find(|(mime, _)| *mime == mime_type)
        .map(|(_, ext)| *ext)
}

/// POST /api/documents/upload
///
/// Expects a multipart body with a `file` field.
pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    mut multipart: Multipart,
) -> Result<Json<FileUploadResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = sanitize_filename(field.file_name().unwrap_or("upload"));
        let mime_type = field.content_type().unwrap_or_default().to_string();
        let default_ext = upload_extension(&mime_type)
            .ok_or_else(|| AppError::BadRequest("Unsupported file type".to_string()))?;

        let content = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;

        let ext = match file_extension(&file_name) {
            ext if ext.is_empty() => default_ext.to_string(),
            ext => ext,
        };
        let file_path = std::path::Path::new(&state.config.upload_dir)
            .join(format!("{}.{}", Uuid::new_v4(), ext))
            .to_string_lossy()
            .into_owned();

        tokio::fs::write(&file_path, &content)
            .await
            .map_err(AppError::from)
            .with_context(|| format!("Saving upload to {}", file_path))?;

        let file_size = content.len() as i64;
        let document = state
            .storage()
            .create_document(
                user.id,
                &NewDocument {
                    name: file_name.clone(),
                    doc_type: mime_type.clone(),
                    file_path: file_path.clone(),
                    file_size,
                    mime_type: mime_type.clone(),
                },
            )
            .await?;

        tracing::info!(
            "User {} uploaded document {} ({} bytes, {})",
            user.id,
            document.id,
            file_size,
            mime_type
        );
        state
            .record_event(user.id, "document_uploaded", json!({ "document_id": document.id }))
            .await;

        return Ok(Json(FileUploadResponse {
            filename: file_name,
            file_size,
            mime_type,
            file_path,
            upload_id: document.id.to_string(),
        }));
    }

    Err(AppError::BadRequest("No file provided".to_string()))
}

/// GET /api/documents
pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(filter): Query<StatusFilter<DocumentStatus>>,
) -> Result<Json<Vec<Document>>, AppError> {
    let (offset, limit) = page_bounds(&filter.pagination());
    let documents = state
        .storage()
        .list_documents(user.id, filter.status.map(|s| s.as_str()), offset, limit)
        .await?;
    Ok(Json(documents))
}

/// GET /api/documents/:id
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(document_id): Path<i32>,
) -> Result<Json<Document>, AppError> {
    state
        .storage()
        .get_document(user.id, document_id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found("Document"))
}

/// POST /api/documents/:id/process
pub async fn process_document(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(document_id): Path<i32>,
) -> Result<Json<DocumentProcessResponse>, AppError> {
    let storage = state.storage();
    let document = storage
        .get_document(user.id, document_id)
        .await?
        .ok_or_else(|| not_found("Document"))?;

    let extracted = analyze_document(&document.doc_type, &document.name, Utc::now().date_naive());
    let confidence = confidence_score(&mut StdRng::from_entropy());

    let document = storage
        .mark_document_processed(document.id, &extracted, confidence)
        .await
        .with_context(|| format!("Processing document {}", document_id))?;

    tracing::info!(
        "User {} processed document {} (confidence {})",
        user.id,
        document.id,
        confidence
    );
    state
        .record_event(user.id, "document_processed", json!({ "document_id": document.id }))
        .await;

    Ok(Json(DocumentProcessResponse {
        message: "Document processed successfully".to_string(),
        document,
    }))
}
