//! Global catalog: integrations and AI models.
//!
//! Reads go through the moka caches on [`AppState`]; admin writes
//! invalidate them.

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::json;
use std::sync::Arc;

use super::{not_found, AppState};
use crate::auth::{AdminUser, AuthUser};
use crate::errors::AppError;
use crate::models::*;

/// GET /api/integrations
pub async fn list_integrations(
    State(state): State<Arc<AppState>>,
    AuthUser(_user): AuthUser,
) -> Result<Json<Vec<Integration>>, AppError> {
    let storage = state.storage();
    let integrations = state
        .integrations_cache
        .try_get_with((), async move { storage.list_integrations().await.map(Arc::new) })
        .await
        .map_err(|e| (*e).clone())?;

    Ok(Json(integrations.as_ref().clone()))
}

/// PUT /api/integrations/:id (admin)
pub async fn update_integration(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(integration_id): Path<i32>,
    Json(update): Json<IntegrationUpdate>,
) -> Result<Json<Integration>, AppError> {
    let integration = state
        .storage()
        .update_integration(integration_id, &update)
        .await?
        .ok_or_else(|| not_found("Integration"))?;

    state.integrations_cache.invalidate(&()).await;

    tracing::info!("Admin {} updated integration {}", admin.id, integration_id);
    state
        .record_event(
            admin.id,
            "integration_updated",
            json!({ "integration_id": integration_id }),
        )
        .await;

    Ok(Json(integration))
}

/// GET /api/ai-models
pub async fn list_ai_models(
    State(state): State<Arc<AppState>>,
    AuthUser(_user): AuthUser,
) -> Result<Json<Vec<AiModel>>, AppError> {
    let storage = state.storage();
    let models = state
        .ai_models_cache
        .try_get_with((), async move { storage.list_active_ai_models().await.map(Arc::new) })
        .await
        .map_err(|e| (*e).clone())?;

    Ok(Json(models.as_ref().clone()))
}

/// POST /api/ai-models (admin)
pub async fn create_ai_model(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Json(payload): Json<AiModelCreate>,
) -> Result<Json<AiModel>, AppError> {
    if payload.name.trim().is_empty() || payload.model_id.trim().is_empty() {
        return Err(AppError::BadRequest(
            "name and model_id are required".to_string(),
        ));
    }

    let model = state.storage().create_ai_model(&payload).await?;
    state.ai_models_cache.invalidate(&()).await;

    tracing::info!("Admin {} registered AI model {}", admin.id, model.id);
    state
        .record_event(admin.id, "ai_model_created", json!({ "ai_model_id": model.id }))
        .await;

    Ok(Json(model))
}
