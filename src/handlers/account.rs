//! API keys, subscription and security log endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{Duration, Utc};
use serde_json::json;
use std::sync::Arc;

use super::{not_found, AppState};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::*;
use crate::utils::{generate_api_key, page_bounds};

const BILLING_PERIOD_DAYS: i64 = 30;

/// POST /api/api-keys
///
/// The generated key is returned in full; it is not masked on later reads.
pub async fn create_api_key(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(payload): Json<ApiKeyCreate>,
) -> Result<Json<ApiKey>, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("API key name is required".to_string()));
    }

    let api_key = state
        .storage()
        .create_api_key(
            user.id,
            &payload.name,
            &generate_api_key(),
            payload.permissions.as_deref(),
        )
        .await?;

    tracing::info!("User {} created API key {}", user.id, api_key.id);
    state
        .record_event(user.id, "api_key_created", json!({ "api_key_id": api_key.id }))
        .await;

    Ok(Json(api_key))
}

/// GET /api/api-keys
pub async fn list_api_keys(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<ApiKey>>, AppError> {
    let (offset, limit) = page_bounds(&page);
    let keys = state.storage().list_api_keys(user.id, offset, limit).await?;
    Ok(Json(keys))
}

/// PUT /api/api-keys/:id
pub async fn update_api_key(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(key_id): Path<i32>,
    Json(update): Json<ApiKeyUpdate>,
) -> Result<Json<ApiKey>, AppError> {
    let api_key = state
        .storage()
        .update_api_key(user.id, key_id, &update)
        .await?
        .ok_or_else(|| not_found("API key"))?;

    tracing::info!(
        "User {} updated API key {} (active: {})",
        user.id,
        key_id,
        api_key.is_active
    );
    state
        .record_event(user.id, "api_key_updated", json!({ "api_key_id": key_id }))
        .await;

    Ok(Json(api_key))
}

/// DELETE /api/api-keys/:id
pub async fn delete_api_key(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(key_id): Path<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    if !state.storage().delete_api_key(user.id, key_id).await? {
        return Err(not_found("API key"));
    }

    tracing::info!("User {} deleted API key {}", user.id, key_id);
    state
        .record_event(user.id, "api_key_deleted", json!({ "api_key_id": key_id }))
        .await;

    Ok(Json(MessageResponse {
        message: "API key deleted successfully".to_string(),
    }))
}

/// GET /api/subscription
pub async fn get_subscription(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Subscription>, AppError> {
    state
        .storage()
        .get_subscription(user.id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found("Subscription"))
}

/// PUT /api/subscription
///
/// Creates the subscription or switches plan; billing restarts from today.
pub async fn update_subscription(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(payload): Json<SubscriptionUpdate>,
) -> Result<Json<Subscription>, AppError> {
    let next_billing = Utc::now() + Duration::days(BILLING_PERIOD_DAYS);
    let subscription = state
        .storage()
        .upsert_subscription(user.id, payload.plan, next_billing)
        .await?;

    tracing::info!("User {} is now on plan {}", user.id, payload.plan);
    state
        .record_event(
            user.id,
            "subscription_updated",
            json!({ "subscription_id": subscription.id, "plan": payload.plan }),
        )
        .await;

    Ok(Json(subscription))
}

/// GET /api/security-logs
pub async fn list_security_logs(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<SecurityLog>>, AppError> {
    let (offset, limit) = page_bounds(&page);
    let logs = state
        .storage()
        .list_security_logs(user.id, offset, limit)
        .await?;
    Ok(Json(logs))
}
