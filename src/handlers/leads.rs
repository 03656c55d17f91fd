use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;

use super::{not_found, AppState};
use crate::auth::AuthUser;
use crate::errors::{AppError, ResultExt};
use crate::models::*;
use crate::scoring::{self, LeadAttributes, RngJitter};
use crate::utils::page_bounds;

/// POST /api/leads
///
/// Scores the lead, estimates its value and attaches insights before storing it.
pub async fn create_lead(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(payload): Json<LeadCreate>,
) -> Result<Json<Lead>, AppError> {
    let scored = scoring::evaluate(
        &LeadAttributes::from(&payload),
        Utc::now(),
        &mut RngJitter::from_entropy(),
    );

    let lead = state
        .storage()
        .create_lead(user.id, &payload, &scored)
        .await?;

    tracing::info!(
        "User {} created lead {} (score {}, value {})",
        user.id,
        lead.id,
        scored.score,
        scored.predicted_value
    );
    state
        .record_event(
            user.id,
            "lead_created",
            json!({ "lead_id": lead.id, "score": scored.score }),
        )
        .await;

    Ok(Json(lead))
}

/// GET /api/leads
pub async fn list_leads(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(filter): Query<StatusFilter<LeadStatus>>,
) -> Result<Json<Vec<Lead>>, AppError> {
    let (offset, limit) = page_bounds(&filter.pagination());
    let leads = state
        .storage()
        .list_leads(user.id, filter.status.map(|s| s.as_str()), offset, limit)
        .await?;
    Ok(Json(leads))
}

/// GET /api/leads/:id
pub async fn get_lead(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(lead_id): Path<i32>,
) -> Result<Json<Lead>, AppError> {
    state
        .storage()
        .get_lead(user.id, lead_id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found("Lead"))
}

/// PUT /api/leads/:id
///
/// Stores the given fields as-is. Use the rescore endpoint to recompute.
pub async fn update_lead(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(lead_id): Path<i32>,
    Json(update): Json<LeadUpdate>,
) -> Result<Json<Lead>, AppError> {
    if update.score.is_some_and(|s| !(0..=100).contains(&s)) {
        return Err(AppError::BadRequest(
            "Score must be between 0 and 100".to_string(),
        ));
    }

    let lead = state
        .storage()
        .update_lead(user.id, lead_id, &update)
        .await?
        .ok_or_else(|| not_found("Lead"))?;

    tracing::info!("User {} updated lead {}", user.id, lead_id);
    state
        .record_event(user.id, "lead_updated", json!({ "lead_id": lead_id }))
        .await;

    Ok(Json(lead))
}

/// DELETE /api/leads/:id
pub async fn delete_lead(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(lead_id): Path<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    if !state.storage().delete_lead(user.id, lead_id).await? {
        return Err(not_found("Lead"));
    }

    tracing::info!("User {} deleted lead {}", user.id, lead_id);
    state
        .record_event(user.id, "lead_deleted", json!({ "lead_id": lead_id }))
        .await;

    Ok(Json(MessageResponse {
        message: "Lead deleted successfully".to_string(),
    }))
}

/// POST /api/leads/:id/rescore
///
/// Re-runs scoring against the stored attributes and overwrites score,
/// value and insights.
pub async fn rescore_lead(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(lead_id): Path<i32>,
) -> Result<Json<Lead>, AppError> {
    let storage = state.storage();
    let lead = storage
        .get_lead(user.id, lead_id)
        .await?
        .ok_or_else(|| not_found("Lead"))?;

    let scored = scoring::evaluate(
        &LeadAttributes::from(&lead),
        Utc::now(),
        &mut RngJitter::from_entropy(),
    );
    let previous = lead.score;
    let lead = storage
        .apply_lead_score(lead.id, &scored)
        .await
        .with_context(|| format!("Rescoring lead {}", lead_id))?;

    tracing::info!(
        "User {} rescored lead {}: {} -> {}",
        user.id,
        lead.id,
        previous,
        lead.score
    );
    state
        .record_event(
            user.id,
            "lead_rescored",
            json!({ "lead_id": lead.id, "score": scored.score }),
        )
        .await;

    Ok(Json(lead))
}
