use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::json;
use std::sync::Arc;

use super::{not_found, AppState};
use crate::auth::AuthUser;
use crate::errors::{AppError, ResultExt};
use crate::models::*;
use crate::utils::page_bounds;

/// POST /api/workflows
pub async fn create_workflow(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(payload): Json<WorkflowCreate>,
) -> Result<Json<Workflow>, AppError> {
    let workflow = state.storage().create_workflow(user.id, &payload).await?;

    tracing::info!("User {} created workflow {}", user.id, workflow.id);
    state
        .record_event(user.id, "workflow_created", json!({ "workflow_id": workflow.id }))
        .await;

    Ok(Json(workflow))
}

/// GET /api/workflows
pub async fn list_workflows(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(filter): Query<StatusFilter<WorkflowStatus>>,
) -> Result<Json<Vec<Workflow>>, AppError> {
    let (offset, limit) = page_bounds(&filter.pagination());
    let workflows = state
        .storage()
        .list_workflows(user.id, filter.status.map(|s| s.as_str()), offset, limit)
        .await?;
    Ok(Json(workflows))
}

/// GET /api/workflows/:id
pub async fn get_workflow(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(workflow_id): Path<i32>,
) -> Result<Json<Workflow>, AppError> {
    state
        .storage()
        .get_workflow(user.id, workflow_id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found("Workflow"))
}

/// PUT /api/workflows/:id
pub async fn update_workflow(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(workflow_id): Path<i32>,
    Json(update): Json<WorkflowUpdate>,
) -> Result<Json<Workflow>, AppError> {
    let workflow = state
        .storage()
        .update_workflow(user.id, workflow_id, &update)
        .await?
        .ok_or_else(|| not_found("Workflow"))?;

    tracing::info!("User {} updated workflow {}", user.id, workflow_id);
    state
        .record_event(user.id, "workflow_updated", json!({ "workflow_id": workflow_id }))
        .await;

    Ok(Json(workflow))
}

/// DELETE /api/workflows/:id
pub async fn delete_workflow(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(workflow_id): Path<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    if !state.storage().delete_workflow(user.id, workflow_id).await? {
        return Err(not_found("Workflow"));
    }

    tracing::info!("User {} deleted workflow {}", user.id, workflow_id);
    state
        .record_event(user.id, "workflow_deleted", json!({ "workflow_id": workflow_id }))
        .await;

    Ok(Json(MessageResponse {
        message: "Workflow deleted successfully".to_string(),
    }))
}

/// POST /api/workflows/:id/executions
///
/// Records an execution reported by the client. Nothing is run server-side.
pub async fn record_execution(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(workflow_id): Path<i32>,
    Json(payload): Json<WorkflowExecutionCreate>,
) -> Result<Json<WorkflowExecution>, AppError> {
    if payload.status.trim().is_empty() {
        return Err(AppError::BadRequest("Execution status is required".to_string()));
    }
    if payload.duration.is_some_and(|d| !d.is_finite() || d < 0.0) {
        return Err(AppError::BadRequest(
            "Execution duration must be a non-negative number of seconds".to_string(),
        ));
    }

    let execution = state
        .storage()
        .record_execution(user.id, workflow_id, &payload)
        .await
        .with_context(|| format!("Recording execution for workflow {}", workflow_id))?
        .ok_or_else(|| not_found("Workflow"))?;

    state
        .record_event(
            user.id,
            "workflow_executed",
            json!({ "workflow_id": workflow_id, "execution_id": execution.id }),
        )
        .await;

    Ok(Json(execution))
}

/// GET /api/workflows/:id/executions
pub async fn list_executions(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(workflow_id): Path<i32>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<WorkflowExecution>>, AppError> {
    let storage = state.storage();
    if storage.get_workflow(user.id, workflow_id).await?.is_none() {
        return Err(not_found("Workflow"));
    }

    let (offset, limit) = page_bounds(&page);
    let executions = storage.list_executions(workflow_id, offset, limit).await?;
    Ok(Json(executions))
}
