//! Chat, analytics, email campaigns and support tickets.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{Duration, Utc};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use super::{group_metrics, not_found, AppState};
use crate::auth::AuthUser;
use crate::automation::{
    format_ai_response, is_workflow_request, suggest_workflow, triage_ticket, DEFAULT_CHAT_MODEL,
    DEFAULT_CHAT_REPLY,
};
use crate::errors::AppError;
use crate::models::*;
use crate::utils::page_bounds;

const DEFAULT_ANALYTICS_DAYS: i64 = 30;
const MAX_ANALYTICS_DAYS: i64 = 3650;

/// POST /api/chat
pub async fn chat(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(message): Json<ChatMessage>,
) -> Result<Json<ChatResponse>, AppError> {
    let model = message
        .model
        .clone()
        .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string());

    let response = if is_workflow_request(&message.message) {
        let suggestion = serde_json::to_value(suggest_workflow(&message.message))
            .map_err(|e| AppError::InternalError(format!("Failed to encode suggestion: {}", e)))?;
        ChatResponse {
            id: Uuid::new_v4().to_string(),
            message: "workflow_suggestion".to_string(),
            sender: "ai".to_string(),
            timestamp: Utc::now(),
            message_type: "workflow_suggestion".to_string(),
            model: Some(model.clone()),
            data: Some(suggestion),
        }
    } else {
        ChatResponse {
            id: Uuid::new_v4().to_string(),
            message: format_ai_response(DEFAULT_CHAT_REPLY, &model),
            sender: "ai".to_string(),
            timestamp: Utc::now(),
            message_type: "text".to_string(),
            model: Some(model.clone()),
            data: None,
        }
    };

    tracing::debug!(
        "Chat from user {} ({} -> {})",
        user.id,
        message.sender,
        response.message_type
    );
    state
        .record_event(
            user.id,
            "chat_message",
            json!({ "model": model, "type": response.message_type }),
        )
        .await;

    Ok(Json(response))
}

/// GET /api/analytics?days=30&metric=
pub async fn get_analytics(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<AnalyticsResponse>, AppError> {
    let days = query.days.unwrap_or(DEFAULT_ANALYTICS_DAYS);
    if !(1..=MAX_ANALYTICS_DAYS).contains(&days) {
        return Err(AppError::BadRequest(format!(
            "days must be between 1 and {}",
            MAX_ANALYTICS_DAYS
        )));
    }

    let since = Utc::now() - Duration::days(days);
    let events = state
        .storage()
        .list_events_since(user.id, since, query.metric.as_deref())
        .await?;

    Ok(Json(AnalyticsResponse {
        metrics: group_metrics(events),
    }))
}

/// POST /api/analytics
pub async fn create_analytics_event(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(payload): Json<AnalyticsCreate>,
) -> Result<Json<AnalyticsEvent>, AppError> {
    if payload.metric_name.trim().is_empty() {
        return Err(AppError::BadRequest("metric_name is required".to_string()));
    }

    let event = state
        .storage()
        .log_event(
            user.id,
            &payload.metric_name,
            payload.metric_value,
            payload.metadata,
        )
        .await?;

    tracing::info!("User {} recorded metric {}", user.id, event.metric_name);
    Ok(Json(event))
}

// ============ Email campaigns ============

/// POST /api/email-campaigns
pub async fn create_campaign(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(payload): Json<EmailCampaignCreate>,
) -> Result<Json<EmailCampaign>, AppError> {
    let campaign = state.storage().create_campaign(user.id, &payload).await?;

    tracing::info!("User {} created campaign {}", user.id, campaign.id);
    state
        .record_event(
            user.id,
            "email_campaign_created",
            json!({ "campaign_id": campaign.id }),
        )
        .await;

    Ok(Json(campaign))
}

/// GET /api/email-campaigns
pub async fn list_campaigns(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(filter): Query<StatusFilter<CampaignStatus>>,
) -> Result<Json<Vec<EmailCampaign>>, AppError> {
    let (offset, limit) = page_bounds(&filter.pagination());
    let campaigns = state
        .storage()
        .list_campaigns(user.id, filter.status.map(|s| s.as_str()), offset, limit)
        .await?;
    Ok(Json(campaigns))
}

/// GET /api/email-campaigns/:id
pub async fn get_campaign(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(campaign_id): Path<i32>,
) -> Result<Json<EmailCampaign>, AppError> {
    state
        .storage()
        .get_campaign(user.id, campaign_id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found("Email campaign"))
}

/// PUT /api/email-campaigns/:id
pub async fn update_campaign(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(campaign_id): Path<i32>,
    Json(update): Json<EmailCampaignUpdate>,
) -> Result<Json<EmailCampaign>, AppError> {
    let counters = [
        update.recipients,
        update.sent,
        update.opened,
        update.clicked,
        update.converted,
    ];
    if counters.iter().flatten().any(|n| *n < 0) || update.revenue.is_some_and(|r| r < 0.0) {
        return Err(AppError::BadRequest(
            "Campaign counters cannot be negative".to_string(),
        ));
    }

    let campaign = state
        .storage()
        .update_campaign(user.id, campaign_id, &update)
        .await?
        .ok_or_else(|| not_found("Email campaign"))?;

    tracing::info!("User {} updated campaign {}", user.id, campaign_id);
    state
        .record_event(
            user.id,
            "email_campaign_updated",
            json!({ "campaign_id": campaign_id }),
        )
        .await;

    Ok(Json(campaign))
}

// ============ Support tickets ============

/// POST /api/tickets
///
/// Attaches keyword triage (sentiment, summary, actions, priority).
pub async fn create_ticket(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(payload): Json<SupportTicketCreate>,
) -> Result<Json<SupportTicket>, AppError> {
    let triage = triage_ticket(&payload.subject, payload.description.as_deref());
    let ticket = state
        .storage()
        .create_ticket(user.id, &payload, &triage)
        .await?;

    tracing::info!(
        "User {} opened ticket {} (priority {}, sentiment {})",
        user.id,
        ticket.id,
        ticket.priority,
        triage.sentiment
    );
    state
        .record_event(
            user.id,
            "support_ticket_created",
            json!({ "ticket_id": ticket.id }),
        )
        .await;

    Ok(Json(ticket))
}

/// GET /api/tickets
pub async fn list_tickets(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(filter): Query<StatusFilter<TicketStatus>>,
) -> Result<Json<Vec<SupportTicket>>, AppError> {
    let (offset, limit) = page_bounds(&filter.pagination());
    let tickets = state
        .storage()
        .list_tickets(user.id, filter.status.map(|s| s.as_str()), offset, limit)
        .await?;
    Ok(Json(tickets))
}

/// GET /api/tickets/:id
pub async fn get_ticket(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(ticket_id): Path<i32>,
) -> Result<Json<SupportTicket>, AppError> {
    state
        .storage()
        .get_ticket(user.id, ticket_id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found("Support ticket"))
}

/// PUT /api/tickets/:id
pub async fn update_ticket(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(ticket_id): Path<i32>,
    Json(update): Json<SupportTicketUpdate>,
) -> Result<Json<SupportTicket>, AppError> {
    let ticket = state
        .storage()
        .update_ticket(user.id, ticket_id, &update)
        .await?
        .ok_or_else(|| not_found("Support ticket"))?;

    tracing::info!(
        "User {} updated ticket {} (status {})",
        user.id,
        ticket_id,
        ticket.status
    );
    state
        .record_event(
            user.id,
            "support_ticket_updated",
            json!({ "ticket_id": ticket_id }),
        )
        .await;

    Ok(Json(ticket))
}
