use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use moka::future::Cache;
use serde_json::{json, Value};
use sqlx::PgPool;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::AuthUser;
use crate::automation;
use crate::config::Config;
use crate::db;
use crate::db_storage::Storage;
use crate::errors::{AppError, ResultExt};
use crate::models::*;
use crate::utils::calculate_percentage;

pub mod account;
pub mod auth;
pub mod catalog;
pub mod documents;
pub mod engagement;
pub mod leads;
pub mod workflows;

/// Catalog cache lifetime; admin writes invalidate earlier.
const CATALOG_TTL: Duration = Duration::from_secs(300);
const DASHBOARD_RECENT: i64 = 5;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: PgPool,
    /// Application configuration.
    pub config: Config,
    /// Integration catalog, a single entry keyed by `()`.
    pub integrations_cache: Cache<(), Arc<Vec<Integration>>>,
    /// Active AI models, a single entry keyed by `()`.
    pub ai_models_cache: Cache<(), Arc<Vec<AiModel>>>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config,
            integrations_cache: Cache::builder()
                .time_to_live(CATALOG_TTL)
                .max_capacity(1)
                .build(),
            ai_models_cache: Cache::builder()
                .time_to_live(CATALOG_TTL)
                .max_capacity(1)
                .build(),
        }
    }

    pub fn storage(&self) -> Storage {
        Storage::new(self.db.clone())
    }

    /// Best-effort analytics write. Failures are logged, never returned.
    pub(crate) async fn record_event(&self, user_id: i32, metric_name: &str, metadata: Value) {
        if let Err(e) = self
            .storage()
            .log_event(user_id, metric_name, 1.0, Some(metadata))
            .await
        {
            tracing::warn!(
                "Failed to record analytics event {} for user {}: {}",
                metric_name,
                user_id,
                e
            );
        }
    }
}

/// `404` with the given message.
pub(crate) fn not_found(what: &str) -> AppError {
    AppError::NotFound(format!("{} not found", what))
}

/// GET /api/
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": format!("LeZelote-IA API v{}", env!("CARGO_PKG_VERSION")),
        "version": env!("CARGO_PKG_VERSION"),
        "status": "operational",
    }))
}

/// GET /api/health
///
/// Always answers 200; the body says whether the database responded.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    let db_healthy = db::ping(&state.db).await;
    (
        StatusCode::OK,
        Json(json!({
            "status": if db_healthy { "healthy" } else { "unhealthy" },
            "database": if db_healthy { "connected" } else { "disconnected" },
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
}

/// GET /api/dashboard
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<DashboardResponse>, AppError> {
    let storage = state.storage();

    let counters = storage
        .dashboard_counters(user.id)
        .await
        .context("Loading dashboard counters")?;
    let recent_workflows = storage.recent_workflows(user.id, DASHBOARD_RECENT).await?;
    let recent_executions = storage.recent_executions(user.id, DASHBOARD_RECENT).await?;

    tracing::debug!("Dashboard for user {}: {:?}", user.id, counters);

    Ok(Json(DashboardResponse {
        stats: dashboard_stats(&counters),
        recent_workflows,
        recent_executions,
        predictions: automation::dashboard_predictions(),
    }))
}

/// Success rate is a percentage with one decimal, 0 when nothing ran.
pub fn dashboard_stats(counters: &DashboardCounters) -> DashboardStats {
    let rate = calculate_percentage(
        counters.successful_executions as f64,
        counters.recorded_executions as f64,
    );

    DashboardStats {
        total_workflows: counters.total_workflows,
        active_workflows: counters.active_workflows,
        total_executions: counters.total_executions,
        success_rate: (rate * 10.0).round() / 10.0,
        ai_tokens_used: counters.ai_tokens_used,
        documents_processed: counters.documents_processed,
        leads_generated: counters.leads_generated,
        emails_sent: counters.emails_sent,
    }
}

/// Groups events by metric name, keeping the input order within each group.
pub fn group_metrics(events: Vec<AnalyticsEvent>) -> BTreeMap<String, Vec<MetricPoint>> {
    let mut metrics: BTreeMap<String, Vec<MetricPoint>> = BTreeMap::new();
    for event in events {
        metrics.entry(event.metric_name).or_default().push(MetricPoint {
            value: event.metric_value,
            date: event.date,
            metadata: event.metadata,
        });
    }
    metrics
}
