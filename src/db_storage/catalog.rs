use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{json_list, Storage};
use crate::errors::AppError;
use crate::models::{AiModel, AiModelCreate, AnalyticsEvent, Integration, IntegrationUpdate};

impl Storage {
    // ============ Integrations ============

    pub async fn list_integrations(&self) -> Result<Vec<Integration>, AppError> {
        sqlx::query_as::<_, Integration>("SELECT * FROM integrations ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    pub async fn update_integration(
        &self,
        integration_id: i32,
        update: &IntegrationUpdate,
    ) -> Result<Option<Integration>, AppError> {
        sqlx::query_as::<_, Integration>(
            r#"
            UPDATE integrations
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                icon = COALESCE($4, icon),
                category = COALESCE($5, category),
                status = COALESCE($6, status),
                config = COALESCE($7, config),
                api_calls = COALESCE($8, api_calls),
                last_sync = COALESCE($9, last_sync),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(integration_id)
        .bind(&update.name)
        .bind(&update.description)
        .bind(&update.icon)
        .bind(&update.category)
        .bind(&update.status)
        .bind(&update.config)
        .bind(update.api_calls)
        .bind(update.last_sync)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::DatabaseError)
    }

    // ============ AI models ============

    pub async fn list_active_ai_models(&self) -> Result<Vec<AiModel>, AppError> {
        sqlx::query_as::<_, AiModel>("SELECT * FROM ai_models WHERE status = 'active' ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    pub async fn create_ai_model(&self, model: &AiModelCreate) -> Result<AiModel, AppError> {
        sqlx::query_as::<_, AiModel>(
            r#"
            INSERT INTO ai_models (
                name, provider, model_id, description, strengths, price_per_token, max_tokens
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&model.name)
        .bind(&model.provider)
        .bind(&model.model_id)
        .bind(&model.description)
        .bind(model.strengths.as_deref().map(json_list))
        .bind(model.price_per_token)
        .bind(model.max_tokens)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::DatabaseError)
    }

    // ============ Analytics ============

    pub async fn log_event(
        &self,
        user_id: i32,
        metric_name: &str,
        metric_value: f64,
        metadata: Option<Value>,
    ) -> Result<AnalyticsEvent, AppError> {
        sqlx::query_as::<_, AnalyticsEvent>(
            r#"
            INSERT INTO analytics_events (user_id, metric_name, metric_value, metadata)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(metric_name)
        .bind(metric_value)
        .bind(metadata)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::DatabaseError)
    }

    /// Events dated at or after `since`, newest first, optionally for one metric.
    pub async fn list_events_since(
        &self,
        user_id: i32,
        since: DateTime<Utc>,
        metric: Option<&str>,
    ) -> Result<Vec<AnalyticsEvent>, AppError> {
        sqlx::query_as::<_, AnalyticsEvent>(
            r#"
            SELECT * FROM analytics_events
            WHERE user_id = $1 AND date >= $2 AND ($3::text IS NULL OR metric_name = $3)
            ORDER BY date DESC, id DESC
            "#,
        )
        .bind(user_id)
        .bind(since)
        .bind(metric)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::DatabaseError)
    }
}
