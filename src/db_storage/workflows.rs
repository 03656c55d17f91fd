use super::{provided, Storage};
use crate::errors::AppError;
use crate::models::{
    DashboardCounters, Workflow, WorkflowCreate, WorkflowExecution, WorkflowExecutionCreate,
    WorkflowUpdate,
};

/// Execution statuses counted as successful on the dashboard.
const SUCCESS_STATUSES: [&str; 2] = ["success", "completed"];

impl Storage {
    pub async fn create_workflow(
        &self,
        owner_id: i32,
        workflow: &WorkflowCreate,
    ) -> Result<Workflow, AppError> {
        sqlx::query_as::<_, Workflow>(
            r#"
            INSERT INTO workflows (name, description, owner_id, category, icon, ai_model)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&workflow.name)
        .bind(&workflow.description)
        .bind(owner_id)
        .bind(&workflow.category)
        .bind(&workflow.icon)
        .bind(&workflow.ai_model)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::DatabaseError)
    }

    pub async fn list_workflows(
        &self,
        owner_id: i32,
        status: Option<&str>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Workflow>, AppError> {
        sqlx::query_as::<_, Workflow>(
            r#"
            SELECT * FROM workflows
            WHERE owner_id = $1 AND ($2::text IS NULL OR status = $2)
            ORDER BY id
            OFFSET $3 LIMIT $4
            "#,
        )
        .bind(owner_id)
        .bind(status)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::DatabaseError)
    }

    pub async fn get_workflow(
        &self,
        owner_id: i32,
        workflow_id: i32,
    ) -> Result<Option<Workflow>, AppError> {
        sqlx::query_as::<_, Workflow>("SELECT * FROM workflows WHERE id = $1 AND owner_id = $2")
            .bind(workflow_id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    pub async fn update_workflow(
        &self,
        owner_id: i32,
        workflow_id: i32,
        update: &WorkflowUpdate,
    ) -> Result<Option<Workflow>, AppError> {
        sqlx::query_as::<_, Workflow>(
            r#"
            UPDATE workflows
            SET name = COALESCE($3, name),
                description = CASE WHEN 'description' = ANY($11::text[]) THEN NULL ELSE COALESCE($4, description) END,
                status = COALESCE($5, status),
                category = CASE WHEN 'category' = ANY($11::text[]) THEN NULL ELSE COALESCE($6, category) END,
                icon = CASE WHEN 'icon' = ANY($11::text[]) THEN NULL ELSE COALESCE($7, icon) END,
                ai_model = CASE WHEN 'ai_model' = ANY($11::text[]) THEN NULL ELSE COALESCE($8, ai_model) END,
                config = COALESCE($9, config),
                steps = COALESCE($10, steps),
                updated_at = now()
            WHERE id = $1 AND owner_id = $2
            RETURNING *
            "#,
        )
        .bind(workflow_id)
        .bind(owner_id)
        .bind(&update.name)
        .bind(provided(&update.description))
        .bind(update.status.map(|s| s.as_str()))
        .bind(provided(&update.category))
        .bind(provided(&update.icon))
        .bind(provided(&update.ai_model))
        .bind(&update.config)
        .bind(&update.steps)
        .bind(update.cleared_fields())
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::DatabaseError)
    }

    pub async fn delete_workflow(&self, owner_id: i32, workflow_id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM workflows WHERE id = $1 AND owner_id = $2")
            .bind(workflow_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;
        Ok(result.rows_affected() > 0)
    }

    /// Stores a reported execution and bumps the workflow's counter and
    /// `last_run` in one transaction. `None` when the workflow is not the
    /// owner's.
    pub async fn record_execution(
        &self,
        owner_id: i32,
        workflow_id: i32,
        execution: &WorkflowExecutionCreate,
    ) -> Result<Option<WorkflowExecution>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::DatabaseError)?;

        let owned = sqlx::query_as::<_, (i32,)>(
            "SELECT id FROM workflows WHERE id = $1 AND owner_id = $2 FOR UPDATE",
        )
        .bind(workflow_id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::DatabaseError)?;

        if owned.is_none() {
            return Ok(None);
        }

        // started_at is back-dated by the reported duration
        let recorded = sqlx::query_as::<_, WorkflowExecution>(
            r#"
            INSERT INTO workflow_executions (
                workflow_id, status, started_at, completed_at, duration,
                input_data, output_data, error_message, tokens_used, ai_model_used
            )
            VALUES (
                $1, $2, COALESCE(now() - $3 * interval '1 second', now()), now(), $3,
                $4, $5, $6, $7, $8
            )
            RETURNING *
            "#,
        )
        .bind(workflow_id)
        .bind(&execution.status)
        .bind(execution.duration)
        .bind(&execution.input_data)
        .bind(&execution.output_data)
        .bind(&execution.error_message)
        .bind(execution.tokens_used)
        .bind(&execution.ai_model_used)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::DatabaseError)?;

        sqlx::query(
            r#"
            UPDATE workflows
            SET executions = executions + 1,
                last_run = $2,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(workflow_id)
        .bind(recorded.started_at)
        .execute(&mut *tx)
        .await
        .map_err(AppError::DatabaseError)?;

        tx.commit().await.map_err(AppError::DatabaseError)?;

        tracing::info!(
            "Recorded execution {} for workflow {} ({})",
            recorded.id,
            workflow_id,
            recorded.status
        );
        Ok(Some(recorded))
    }

    pub async fn list_executions(
        &self,
        workflow_id: i32,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<WorkflowExecution>, AppError> {
        sqlx::query_as::<_, WorkflowExecution>(
            r#"
            SELECT * FROM workflow_executions
            WHERE workflow_id = $1
            ORDER BY started_at DESC, id DESC
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(workflow_id)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::DatabaseError)
    }

    pub async fn recent_workflows(&self, owner_id: i32, limit: i64) -> Result<Vec<Workflow>, AppError> {
        sqlx::query_as::<_, Workflow>(
            "SELECT * FROM workflows WHERE owner_id = $1 ORDER BY updated_at DESC, id DESC LIMIT $2",
        )
        .bind(owner_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::DatabaseError)
    }

    /// Most recent executions across all of the owner's workflows.
    pub async fn recent_executions(
        &self,
        owner_id: i32,
        limit: i64,
    ) -> Result<Vec<WorkflowExecution>, AppError> {
        sqlx::query_as::<_, WorkflowExecution>(
            r#"
            SELECT e.* FROM workflow_executions e
            JOIN workflows w ON w.id = e.workflow_id
            WHERE w.owner_id = $1
            ORDER BY e.started_at DESC, e.id DESC
            LIMIT $2
            "#,
        )
        .bind(owner_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::DatabaseError)
    }

    pub async fn dashboard_counters(&self, owner_id: i32) -> Result<DashboardCounters, AppError> {
        let (total_workflows, active_workflows, total_executions) =
            sqlx::query_as::<_, (i64, i64, i64)>(
                r#"
                SELECT COUNT(*),
                       COUNT(*) FILTER (WHERE status = 'active'),
                       COALESCE(SUM(executions), 0)::bigint
                FROM workflows WHERE owner_id = $1
                "#,
            )
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;

        let (recorded_executions, successful_executions, ai_tokens_used) =
            sqlx::query_as::<_, (i64, i64, i64)>(
                r#"
                SELECT COUNT(e.id),
                       COUNT(e.id) FILTER (WHERE e.status = ANY($2)),
                       COALESCE(SUM(e.tokens_used), 0)::bigint
                FROM workflow_executions e
                JOIN workflows w ON w.id = e.workflow_id
                WHERE w.owner_id = $1
                "#,
            )
            .bind(owner_id)
            .bind(&SUCCESS_STATUSES[..])
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;

        let (documents_processed, leads_generated, emails_sent) =
            sqlx::query_as::<_, (i64, i64, i64)>(
                r#"
                SELECT
                    (SELECT COUNT(*) FROM documents WHERE owner_id = $1 AND status = 'processed'),
                    (SELECT COUNT(*) FROM leads WHERE owner_id = $1),
                    (SELECT COALESCE(SUM(sent), 0)::bigint FROM email_campaigns WHERE owner_id = $1)
                "#,
            )
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;

        Ok(DashboardCounters {
            total_workflows,
            active_workflows,
            total_executions,
            recorded_executions,
            successful_executions,
            ai_tokens_used,
            documents_processed,
            leads_generated,
            emails_sent,
        })
    }
}
