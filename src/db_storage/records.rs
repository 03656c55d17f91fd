use chrono::Utc;
use serde_json::Value;

use super::{json_list, provided, Storage};
use crate::automation::TicketTriage;
use crate::errors::AppError;
use crate::models::{
    Document, EmailCampaign, EmailCampaignCreate, EmailCampaignUpdate, Lead, LeadCreate,
    LeadStatus, LeadUpdate, NewDocument, SupportTicket, SupportTicketCreate,
    SupportTicketUpdate, TicketStatus,
};
use crate::scoring::ScoreResult;

impl Storage {
    // ============ Documents ============

    pub async fn create_document(
        &self,
        owner_id: i32,
        document: &NewDocument,
    ) -> Result<Document, AppError> {
        sqlx::query_as::<_, Document>(
            r#"
            INSERT INTO documents (name, owner_id, doc_type, file_path, file_size, mime_type)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&document.name)
        .bind(owner_id)
        .bind(&document.doc_type)
        .bind(&document.file_path)
        .bind(document.file_size)
        .bind(&document.mime_type)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::DatabaseError)
    }

    pub async fn list_documents(
        &self,
        owner_id: i32,
        status: Option<&str>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Document>, AppError> {
        sqlx::query_as::<_, Document>(
            r#"
            SELECT * FROM documents
            WHERE owner_id = $1 AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC, id DESC
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

    pub async fn get_document(
        &self,
        owner_id: i32,
        document_id: i32,
    ) -> Result<Option<Document>, AppError> {
        sqlx::query_as::<_, Document>("SELECT * FROM documents WHERE id = $1 AND owner_id = $2")
            .bind(document_id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    /// Stores extraction output and marks the document processed.
    pub async fn mark_document_processed(
        &self,
        document_id: i32,
        extracted_data: &Value,
        confidence: f64,
    ) -> Result<Document, AppError> {
        sqlx::query_as::<_, Document>(
            r#"
            UPDATE documents
            SET status = 'processed',
                extracted_data = $2,
                confidence = $3,
                processed_at = now(),
                error_message = NULL,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(document_id)
        .bind(extracted_data)
        .bind(confidence)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::DatabaseError)
    }

    // ============ Leads ============

    /// Inserts a lead with its scoring output. `last_activity` stays NULL
    /// unless the supplied timestamp parses.
    pub async fn create_lead(
        &self,
        owner_id: i32,
        lead: &LeadCreate,
        scored: &ScoreResult,
    ) -> Result<Lead, AppError> {
        sqlx::query_as::<_, Lead>(
            r#"
            INSERT INTO leads (
                name, email, company, phone, owner_id, source, status,
                score, predicted_value, last_activity, ai_insights
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(&lead.name)
        .bind(&lead.email)
        .bind(&lead.company)
        .bind(&lead.phone)
        .bind(owner_id)
        .bind(&lead.source)
        .bind(LeadStatus::Cold.as_str())
        .bind(scored.score as i32)
        .bind(scored.predicted_value)
        .bind(lead.parsed_last_activity())
        .bind(json_list(&scored.insights))
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::DatabaseError)
    }

    pub async fn list_leads(
        &self,
        owner_id: i32,
        status: Option<&str>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Lead>, AppError> {
        sqlx::query_as::<_, Lead>(
            r#"
            SELECT * FROM leads
            WHERE owner_id = $1 AND ($2::text IS NULL OR status = $2)
            ORDER BY score DESC, id
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

    pub async fn get_lead(&self, owner_id: i32, lead_id: i32) -> Result<Option<Lead>, AppError> {
        sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE id = $1 AND owner_id = $2")
            .bind(lead_id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    /// Partial update. Scores are stored as given, never recomputed here.
    pub async fn update_lead(
        &self,
        owner_id: i32,
        lead_id: i32,
        update: &LeadUpdate,
    ) -> Result<Option<Lead>, AppError> {
        sqlx::query_as::<_, Lead>(
            r#"
            UPDATE leads
            SET name = COALESCE($3, name),
                email = COALESCE($4, email),
                company = CASE WHEN 'company' = ANY($15::text[]) THEN NULL ELSE COALESCE($5, company) END,
                phone = CASE WHEN 'phone' = ANY($15::text[]) THEN NULL ELSE COALESCE($6, phone) END,
                source = CASE WHEN 'source' = ANY($15::text[]) THEN NULL ELSE COALESCE($7, source) END,
                status = COALESCE($8, status),
                score = COALESCE($9, score),
                predicted_value = COALESCE($10, predicted_value),
                last_activity = CASE WHEN 'last_activity' = ANY($15::text[]) THEN NULL ELSE COALESCE($11, last_activity) END,
                ai_insights = COALESCE($12, ai_insights),
                tags = COALESCE($13, tags),
                custom_fields = COALESCE($14, custom_fields),
                updated_at = now()
            WHERE id = $1 AND owner_id = $2
            RETURNING *
            "#,
        )
        .bind(lead_id)
        .bind(owner_id)
        .bind(&update.name)
        .bind(&update.email)
        .bind(provided(&update.company))
        .bind(provided(&update.phone))
        .bind(provided(&update.source))
        .bind(update.status.map(|s| s.as_str()))
        .bind(update.score)
        .bind(update.predicted_value)
        .bind(provided(&update.last_activity))
        .bind(update.ai_insights.as_deref().map(json_list))
        .bind(update.tags.as_deref().map(json_list))
        .bind(&update.custom_fields)
        .bind(update.cleared_fields())
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::DatabaseError)
    }

    /// Overwrites score, value and insights with a fresh evaluation.
    pub async fn apply_lead_score(&self, lead_id: i32, scored: &ScoreResult) -> Result<Lead, AppError> {
        sqlx::query_as::<_, Lead>(
            r#"
            UPDATE leads
            SET score = $2,
                predicted_value = $3,
                ai_insights = $4,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(lead_id)
        .bind(scored.score as i32)
        .bind(scored.predicted_value)
        .bind(json_list(&scored.insights))
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::DatabaseError)
    }

    pub async fn delete_lead(&self, owner_id: i32, lead_id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM leads WHERE id = $1 AND owner_id = $2")
            .bind(lead_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;
        Ok(result.rows_affected() > 0)
    }

    // ============ Email campaigns ============

    pub async fn create_campaign(
        &self,
        owner_id: i32,
        campaign: &EmailCampaignCreate,
    ) -> Result<EmailCampaign, AppError> {
        sqlx::query_as::<_, EmailCampaign>(
            r#"
            INSERT INTO email_campaigns (name, owner_id, campaign_type, subject, content)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&campaign.name)
        .bind(owner_id)
        .bind(&campaign.campaign_type)
        .bind(&campaign.subject)
        .bind(&campaign.content)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::DatabaseError)
    }

    pub async fn list_campaigns(
        &self,
        owner_id: i32,
        status: Option<&str>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<EmailCampaign>, AppError> {
        sqlx::query_as::<_, EmailCampaign>(
            r#"
            SELECT * FROM email_campaigns
            WHERE owner_id = $1 AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC, id DESC
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

    pub async fn get_campaign(
        &self,
        owner_id: i32,
        campaign_id: i32,
    ) -> Result<Option<EmailCampaign>, AppError> {
        sqlx::query_as::<_, EmailCampaign>(
            "SELECT * FROM email_campaigns WHERE id = $1 AND owner_id = $2",
        )
        .bind(campaign_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::DatabaseError)
    }

    pub async fn update_campaign(
        &self,
        owner_id: i32,
        campaign_id: i32,
        update: &EmailCampaignUpdate,
    ) -> Result<Option<EmailCampaign>, AppError> {
        sqlx::query_as::<_, EmailCampaign>(
            r#"
            UPDATE email_campaigns
            SET name = COALESCE($3, name),
                status = COALESCE($4, status),
                campaign_type = CASE WHEN 'campaign_type' = ANY($15::text[]) THEN NULL ELSE COALESCE($5, campaign_type) END,
                subject = CASE WHEN 'subject' = ANY($15::text[]) THEN NULL ELSE COALESCE($6, subject) END,
                content = CASE WHEN 'content' = ANY($15::text[]) THEN NULL ELSE COALESCE($7, content) END,
                recipients = COALESCE($8, recipients),
                sent = COALESCE($9, sent),
                opened = COALESCE($10, opened),
                clicked = COALESCE($11, clicked),
                converted = COALESCE($12, converted),
                revenue = COALESCE($13, revenue),
                steps = COALESCE($14, steps),
                updated_at = now()
            WHERE id = $1 AND owner_id = $2
            RETURNING *
            "#,
        )
        .bind(campaign_id)
        .bind(owner_id)
        .bind(&update.name)
        .bind(update.status.map(|s| s.as_str()))
        .bind(provided(&update.campaign_type))
        .bind(provided(&update.subject))
        .bind(provided(&update.content))
        .bind(update.recipients)
        .bind(update.sent)
        .bind(update.opened)
        .bind(update.clicked)
        .bind(update.converted)
        .bind(update.revenue)
        .bind(&update.steps)
        .bind(update.cleared_fields())
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::DatabaseError)
    }

    // ============ Support tickets ============

    pub async fn create_ticket(
        &self,
        customer_id: i32,
        ticket: &SupportTicketCreate,
        triage: &TicketTriage,
    ) -> Result<SupportTicket, AppError> {
        sqlx::query_as::<_, SupportTicket>(
            r#"
            INSERT INTO support_tickets (
                subject, customer_id, priority, category, description,
                ai_sentiment, ai_summary, ai_suggested_actions
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&ticket.subject)
        .bind(customer_id)
        .bind(triage.priority.as_str())
        .bind(&ticket.category)
        .bind(&ticket.description)
        .bind(triage.sentiment)
        .bind(&triage.summary)
        .bind(json_list(&triage.suggested_actions))
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::DatabaseError)
    }

    pub async fn list_tickets(
        &self,
        customer_id: i32,
        status: Option<&str>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<SupportTicket>, AppError> {
        sqlx::query_as::<_, SupportTicket>(
            r#"
            SELECT * FROM support_tickets
            WHERE customer_id = $1 AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC, id DESC
            OFFSET $3 LIMIT $4
            "#,
        )
        .bind(customer_id)
        .bind(status)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::DatabaseError)
    }

    pub async fn get_ticket(
        &self,
        customer_id: i32,
        ticket_id: i32,
    ) -> Result<Option<SupportTicket>, AppError> {
        sqlx::query_as::<_, SupportTicket>(
            "SELECT * FROM support_tickets WHERE id = $1 AND customer_id = $2",
        )
        .bind(ticket_id)
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::DatabaseError)
    }

    /// Partial update. Moving to resolved or closed stamps `resolved_at`
    /// unless the caller supplied one.
    pub async fn update_ticket(
        &self,
        customer_id: i32,
        ticket_id: i32,
        update: &SupportTicketUpdate,
    ) -> Result<Option<SupportTicket>, AppError> {
        let resolved_at = update.resolved_at.or_else(|| {
            matches!(
                update.status,
                Some(TicketStatus::Resolved) | Some(TicketStatus::Closed)
            )
            .then(Utc::now)
        });

        sqlx::query_as::<_, SupportTicket>(
            r#"
            UPDATE support_tickets
            SET subject = COALESCE($3, subject),
                status = COALESCE($4, status),
                priority = COALESCE($5, priority),
                category = CASE WHEN 'category' = ANY($12::text[]) THEN NULL ELSE COALESCE($6, category) END,
                description = CASE WHEN 'description' = ANY($12::text[]) THEN NULL ELSE COALESCE($7, description) END,
                ai_sentiment = COALESCE($8, ai_sentiment),
                ai_summary = COALESCE($9, ai_summary),
                ai_suggested_actions = COALESCE($10, ai_suggested_actions),
                resolved_at = COALESCE($11, resolved_at),
                updated_at = now()
            WHERE id = $1 AND customer_id = $2
            RETURNING *
            "#,
        )
        .bind(ticket_id)
        .bind(customer_id)
        .bind(&update.subject)
        .bind(update.status.map(|s| s.as_str()))
        .bind(update.priority.map(|p| p.as_str()))
        .bind(provided(&update.category))
        .bind(provided(&update.description))
        .bind(&update.ai_sentiment)
        .bind(&update.ai_summary)
        .bind(update.ai_suggested_actions.as_deref().map(json_list))
        .bind(resolved_at)
        .bind(update.cleared_fields())
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::DatabaseError)
    }
}
