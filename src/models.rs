use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::FromRow;

use crate::scoring::LeadAttributes;

/// Declares a status-like enum stored as lowercase text.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

text_enum!(WorkflowStatus {
    Active => "active",
    Draft => "draft",
    Paused => "paused",
    Archived => "archived",
});

text_enum!(DocumentStatus {
    Processing => "processing",
    Processed => "processed",
    Failed => "failed",
});

text_enum!(LeadStatus {
    Hot => "hot",
    Warm => "warm",
    Cold => "cold",
});

text_enum!(TicketStatus {
    Open => "open",
    InProgress => "in_progress",
    Resolved => "resolved",
    Closed => "closed",
});

text_enum!(TicketPriority {
    Low => "low",
    Medium => "medium",
    High => "high",
    Urgent => "urgent",
});

text_enum!(CampaignStatus {
    Draft => "draft",
    Active => "active",
    Paused => "paused",
    Completed => "completed",
});

text_enum!(UserRole {
    Admin => "admin",
    User => "user",
    Viewer => "viewer",
});

text_enum!(SubscriptionPlan {
    Starter => "starter",
    Pro => "pro",
    Enterprise => "enterprise",
});

// ============ Database Models ============

/// A tenant account. Every owned resource hangs off a user id.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin.as_str()
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Subscription {
    pub id: i32,
    pub user_id: i32,
    pub plan: String,
    pub status: String,
    pub next_billing: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Workflow {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: i32,
    pub status: String,
    pub category: Option<String>,
    pub icon: Option<String>,
    pub ai_model: Option<String>,
    pub triggers: i32,
    pub executions: i32,
    pub last_run: Option<DateTime<Utc>>,
    pub config: Option<Value>,
    pub steps: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A client-reported run of a workflow.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkflowExecution {
    pub id: i32,
    pub workflow_id: i32,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Seconds.
    pub duration: Option<f64>,
    pub input_data: Option<Value>,
    pub output_data: Option<Value>,
    pub error_message: Option<String>,
    pub tokens_used: Option<i32>,
    pub ai_model_used: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Document {
    pub id: i32,
    pub name: String,
    pub owner_id: i32,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub status: String,
    pub file_path: Option<String>,
    pub file_size: Option<i64>,
    pub mime_type: Option<String>,
    pub extracted_data: Option<Value>,
    pub confidence: Option<f64>,
    pub processed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A sales prospect together with its scoring output.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Lead {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub owner_id: i32,
    pub source: Option<String>,
    pub status: String,
    pub score: i32,
    pub predicted_value: Option<f64>,
    pub last_activity: Option<DateTime<Utc>>,
    pub ai_insights: Option<Value>,
    pub tags: Option<Value>,
    pub custom_fields: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Lead> for LeadAttributes {
    fn from(lead: &Lead) -> Self {
        Self {
            name: lead.name.clone(),
            email: lead.email.clone(),
            company: lead.company.clone(),
            phone: lead.phone.clone(),
            source: lead.source.clone(),
            last_activity: lead.last_activity.map(|ts| ts.to_rfc3339()),
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EmailCampaign {
    pub id: i32,
    pub name: String,
    pub owner_id: i32,
    pub status: String,
    #[serde(rename = "type")]
    pub campaign_type: Option<String>,
    pub subject: Option<String>,
    pub content: Option<String>,
    pub recipients: i32,
    pub sent: i32,
    pub opened: i32,
    pub clicked: i32,
    pub converted: i32,
    pub revenue: f64,
    pub steps: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SupportTicket {
    pub id: i32,
    pub subject: String,
    pub customer_id: i32,
    pub status: String,
    pub priority: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub ai_sentiment: Option<String>,
    pub ai_summary: Option<String>,
    pub ai_suggested_actions: Option<Value>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ApiKey {
    pub id: i32,
    pub name: String,
    pub user_id: i32,
    pub key: String,
    pub permissions: Option<Value>,
    pub last_used: Option<DateTime<Utc>>,
    pub calls_count: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SecurityLog {
    pub id: i32,
    pub user_id: Option<i32>,
    pub action: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
    pub details: Option<Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Integration {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub category: Option<String>,
    pub status: String,
    pub config: Option<Value>,
    pub api_calls: i32,
    pub last_sync: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AiModel {
    pub id: i32,
    pub name: String,
    pub provider: String,
    pub model_id: String,
    pub description: Option<String>,
    pub strengths: Option<Value>,
    pub price_per_token: Option<f64>,
    pub max_tokens: Option<i32>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AnalyticsEvent {
    pub id: i32,
    pub user_id: i32,
    pub date: DateTime<Utc>,
    pub metric_name: String,
    pub metric_value: Option<f64>,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
}

// ============ API Request/Response Models ============

/// `skip`/`limit` query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct Pagination {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// Pagination plus an optional status filter.
#[derive(Debug, Deserialize)]
pub struct StatusFilter<S> {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<S>,
}

impl<S> StatusFilter<S> {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            skip: self.skip,
            limit: self.limit,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UserCreate {
    pub name: String,
    pub email: String,
    pub password: String,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
}

/// Update field for a nullable column: absent is `None`, an explicit
/// `null` is `Some(None)` and clears the column.
pub type Nullable<T> = Option<Option<T>>;

fn nullable<'de, D, T>(deserializer: D) -> Result<Nullable<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Names of the columns a partial update sets to NULL.
fn cleared(fields: &[(&'static str, bool)]) -> Vec<&'static str> {
    fields
        .iter()
        .filter(|(_, clear)| *clear)
        .map(|(name, _)| *name)
        .collect()
}

fn is_null<T>(field: &Nullable<T>) -> bool {
    matches!(field, Some(None))
}

#[derive(Debug, Default, Deserialize)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub company: Nullable<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub phone: Nullable<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub avatar: Nullable<String>,
}

impl UserUpdate {
    pub fn cleared_fields(&self) -> Vec<&'static str> {
        cleared(&[
            ("company", is_null(&self.company)),
            ("phone", is_null(&self.phone)),
            ("avatar", is_null(&self.avatar)),
        ])
    }
}

#[derive(Debug, Deserialize)]
pub struct UserLogin {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionUpdate {
    pub plan: SubscriptionPlan,
}

#[derive(Debug, Deserialize)]
pub struct WorkflowCreate {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub icon: Option<String>,
    pub ai_model: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WorkflowUpdate {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Nullable<String>,
    pub status: Option<WorkflowStatus>,
    #[serde(default, deserialize_with = "nullable")]
    pub category: Nullable<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub icon: Nullable<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub ai_model: Nullable<String>,
    pub config: Option<Value>,
    pub steps: Option<Value>,
}

impl WorkflowUpdate {
    pub fn cleared_fields(&self) -> Vec<&'static str> {
        cleared(&[
            ("description", is_null(&self.description)),
            ("category", is_null(&self.category)),
            ("icon", is_null(&self.icon)),
            ("ai_model", is_null(&self.ai_model)),
        ])
    }
}

#[derive(Debug, Deserialize)]
pub struct WorkflowExecutionCreate {
    pub status: String,
    pub input_data: Option<Value>,
    pub output_data: Option<Value>,
    pub error_message: Option<String>,
    pub tokens_used: Option<i32>,
    pub ai_model_used: Option<String>,
    /// Seconds.
    pub duration: Option<f64>,
}

/// Document row fields known at upload time.
#[derive(Debug)]
pub struct NewDocument {
    pub name: String,
    pub doc_type: String,
    pub file_path: String,
    pub file_size: i64,
    pub mime_type: String,
}

#[derive(Debug, Serialize)]
pub struct FileUploadResponse {
    pub filename: String,
    pub file_size: i64,
    pub mime_type: String,
    pub file_path: String,
    pub upload_id: String,
}

#[derive(Debug, Serialize)]
pub struct DocumentProcessResponse {
    pub message: String,
    pub document: Document,
}

#[derive(Debug, Deserialize)]
pub struct LeadCreate {
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub source: Option<String>,
    /// Raw timestamp of the prospect's last interaction, if the caller has one.
    pub last_activity: Option<String>,
}

impl From<&LeadCreate> for LeadAttributes {
    fn from(lead: &LeadCreate) -> Self {
        Self {
            name: lead.name.clone(),
            email: lead.email.clone(),
            company: lead.company.clone(),
            phone: lead.phone.clone(),
            source: lead.source.clone(),
            last_activity: lead.last_activity.clone(),
        }
    }
}

impl LeadCreate {
    /// The supplied activity timestamp, when it parses. This is what gets stored.
    pub fn parsed_last_activity(&self) -> Option<DateTime<Utc>> {
        self.last_activity
            .as_deref()
            .and_then(crate::scoring::parse_activity_timestamp)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LeadUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub company: Nullable<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub phone: Nullable<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub source: Nullable<String>,
    pub status: Option<LeadStatus>,
    pub score: Option<i32>,
    pub predicted_value: Option<f64>,
    #[serde(default, deserialize_with = "nullable")]
    pub last_activity: Nullable<DateTime<Utc>>,
    pub ai_insights: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub custom_fields: Option<Value>,
}

impl LeadUpdate {
    pub fn cleared_fields(&self) -> Vec<&'static str> {
        cleared(&[
            ("company", is_null(&self.company)),
            ("phone", is_null(&self.phone)),
            ("source", is_null(&self.source)),
            ("last_activity", is_null(&self.last_activity)),
        ])
    }
}

#[derive(Debug, Deserialize)]
pub struct EmailCampaignCreate {
    pub name: String,
    #[serde(rename = "type")]
    pub campaign_type: String,
    pub subject: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EmailCampaignUpdate {
    pub name: Option<String>,
    pub status: Option<CampaignStatus>,
    #[serde(rename = "type", default, deserialize_with = "nullable")]
    pub campaign_type: Nullable<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub subject: Nullable<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub content: Nullable<String>,
    pub recipients: Option<i32>,
    pub sent: Option<i32>,
    pub opened: Option<i32>,
    pub clicked: Option<i32>,
    pub converted: Option<i32>,
    pub revenue: Option<f64>,
    pub steps: Option<Value>,
}

impl EmailCampaignUpdate {
    pub fn cleared_fields(&self) -> Vec<&'static str> {
        cleared(&[
            ("campaign_type", is_null(&self.campaign_type)),
            ("subject", is_null(&self.subject)),
            ("content", is_null(&self.content)),
        ])
    }
}

#[derive(Debug, Deserialize)]
pub struct SupportTicketCreate {
    pub subject: String,
    pub category: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SupportTicketUpdate {
    pub subject: Option<String>,
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    #[serde(default, deserialize_with = "nullable")]
    pub category: Nullable<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Nullable<String>,
    pub ai_sentiment: Option<String>,
    pub ai_summary: Option<String>,
    pub ai_suggested_actions: Option<Vec<String>>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl SupportTicketUpdate {
    pub fn cleared_fields(&self) -> Vec<&'static str> {
        cleared(&[
            ("category", is_null(&self.category)),
            ("description", is_null(&self.description)),
        ])
    }
}

#[derive(Debug, Deserialize)]
pub struct ApiKeyCreate {
    pub name: String,
    pub permissions: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiKeyUpdate {
    pub name: Option<String>,
    pub permissions: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct IntegrationUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub config: Option<Value>,
    pub api_calls: Option<i32>,
    pub last_sync: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct AiModelCreate {
    pub name: String,
    pub provider: String,
    pub model_id: String,
    pub description: Option<String>,
    pub strengths: Option<Vec<String>>,
    pub price_per_token: Option<f64>,
    pub max_tokens: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyticsCreate {
    pub metric_name: String,
    pub metric_value: f64,
    pub metadata: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub days: Option<i64>,
    pub metric: Option<String>,
}

/// One recorded value of a metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricPoint {
    pub value: Option<f64>,
    pub date: DateTime<Utc>,
    pub metadata: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    pub metrics: std::collections::BTreeMap<String, Vec<MetricPoint>>,
}

fn default_sender() -> String {
    "user".to_string()
}

fn default_message_type() -> String {
    "text".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ChatMessage {
    pub message: String,
    #[serde(default = "default_sender")]
    pub sender: String,
    #[serde(rename = "type", default = "default_message_type")]
    pub message_type: String,
    pub model: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub id: String,
    pub message: String,
    pub sender: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub message_type: String,
    pub model: Option<String>,
    pub data: Option<Value>,
}

/// Aggregates read for the dashboard in one round of queries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardCounters {
    pub total_workflows: i64,
    pub active_workflows: i64,
    pub total_executions: i64,
    pub recorded_executions: i64,
    pub successful_executions: i64,
    pub ai_tokens_used: i64,
    pub documents_processed: i64,
    pub leads_generated: i64,
    pub emails_sent: i64,
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_workflows: i64,
    pub active_workflows: i64,
    pub total_executions: i64,
    pub success_rate: f64,
    pub ai_tokens_used: i64,
    pub documents_processed: i64,
    pub leads_generated: i64,
    pub emails_sent: i64,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub stats: DashboardStats,
    pub recent_workflows: Vec<Workflow>,
    pub recent_executions: Vec<WorkflowExecution>,
    pub predictions: Value,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_use_wire_names() {
        assert_eq!(TicketStatus::InProgress.as_str(), "in_progress");
        assert_eq!(
            serde_json::to_value(WorkflowStatus::Archived).unwrap(),
            serde_json::json!("archived")
        );
        let status: LeadStatus = serde_json::from_str("\"warm\"").unwrap();
        assert_eq!(status, LeadStatus::Warm);
        assert!(serde_json::from_str::<LeadStatus>("\"lukewarm\"").is_err());
    }

    #[test]
    fn chat_message_defaults() {
        let msg: ChatMessage = serde_json::from_str(r#"{"message":"Bonjour"}"#).unwrap();
        assert_eq!(msg.sender, "user");
        assert_eq!(msg.message_type, "text");
        assert!(msg.model.is_none());
    }

    #[test]
    fn campaign_type_uses_type_key() {
        let create: EmailCampaignCreate =
            serde_json::from_str(r#"{"name":"Relance","type":"automated"}"#).unwrap();
        assert_eq!(create.campaign_type, "automated");
    }

    fn stored(payload: &LeadCreate, now: DateTime<Utc>) -> Lead {
        Lead {
            id: 1,
            name: payload.name.clone(),
            email: payload.email.clone(),
            company: payload.company.clone(),
            phone: payload.phone.clone(),
            owner_id: 1,
            source: payload.source.clone(),
            status: LeadStatus::Cold.as_str().to_string(),
            score: 0,
            predicted_value: None,
            last_activity: payload.parsed_last_activity(),
            ai_insights: None,
            tags: None,
            custom_fields: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn rescoring_a_fresh_lead_keeps_its_score() {
        use crate::scoring::{evaluate, FixedJitter};

        let now = Utc::now();
        for last_activity in [None, Some("hier"), Some("2024-13-45"), Some("")]
            .into_iter()
            .map(|raw| raw.map(str::to_string))
            .chain([Some((now - chrono::Duration::days(3)).to_rfc3339())])
        {
            let payload = LeadCreate {
                name: "Alice".to_string(),
                email: "a@gmail.com".to_string(),
                company: None,
                phone: None,
                source: None,
                last_activity: last_activity.clone(),
            };

            let created = evaluate(&LeadAttributes::from(&payload), now, &mut FixedJitter(1.0));
            let rescored = evaluate(
                &LeadAttributes::from(&stored(&payload, now)),
                now,
                &mut FixedJitter(1.0),
            );
            assert_eq!(created, rescored, "last_activity = {:?}", last_activity);
        }
    }

    #[test]
    fn unparseable_activity_is_not_stored() {
        let payload = LeadCreate {
            name: "Alice".to_string(),
            email: "a@gmail.com".to_string(),
            company: None,
            phone: None,
            source: None,
            last_activity: Some("la semaine dernière".to_string()),
        };
        assert!(payload.parsed_last_activity().is_none());
    }

    #[test]
    fn explicit_null_clears_but_absent_keeps() {
        let update: LeadUpdate =
            serde_json::from_str(r#"{"company": null, "phone": "+33 6 00 00 00 00"}"#).unwrap();
        assert_eq!(update.company, Some(None));
        assert_eq!(update.phone, Some(Some("+33 6 00 00 00 00".to_string())));
        assert_eq!(update.source, None);
        assert_eq!(update.cleared_fields(), vec!["company"]);

        let update: EmailCampaignUpdate =
            serde_json::from_str(r#"{"type": null, "subject": null, "sent": 3}"#).unwrap();
        assert_eq!(update.cleared_fields(), vec!["campaign_type", "subject"]);
        assert_eq!(update.sent, Some(3));

        assert!(UserUpdate::default().cleared_fields().is_empty());
    }

    #[test]
    fn user_serialization_hides_password_hash() {
        let user = User {
            id: 1,
            name: "Jean Dupont".to_string(),
            email: "jean.dupont@example.com".to_string(),
            company: None,
            phone: None,
            avatar: None,
            hashed_password: "sha256$00$ff".to_string(),
            role: "admin".to_string(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("hashed_password").is_none());
        assert!(user.is_admin());
    }
}
