use chrono::Utc;
use std::env;
use uuid::Uuid;

use lezelote_api::auth::hash_password;
use lezelote_api::db::Database;
use lezelote_api::db_storage::Storage;
use lezelote_api::models::{
    LeadCreate, LeadUpdate, SupportTicketCreate, SupportTicketUpdate, TicketStatus, UserCreate,
    WorkflowCreate, WorkflowExecutionCreate,
};
use lezelote_api::automation::triage_ticket;
use lezelote_api::scoring::{self, FixedJitter, LeadAttributes};

async fn storage() -> anyhow::Result<Storage> {
    let db_url = env::var("TEST_DATABASE_URL")
        .or_else(|_| env::var("DATABASE_URL"))
        .map_err(|_| anyhow::anyhow!("Set TEST_DATABASE_URL or DATABASE_URL to run this test"))?;

    let db = Database::new(&db_url, 2).await?;
    Ok(Storage::new(db.pool.clone()))
}

async fn new_user(storage: &Storage) -> anyhow::Result<i32> {
    // Unique email so repeated runs don't collide
    let email = format!("smoke-{}@example.com", Uuid::new_v4().simple());
    let user = storage
        .create_user(
            &UserCreate {
                name: "Smoke Test".to_string(),
                email,
                password: "password".to_string(),
                company: None,
                phone: None,
                avatar: None,
            },
            &hash_password("password"),
            "user",
        )
        .await?;
    Ok(user.id)
}

/// Lead creation stores the scoring output and stays owner-scoped.
/// Marked ignored to avoid running against production by accident; set TEST_DATABASE_URL to run.
#[tokio::test]
#[ignore]
async fn lead_round_trip_smoke_test() -> anyhow::Result<()> {
    let storage = storage().await?;
    let owner = new_user(&storage).await?;
    let stranger = new_user(&storage).await?;

    let payload = LeadCreate {
        name: "Marie Dubois".to_string(),
        email: "marie.dubois@innovacorp.fr".to_string(),
        company: Some("InnovaCorp".to_string()),
        phone: Some("+33 1 23 45 67 89".to_string()),
        source: Some("Referral".to_string()),
        last_activity: None,
    };
    let scored = scoring::evaluate(&LeadAttributes::from(&payload), Utc::now(), &mut FixedJitter(1.0));
    let lead = storage.create_lead(owner, &payload, &scored).await?;

    assert_eq!(lead.score, scored.score as i32);
    assert!(lead.last_activity.is_none());
    assert_eq!(lead.status, "cold");
    assert_eq!(lead.predicted_value, Some(scored.predicted_value));

    assert!(storage.get_lead(owner, lead.id).await?.is_some());
    assert!(storage.get_lead(stranger, lead.id).await?.is_none());

    let update: LeadUpdate = serde_json::from_str(r#"{"phone": null, "source": "LinkedIn"}"#)?;
    let lead = storage
        .update_lead(owner, lead.id, &update)
        .await?
        .ok_or_else(|| anyhow::anyhow!("lead vanished"))?;
    assert!(lead.phone.is_none());
    assert_eq!(lead.company.as_deref(), Some("InnovaCorp"));
    assert_eq!(lead.source.as_deref(), Some("LinkedIn"));
    assert_eq!(lead.score, scored.score as i32);

    assert!(!storage.delete_lead(stranger, lead.id).await?);
    assert!(storage.delete_lead(owner, lead.id).await?);
    Ok(())
}

/// Recording an execution bumps the workflow counter and feeds the dashboard.
#[tokio::test]
#[ignore]
async fn execution_updates_workflow_and_dashboard() -> anyhow::Result<()> {
    let storage = storage().await?;
    let owner = new_user(&storage).await?;

    let workflow = storage
        .create_workflow(
            owner,
            &WorkflowCreate {
                name: "Analyse de Prospects IA".to_string(),
                description: None,
                category: Some("Lead Generation".to_string()),
                icon: None,
                ai_model: Some("GPT-4".to_string()),
            },
        )
        .await?;
    assert_eq!(workflow.executions, 0);

    for status in ["success", "failed"] {
        storage
            .record_execution(
                owner,
                workflow.id,
                &WorkflowExecutionCreate {
                    status: status.to_string(),
                    input_data: None,
                    output_data: None,
                    error_message: None,
                    tokens_used: Some(100),
                    ai_model_used: Some("GPT-4".to_string()),
                    duration: Some(2.5),
                },
            )
            .await?
            .ok_or_else(|| anyhow::anyhow!("workflow should belong to owner"))?;
    }

    let workflow = storage
        .get_workflow(owner, workflow.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("workflow vanished"))?;
    assert_eq!(workflow.executions, 2);
    assert!(workflow.last_run.is_some());

    let counters = storage.dashboard_counters(owner).await?;
    assert_eq!(counters.total_workflows, 1);
    assert_eq!(counters.total_executions, 2);
    assert_eq!(counters.recorded_executions, 2);
    assert_eq!(counters.successful_executions, 1);
    assert_eq!(counters.ai_tokens_used, 200);

    let executions = storage.list_executions(workflow.id, 0, 10).await?;
    assert_eq!(executions.len(), 2);
    assert_eq!(executions[0].duration, Some(2.5));
    Ok(())
}

/// Closing a ticket stamps resolved_at.
#[tokio::test]
#[ignore]
async fn closing_a_ticket_stamps_resolution() -> anyhow::Result<()> {
    let storage = storage().await?;
    let owner = new_user(&storage).await?;

    let create = SupportTicketCreate {
        subject: "Intégration Slack bloquée".to_string(),
        category: Some("Integration".to_string()),
        description: None,
    };
    let triage = triage_ticket(&create.subject, create.description.as_deref());
    let ticket = storage.create_ticket(owner, &create, &triage).await?;
    assert_eq!(ticket.priority, "high");
    assert!(ticket.resolved_at.is_none());

    let ticket = storage
        .update_ticket(
            owner,
            ticket.id,
            &SupportTicketUpdate {
                status: Some(TicketStatus::Closed),
                ..Default::default()
            },
        )
        .await?
        .ok_or_else(|| anyhow::anyhow!("ticket vanished"))?;
    assert_eq!(ticket.status, "closed");
    assert!(ticket.resolved_at.is_some());
    Ok(())
}
