//! Seeds a fresh database with the demo account and the global catalog.
//!
//! Idempotent: exits early when the demo user already exists.

use chrono::{Duration, Utc};
use serde_json::json;

use lezelote_api::auth::hash_password;
use lezelote_api::config::Config;
use lezelote_api::db::Database;
use lezelote_api::db_storage::Storage;
use lezelote_api::models::{
    AiModelCreate, LeadCreate, LeadStatus, LeadUpdate, SubscriptionPlan, UserCreate, UserRole,
};
use lezelote_api::scoring::{self, LeadAttributes, RngJitter};

const DEMO_EMAIL: &str = "jean.dupont@example.com";
const DEMO_PASSWORD: &str = "password";

/// (name, description, icon, category, config)
const INTEGRATIONS: [(&str, &str, &str, &str, &str); 5] = [
    (
        "Gmail",
        "Connectez votre compte Gmail pour l'analyse d'emails",
        "📧",
        "Email",
        r#"{"scopes": ["gmail.readonly"]}"#,
    ),
    (
        "Slack",
        "Intégration avec Slack pour les notifications",
        "💬",
        "Communication",
        r##"{"channel": "#general"}"##,
    ),
    (
        "Salesforce",
        "Synchronisation avec votre CRM Salesforce",
        "⚡",
        "CRM",
        r#"{"sync_interval": "1h"}"#,
    ),
    (
        "DocuSign",
        "Signatures électroniques automatisées",
        "✍️",
        "Document",
        r#"{"sandbox": true}"#,
    ),
    (
        "Stripe",
        "Intégration pour les paiements et factures",
        "💳",
        "Finance",
        r#"{"webhook_endpoint": "/api/webhooks/stripe"}"#,
    ),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seed=info,lezelote_api=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    let db = Database::new(&config.database_url, config.db_max_connections).await?;
    let storage = Storage::new(db.pool.clone());

    if storage.find_user_by_email(DEMO_EMAIL).await?.is_some() {
        tracing::info!("Demo user already present, nothing to seed");
        return Ok(());
    }

    let user = storage
        .create_user(
            &UserCreate {
                name: "Jean Dupont".to_string(),
                email: DEMO_EMAIL.to_string(),
                password: DEMO_PASSWORD.to_string(),
                company: Some("TechCorp SAS".to_string()),
                phone: Some("+33 1 23 45 67 89".to_string()),
                avatar: None,
            },
            &hash_password(DEMO_PASSWORD),
            UserRole::Admin.as_str(),
        )
        .await?;

    storage
        .upsert_subscription(user.id, SubscriptionPlan::Pro, Utc::now() + Duration::days(30))
        .await?;

    seed_ai_models(&storage).await?;
    seed_integrations(&db.pool).await?;
    seed_leads(&storage, user.id).await?;

    tracing::info!("Seeded demo account {} (id {})", DEMO_EMAIL, user.id);
    Ok(())
}

async fn seed_ai_models(storage: &Storage) -> anyhow::Result<()> {
    let models = [
        (
            "GPT-4 Turbo",
            "OpenAI",
            "gpt-4",
            "Modèle de pointe pour la compréhension et génération de texte",
            ["Raisonnement", "Créativité", "Code"],
            0.03,
            128_000,
        ),
        (
            "Claude Sonnet",
            "Anthropic",
            "claude-sonnet",
            "Excellence en analyse et sécurité, parfait pour les données sensibles",
            ["Analyse", "Sécurité", "Éthique"],
            0.025,
            200_000,
        ),
        (
            "Mistral Large",
            "Mistral AI",
            "mistral-large",
            "Modèle français optimisé pour les langues européennes",
            ["Multilingue", "Rapidité", "Coût"],
            0.02,
            32_000,
        ),
    ];

    for (name, provider, model_id, description, strengths, price, max_tokens) in models {
        storage
            .create_ai_model(&AiModelCreate {
                name: name.to_string(),
                provider: provider.to_string(),
                model_id: model_id.to_string(),
                description: Some(description.to_string()),
                strengths: Some(strengths.iter().map(|s| s.to_string()).collect()),
                price_per_token: Some(price),
                max_tokens: Some(max_tokens),
            })
            .await?;
    }

    tracing::info!("Seeded {} AI models", models.len());
    Ok(())
}

async fn seed_integrations(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    for (name, description, icon, category, config) in INTEGRATIONS {
        let config: serde_json::Value = serde_json::from_str(config)?;
        sqlx::query(
            r#"
            INSERT INTO integrations (name, description, icon, category, status, config)
            VALUES ($1, $2, $3, $4, 'available', $5)
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(icon)
        .bind(category)
        .bind(config)
        .execute(pool)
        .await?;
    }

    tracing::info!("Seeded {} integrations", INTEGRATIONS.len());
    Ok(())
}

/// Demo leads go through the real scoring pipeline.
async fn seed_leads(storage: &Storage, owner_id: i32) -> anyhow::Result<()> {
    let now = Utc::now();
    let leads = [
        (
            "Marie Dubois",
            "marie.dubois@innovacorp.fr",
            "InnovaCorp",
            "+33 1 23 45 67 89",
            "Website",
            Duration::hours(2),
            LeadStatus::Hot,
            ["qualified", "enterprise"],
        ),
        (
            "Pierre Martin",
            "p.martin@startup-tech.com",
            "StartupTech",
            "+33 6 78 90 12 34",
            "LinkedIn",
            Duration::hours(8),
            LeadStatus::Warm,
            ["startup", "promising"],
        ),
        (
            "Sophie Laurent",
            "sophie.laurent@sme-solutions.fr",
            "SME Solutions",
            "+33 2 34 56 78 90",
            "Email Campaign",
            Duration::days(2),
            LeadStatus::Cold,
            ["nurturing", "cold"],
        ),
    ];

    let mut jitter = RngJitter::from_entropy();
    for (name, email, company, phone, source, idle, status, tags) in leads {
        let last_activity = now - idle;
        let payload = LeadCreate {
            name: name.to_string(),
            email: email.to_string(),
            company: Some(company.to_string()),
            phone: Some(phone.to_string()),
            source: Some(source.to_string()),
            last_activity: Some(last_activity.to_rfc3339()),
        };

        let scored = scoring::evaluate(&LeadAttributes::from(&payload), now, &mut jitter);
        let lead = storage
            .create_lead(owner_id, &payload, &scored)
            .await?;

        storage
            .update_lead(
                owner_id,
                lead.id,
                &LeadUpdate {
                    status: Some(status),
                    tags: Some(tags.iter().map(|t| t.to_string()).collect()),
                    custom_fields: Some(json!({ "seeded": true })),
                    ..Default::default()
                },
            )
            .await?;

        tracing::info!("Seeded lead {} ({}, score {})", lead.id, name, scored.score);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integration_configs_are_valid_json() {
        for (name, _, _, _, config) in INTEGRATIONS {
            let parsed: serde_json::Value = serde_json::from_str(config).unwrap();
            assert!(parsed.is_object(), "{}", name);
        }
        let slack = INTEGRATIONS.iter().find(|i| i.0 == "Slack").unwrap();
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(slack.4).unwrap()["channel"],
            "#general"
        );
    }
}
