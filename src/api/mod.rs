//! HTTP routing and middleware.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::handlers::{self, account, auth, catalog, documents, engagement, leads, workflows};
use crate::handlers::AppState;

/// Largest accepted request body (document uploads included).
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Builds the application router.
///
/// Everything under `/api` is rate limited per client IP except the root
/// and health endpoints.
pub fn router(state: Arc<AppState>) -> anyhow::Result<Router> {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(state.config.rate_limit_per_second)
            .burst_size(state.config.rate_limit_burst)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limit configuration"))?,
    );

    let protected_routes = Router::new()
        // Auth
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me).put(auth::update_me))
        // Dashboard
        .route("/api/dashboard", get(handlers::dashboard))
        // Workflows
        .route(
            "/api/workflows",
            get(workflows::list_workflows).post(workflows::create_workflow),
        )
        .route(
            "/api/workflows/:id",
            get(workflows::get_workflow)
                .put(workflows::update_workflow)
                .delete(workflows::delete_workflow),
        )
        .route(
            "/api/workflows/:id/executions",
            get(workflows::list_executions).post(workflows::record_execution),
        )
        // Documents
        .route("/api/documents/upload", post(documents::upload_document))
        .route("/api/documents", get(documents::list_documents))
        .route("/api/documents/:id", get(documents::get_document))
        .route("/api/documents/:id/process", post(documents::process_document))
        // Leads
        .route("/api/leads", get(leads::list_leads).post(leads::create_lead))
        .route(
            "/api/leads/:id",
            get(leads::get_lead)
                .put(leads::update_lead)
                .delete(leads::delete_lead),
        )
        .route("/api/leads/:id/rescore", post(leads::rescore_lead))
        // Chat & analytics
        .route("/api/chat", post(engagement::chat))
        .route(
            "/api/analytics",
            get(engagement::get_analytics).post(engagement::create_analytics_event),
        )
        // Email campaigns
        .route(
            "/api/email-campaigns",
            get(engagement::list_campaigns).post(engagement::create_campaign),
        )
        .route(
            "/api/email-campaigns/:id",
            get(engagement::get_campaign).put(engagement::update_campaign),
        )
        // Support tickets
        .route(
            "/api/tickets",
            get(engagement::list_tickets).post(engagement::create_ticket),
        )
        .route(
            "/api/tickets/:id",
            get(engagement::get_ticket).put(engagement::update_ticket),
        )
        // Account
        .route(
            "/api/api-keys",
            get(account::list_api_keys).post(account::create_api_key),
        )
        .route(
            "/api/api-keys/:id",
            put(account::update_api_key).delete(account::delete_api_key),
        )
        .route(
            "/api/subscription",
            get(account::get_subscription).put(account::update_subscription),
        )
        .route("/api/security-logs", get(account::list_security_logs))
        // Catalog
        .route("/api/integrations", get(catalog::list_integrations))
        .route("/api/integrations/:id", put(catalog::update_integration))
        .route(
            "/api/ai-models",
            get(catalog::list_ai_models).post(catalog::create_ai_model),
        )
        .layer(
            ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
                // 429 once a client IP exceeds its quota
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    let app = Router::new()
        .route("/api/", get(handlers::root))
        .route("/api/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    Ok(app)
}
