use axum::{extract::State, http::HeaderMap, Json};
use serde_json::json;
use std::sync::Arc;

use super::AppState;
use crate::auth::{create_access_token, hash_password, verify_password, AuthUser};
use crate::db_storage::NewSecurityLog;
use crate::errors::AppError;
use crate::models::{Token, User, UserCreate, UserLogin, UserRole, UserUpdate};
use crate::utils::is_valid_email;

const MIN_PASSWORD_LEN: usize = 6;
const LOGIN_FAILED: &str = "Incorrect email or password";

/// First address in `x-forwarded-for`, if any.
pub fn client_ip(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("x-forwarded-for")?
        .to_str()
        .ok()?
        .split(',')
        .map(str::trim)
        .find(|ip| !ip.is_empty())
}

fn user_agent(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UserCreate>,
) -> Result<Json<User>, AppError> {
    if !is_valid_email(&payload.email) {
        return Err(AppError::BadRequest("Invalid email format".to_string()));
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let storage = state.storage();
    if storage.find_user_by_email(&payload.email).await?.is_some() {
        return Err(AppError::BadRequest("Email already registered".to_string()));
    }

    let user = storage
        .create_user(
            &payload,
            &hash_password(&payload.password),
            UserRole::User.as_str(),
        )
        .await?;

    state
        .record_event(user.id, "user_registered", json!({ "user_id": user.id }))
        .await;

    Ok(Json(user))
}

/// POST /api/auth/login
///
/// Every attempt is written to the security log, successful or not.
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(credentials): Json<UserLogin>,
) -> Result<Json<Token>, AppError> {
    let storage = state.storage();
    let ip = client_ip(&headers);
    let agent = user_agent(&headers);

    let user = storage
        .find_user_by_email(&credentials.email)
        .await?
        .filter(|user| verify_password(&credentials.password, &user.hashed_password));

    let Some(user) = user else {
        tracing::warn!("Failed login attempt for {}", credentials.email);
        if let Err(e) = storage
            .record_security_log(NewSecurityLog {
                user_id: None,
                action: "login",
                ip_address: ip,
                user_agent: agent,
                status: "failed",
                details: Some(json!({ "email": credentials.email })),
            })
            .await
        {
            tracing::warn!("Failed to write security log: {}", e);
        }
        return Err(AppError::Unauthorized(LOGIN_FAILED.to_string()));
    };

    let access_token = create_access_token(
        &user.email,
        &state.config.jwt_secret,
        state.config.access_token_ttl_minutes,
    )?;

    if let Err(e) = storage
        .record_security_log(NewSecurityLog {
            user_id: Some(user.id),
            action: "login",
            ip_address: ip,
            user_agent: agent,
            status: "success",
            details: None,
        })
        .await
    {
        tracing::warn!("Failed to write security log: {}", e);
    }
    state
        .record_event(user.id, "login", json!({ "ip": ip }))
        .await;

    tracing::info!("User {} logged in", user.id);

    Ok(Json(Token {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

/// GET /api/auth/me
pub async fn me(AuthUser(user): AuthUser) -> Json<User> {
    Json(user)
}

/// PUT /api/auth/me
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(update): Json<UserUpdate>,
) -> Result<Json<User>, AppError> {
    let storage = state.storage();

    if let Some(email) = update.email.as_deref().filter(|e| *e != user.email) {
        if !is_valid_email(email) {
            return Err(AppError::BadRequest("Invalid email format".to_string()));
        }
        if storage.find_user_by_email(email).await?.is_some() {
            return Err(AppError::BadRequest("Email already registered".to_string()));
        }
    }

    let updated = storage.update_user(user.id, &update).await?;
    tracing::info!("User {} updated their profile", user.id);
    state
        .record_event(user.id, "user_updated", json!({ "user_id": user.id }))
        .await;

    Ok(Json(updated))
}
