use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{json_list, provided, Storage};
use crate::errors::AppError;
use crate::models::{
    ApiKey, ApiKeyUpdate, SecurityLog, Subscription, SubscriptionPlan, User, UserCreate,
    UserUpdate,
};

/// Fields of a security log entry.
#[derive(Debug, Default)]
pub struct NewSecurityLog<'a> {
    pub user_id: Option<i32>,
    pub action: &'a str,
    pub ip_address: Option<&'a str>,
    pub user_agent: Option<&'a str>,
    pub status: &'a str,
    pub details: Option<Value>,
}

impl Storage {
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    /// Inserts a user with the given role.
    pub async fn create_user(
        &self,
        user: &UserCreate,
        hashed_password: &str,
        role: &str,
    ) -> Result<User, AppError> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, company, phone, avatar, hashed_password, role)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.company)
        .bind(&user.phone)
        .bind(&user.avatar)
        .bind(hashed_password)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::DatabaseError)?;

        tracing::info!("Created user {} ({})", created.id, created.email);
        Ok(created)
    }

    /// Applies the provided fields. Absent fields keep their value and
    /// explicit nulls clear nullable columns.
    pub async fn update_user(&self, user_id: i32, update: &UserUpdate) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                company = CASE WHEN 'company' = ANY($7::text[]) THEN NULL ELSE COALESCE($4, company) END,
                phone = CASE WHEN 'phone' = ANY($7::text[]) THEN NULL ELSE COALESCE($5, phone) END,
                avatar = CASE WHEN 'avatar' = ANY($7::text[]) THEN NULL ELSE COALESCE($6, avatar) END,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&update.name)
        .bind(&update.email)
        .bind(provided(&update.company))
        .bind(provided(&update.phone))
        .bind(provided(&update.avatar))
        .bind(update.cleared_fields())
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::DatabaseError)
    }

    pub async fn get_subscription(&self, user_id: i32) -> Result<Option<Subscription>, AppError> {
        sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    /// Creates the user's subscription or switches its plan, reactivating it.
    pub async fn upsert_subscription(
        &self,
        user_id: i32,
        plan: SubscriptionPlan,
        next_billing: DateTime<Utc>,
    ) -> Result<Subscription, AppError> {
        sqlx::query_as::<_, Subscription>(
            r#"
            INSERT INTO subscriptions (user_id, plan, status, next_billing)
            VALUES ($1, $2, 'active', $3)
            ON CONFLICT (user_id) DO UPDATE
            SET plan = EXCLUDED.plan,
                status = 'active',
                next_billing = EXCLUDED.next_billing,
                updated_at = now()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(plan.as_str())
        .bind(next_billing)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::DatabaseError)
    }

    pub async fn create_api_key(
        &self,
        user_id: i32,
        name: &str,
        key: &str,
        permissions: Option<&[String]>,
    ) -> Result<ApiKey, AppError> {
        sqlx::query_as::<_, ApiKey>(
            r#"
            INSERT INTO api_keys (name, user_id, key, permissions)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(user_id)
        .bind(key)
        .bind(permissions.map(json_list))
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::DatabaseError)
    }

    pub async fn list_api_keys(
        &self,
        user_id: i32,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<ApiKey>, AppError> {
        sqlx::query_as::<_, ApiKey>(
            "SELECT * FROM api_keys WHERE user_id = $1 ORDER BY created_at DESC, id DESC OFFSET $2 LIMIT $3",
        )
        .bind(user_id)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::DatabaseError)
    }

    pub async fn update_api_key(
        &self,
        user_id: i32,
        key_id: i32,
        update: &ApiKeyUpdate,
    ) -> Result<Option<ApiKey>, AppError> {
        sqlx::query_as::<_, ApiKey>(
            r#"
            UPDATE api_keys
            SET name = COALESCE($3, name),
                permissions = COALESCE($4, permissions),
                is_active = COALESCE($5, is_active),
                updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(key_id)
        .bind(user_id)
        .bind(&update.name)
        .bind(update.permissions.as_deref().map(json_list))
        .bind(update.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::DatabaseError)
    }

    /// Returns false when no key of this user had that id.
    pub async fn delete_api_key(&self, user_id: i32, key_id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM api_keys WHERE id = $1 AND user_id = $2")
            .bind(key_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn record_security_log(&self, entry: NewSecurityLog<'_>) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO security_logs (user_id, action, ip_address, user_agent, status, details)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.user_id)
        .bind(entry.action)
        .bind(entry.ip_address)
        .bind(entry.user_agent)
        .bind(entry.status)
        .bind(entry.details)
        .execute(&self.pool)
        .await
        .map_err(AppError::DatabaseError)?;
        Ok(())
    }

    pub async fn list_security_logs(
        &self,
        user_id: i32,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<SecurityLog>, AppError> {
        sqlx::query_as::<_, SecurityLog>(
            "SELECT * FROM security_logs WHERE user_id = $1 ORDER BY created_at DESC, id DESC OFFSET $2 LIMIT $3",
        )
        .bind(user_id)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::DatabaseError)
    }
}
