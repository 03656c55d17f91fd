//! Database storage operations.
//!
//! [`Storage`] wraps the pool and exposes one method per query. Every
//! owner-scoped lookup takes the owner id and returns `None` for rows that
//! belong to someone else, so handlers can answer 404 without leaking
//! existence.

use sqlx::PgPool;

use crate::models::Nullable;

mod accounts;
mod catalog;
mod records;
mod workflows;

pub use accounts::NewSecurityLog;

/// Database storage service.
#[derive(Clone)]
pub struct Storage {
    pool: PgPool,
}

impl Storage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// The new value of a nullable update field, if one was given.
fn provided<T>(field: &Nullable<T>) -> Option<&T> {
    field.as_ref().and_then(Option::as_ref)
}

/// Serializes a list of strings for a JSONB column.
fn json_list(items: &[String]) -> serde_json::Value {
    serde_json::Value::from(items.to_vec())
}
