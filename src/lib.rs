//! LeZelote-IA API Library
//!
//! Backend for the LeZelote-IA automation platform: accounts and bearer
//! auth, owner-scoped CRUD over workflows, documents, leads, campaigns and
//! tickets, a read-mostly catalog, and the lead scoring engine.
//!
//! # Modules
//!
//! - `api`: Router and middleware stack.
//! - `auth`: Password hashing, tokens, request extractors.
//! - `automation`: Canned document extraction, chat, workflow and ticket helpers.
//! - `config`: Configuration management.
//! - `db`: Database connection, migrations and health.
//! - `db_storage`: Database storage operations.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `models`: Rows, enums and request/response payloads.
//! - `scoring`: Lead scoring, value estimation and insights.
//! - `utils`: Validation, pagination and file helpers.

pub mod api;
pub mod auth;
pub mod automation;
pub mod config;
pub mod db;
pub mod db_storage;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod scoring;
pub mod utils;
