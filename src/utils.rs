//! Small helpers shared by the handlers: input validation, pagination,
//! upload file naming, key generation.

use rand::{distributions::Alphanumeric, Rng};
use regex::Regex;
use std::sync::OnceLock;

use crate::models::Pagination;

pub const DEFAULT_PAGE_SIZE: i64 = 100;
pub const MAX_PAGE_SIZE: i64 = 1000;

/// Prefix of every issued API key.
pub const API_KEY_PREFIX: &str = "lz_";
const API_KEY_LENGTH: usize = 32;

fn email_regex() -> &'static Regex {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    // local@domain.tld, no whitespace
    EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid")
    })
}

/// Validate email address
///
/// Requires a non-empty local part, an `@`, and a dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    if !email_regex().is_match(email) {
        tracing::warn!("Invalid email format: {}", email);
        return false;
    }
    true
}

/// Clamps `skip`/`limit` into an `(offset, limit)` pair for SQL.
pub fn page_bounds(page: &Pagination) -> (i64, i64) {
    let offset = page.skip.unwrap_or(0).max(0);
    let limit = page
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    (offset, limit)
}

/// Percentage of `part` in `whole`, 0 when `whole` is 0.
pub fn calculate_percentage(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    (part / whole) * 100.0
}

/// Replaces characters that are unsafe in file names.
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Lowercased extension, or an empty string.
pub fn file_extension(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_lowercase(),
        _ => String::new(),
    }
}

/// `lz_` followed by 32 random alphanumeric characters.
pub fn generate_api_key() -> String {
    let body: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(API_KEY_LENGTH)
        .map(char::from)
        .collect();
    format!("{}{}", API_KEY_PREFIX, body)
}
