pub mod admin;
pub mod bookings;
pub mod calendar;
pub mod health;

use std::sync::MutexGuard;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::HeaderMap;
use rusqlite::Connection;

use crate::errors::AppError;
use crate::models::Caller;
use crate::services::identity;
use crate::state::AppState;

pub(crate) fn lock_db(state: &AppState) -> Result<MutexGuard<'_, Connection>, AppError> {
    state
        .db
        .lock()
        .map_err(|_| AppError::Internal(anyhow::anyhow!("database mutex poisoned")))
}

pub(crate) fn authenticate(
    state: &AppState,
    conn: &Connection,
    headers: &HeaderMap,
) -> Result<Caller, AppError> {
    identity::resolve_caller(conn, &state.config.session_secret, headers, chrono::Utc::now())
}

/// Fields accepted by the booking and status request bodies.
const BODY_FIELDS: &[&str] = &[
    "name",
    "email",
    "contact",
    "alternate_phone",
    "service",
    "date",
    "time",
    "notes",
    "status",
];

/// Picks the offending field out of a deserialization error such as
/// "missing field `notes`" or "date: input contains invalid characters".
fn rejected_field(rejection: &JsonRejection) -> &'static str {
    let JsonRejection::JsonDataError(err) = rejection else {
        return "body";
    };
    let text = err.body_text();
    let detail = text
        .split_once("target type: ")
        .map_or(text.as_str(), |(_, detail)| detail);

    const MISSING: &str = "missing field `";
    let named = detail
        .find(MISSING)
        .and_then(|at| detail[at + MISSING.len()..].split_once('`'))
        .or_else(|| detail.split_once(": "))
        .map(|(field, _)| field);

    named
        .and_then(|field| BODY_FIELDS.iter().copied().find(|known| *known == field))
        .unwrap_or("body")
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::validation(rejected_field(&rejection), rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::validation("query", rejection.body_text())
    }
}
