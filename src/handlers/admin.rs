use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{Booking, BookingStatus};
use crate::services::booking;
use crate::state::AppState;

use super::{authenticate, lock_db};

fn parse_status(s: &str) -> Result<BookingStatus, AppError> {
    BookingStatus::parse(s).ok_or_else(|| {
        AppError::validation(
            "status",
            format!("unknown status {s:?}; expected pending, confirmed, completed or cancelled"),
        )
    })
}

// GET /api/admin/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub status: Option<String>,
    pub date: Option<NaiveDate>,
    pub limit: Option<i64>,
}

pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    query: Result<Query<BookingsQuery>, QueryRejection>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let db = lock_db(&state)?;
    let caller = authenticate(&state, &db, &headers)?;
    let Query(query) = query?;

    let status = query.status.as_deref().map(parse_status).transpose()?;
    let bookings = booking::list_all_bookings(&db, &caller, status, query.date, query.limit)?;
    Ok(Json(bookings))
}

// PUT /api/admin/bookings/:id/status
#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    payload: Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Json<Booking>, AppError> {
    let db = lock_db(&state)?;
    let caller = authenticate(&state, &db, &headers)?;
    let Json(body) = payload?;

    let next = parse_status(&body.status)?;
    let updated = booking::set_status(&db, &id, &caller, next, Utc::now().naive_utc())?;
    Ok(Json(updated))
}
