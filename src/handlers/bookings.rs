use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::errors::AppError;
use crate::models::{Booking, BookingPatch, NewBooking, SlotAvailability};
use crate::services::notify::{spawn_confirmation, BookingConfirmation};
use crate::services::{booking, scheduling};
use crate::state::AppState;

use super::{authenticate, lock_db};

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<NewBooking>, JsonRejection>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let created = {
        let db = lock_db(&state)?;
        let caller = authenticate(&state, &db, &headers)?;
        let Json(input) = payload?;
        booking::create_booking(&db, &caller, input, Utc::now().naive_utc())?
    };

    spawn_confirmation(
        Arc::clone(&state.notifier),
        BookingConfirmation::for_booking(&created),
    );

    Ok((StatusCode::CREATED, Json(created)))
}

// GET /api/bookings
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Booking>>, AppError> {
    let db = lock_db(&state)?;
    let caller = authenticate(&state, &db, &headers)?;
    Ok(Json(booking::list_own_bookings(&db, &caller)?))
}

// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    let db = lock_db(&state)?;
    let caller = authenticate(&state, &db, &headers)?;
    Ok(Json(booking::get_booking(&db, &id, &caller)?))
}

// PATCH /api/bookings/:id
pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    payload: Result<Json<BookingPatch>, JsonRejection>,
) -> Result<Json<Booking>, AppError> {
    let db = lock_db(&state)?;
    let caller = authenticate(&state, &db, &headers)?;
    let Json(patch) = payload?;
    let updated = booking::update_booking(&db, &id, &caller, patch, Utc::now().naive_utc())?;
    Ok(Json(updated))
}

// DELETE /api/bookings/:id
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let db = lock_db(&state)?;
    let caller = authenticate(&state, &db, &headers)?;
    booking::cancel_booking(&db, &id, &caller, Utc::now().naive_utc())?;
    Ok(Json(json!({ "deleted": true, "id": id })))
}

// GET /api/slots
#[derive(Deserialize)]
pub struct SlotsQuery {
    pub date: NaiveDate,
    pub service: String,
    pub exclude: Option<String>,
}

#[derive(Serialize)]
pub struct SlotsResponse {
    date: NaiveDate,
    service: String,
    slots: Vec<SlotAvailability>,
}

pub async fn available_slots(
    State(state): State<Arc<AppState>>,
    query: Result<Query<SlotsQuery>, QueryRejection>,
) -> Result<Json<SlotsResponse>, AppError> {
    let Query(query) = query?;
    let slots = {
        let db = lock_db(&state)?;
        scheduling::list_available_slots(&db, query.date, &query.service, query.exclude.as_deref())?
    };

    Ok(Json(SlotsResponse {
        date: query.date,
        service: query.service.trim().to_lowercase(),
        slots,
    }))
}
