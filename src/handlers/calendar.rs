use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};

use crate::errors::AppError;
use crate::services::booking;
use crate::services::calendar::generate_ics;
use crate::state::AppState;

use super::{authenticate, lock_db};

// GET /calendar/:booking_id
pub async fn download_ics(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
) -> Result<Response, AppError> {
    let booking_id = raw_id.strip_suffix(".ics").unwrap_or(&raw_id);

    let booking = {
        let db = lock_db(&state)?;
        let caller = authenticate(&state, &db, &headers)?;
        booking::get_booking(&db, booking_id, &caller)?
    };

    let ics = generate_ics(&booking, &state.config.salon_name).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!(
            "booking {} has unknown slot {:?}",
            booking.id,
            booking.time
        ))
    })?;
    let disposition = format!("attachment; filename=\"booking-{booking_id}.ics\"");

    Ok((
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        ics,
    )
        .into_response())
}
