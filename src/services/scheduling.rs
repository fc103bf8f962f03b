use chrono::NaiveDate;
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::slot::{self, SlotAvailability, SLOT_LABELS};
use crate::models::ServiceKind;

pub fn slot_taken_message(date: NaiveDate, time: &str) -> String {
    format!("Sorry, the {time} slot on {date} is already booked. Please pick a different time.")
}

/// Rejects `(date, time)` when another booking already holds it.
pub fn ensure_slot_free(
    conn: &Connection,
    date: NaiveDate,
    time: &str,
    exclude_id: Option<&str>,
) -> Result<(), AppError> {
    if let Some(existing) = queries::find_booking_at(conn, date, time, exclude_id)? {
        tracing::info!(
            date = %date,
            time,
            holder = %existing.id,
            "slot already taken"
        );
        return Err(AppError::Conflict(slot_taken_message(date, time)));
    }
    Ok(())
}

/// Reports every slot of `date` in day order. Occupancy is salon-wide, so the
/// service only has to be a known one.
pub fn list_available_slots(
    conn: &Connection,
    date: NaiveDate,
    service: &str,
    exclude_id: Option<&str>,
) -> Result<Vec<SlotAvailability>, AppError> {
    if ServiceKind::parse(service).is_none() {
        return Err(AppError::validation("service", format!("unknown service: {service}")));
    }

    let bookings = queries::get_bookings_for_date(conn, date, exclude_id)?;

    Ok(SLOT_LABELS
        .iter()
        .map(|&label| SlotAvailability {
            slot: label,
            available: !bookings.iter().any(|b| b.time == label),
        })
        .collect())
}

/// Canonical slot label for `time`, or a validation error naming the hours.
pub fn parse_slot(time: &str) -> Result<&'static str, AppError> {
    slot::canonical_slot(time).ok_or_else(|| {
        AppError::validation(
            "time",
            format!(
                "{time:?} is not a bookable time. We take bookings {}",
                slot::to_human_readable()
            ),
        )
    })
}
