//! Booking lifecycle: create, read, partial update, cancel and admin status
//! transitions.
//!
//! Every operation is a single read-check-write against one connection. The
//! caller holds the connection lock for the whole call, and the unique
//! `(date, time)` index backs up the slot check when several processes share
//! the database file.

use chrono::{NaiveDate, NaiveDateTime, SubsecRound};
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::queries::{self, SlotWrite};
use crate::errors::AppError;
use crate::models::booking::{NOTES_MAX_CHARS, NOTES_MIN_CHARS};
use crate::models::{Booking, BookingPatch, BookingStatus, Caller, NewBooking, ServiceKind};
use crate::services::scheduling::{self, ensure_slot_free, parse_slot};

pub const DEFAULT_LIST_LIMIT: i64 = 100;

pub fn create_booking(
    conn: &Connection,
    caller: &Caller,
    input: NewBooking,
    now: NaiveDateTime,
) -> Result<Booking, AppError> {
    let now = stored_precision(now);
    let profile = &caller.user;

    let name = validate_name(non_empty(input.name).unwrap_or_else(|| profile.name.clone()))?;
    let email = validate_email(non_empty(input.email).unwrap_or_else(|| profile.email.clone()))?;
    let contact = validate_phone(
        "contact",
        non_empty(input.contact).unwrap_or_else(|| profile.phone.clone()),
    )?;
    let alternate_phone = non_empty(input.alternate_phone)
        .map(|p| validate_phone("alternate_phone", p))
        .transpose()?;
    let service = parse_service(&input.service)?;
    let time = parse_slot(&input.time)?;
    let notes = validate_notes(&input.notes)?;

    ensure_slot_free(conn, input.date, time, None)?;

    let booking = Booking {
        id: Uuid::new_v4().to_string(),
        owner_id: caller.id().to_string(),
        name,
        email,
        contact,
        alternate_phone,
        service,
        date: input.date,
        time: time.to_string(),
        notes,
        status: BookingStatus::Pending,
        created_at: now,
        updated_at: now,
    };

    if queries::create_booking(conn, &booking)? == SlotWrite::SlotTaken {
        return Err(slot_taken(booking.date, &booking.time));
    }

    tracing::info!(
        booking_id = %booking.id,
        owner_id = %booking.owner_id,
        date = %booking.date,
        time = %booking.time,
        service = booking.service.as_str(),
        "booking created"
    );

    Ok(booking)
}

pub fn get_booking(conn: &Connection, id: &str, caller: &Caller) -> Result<Booking, AppError> {
    let booking = load(conn, id)?;
    if booking.owner_id != caller.id() && !caller.is_admin() {
        return Err(AppError::Forbidden);
    }
    Ok(booking)
}

pub fn update_booking(
    conn: &Connection,
    id: &str,
    caller: &Caller,
    patch: BookingPatch,
    now: NaiveDateTime,
) -> Result<Booking, AppError> {
    let now = stored_precision(now);
    let current = load(conn, id)?;
    ensure_owner(&current, caller)?;

    if current.status.is_terminal() {
        tracing::info!(booking_id = %id, status = current.status.as_str(), "update of finalized booking rejected");
        return Err(AppError::Finalized);
    }

    let mut updated = current.clone();

    if let Some(name) = patch.name {
        updated.name = validate_name(name)?;
    }
    if let Some(email) = patch.email {
        updated.email = validate_email(email)?;
    }
    if let Some(contact) = patch.contact {
        updated.contact = validate_phone("contact", contact)?;
    }
    if let Some(alternate) = patch.alternate_phone {
        // an empty string clears the alternate number
        updated.alternate_phone = non_empty(Some(alternate))
            .map(|p| validate_phone("alternate_phone", p))
            .transpose()?;
    }
    if let Some(service) = patch.service {
        updated.service = parse_service(&service)?;
    }
    if let Some(notes) = patch.notes {
        updated.notes = validate_notes(&notes)?;
    }
    if let Some(date) = patch.date {
        updated.date = date;
    }
    if let Some(time) = patch.time {
        updated.time = parse_slot(&time)?.to_string();
    }

    let reschedules = updated.date != current.date || updated.time != current.time;
    if reschedules {
        if !current.within_edit_window(now) {
            tracing::info!(booking_id = %id, created_at = %current.created_at, "reschedule outside edit window");
            return Err(AppError::EditWindowExpired);
        }
        ensure_slot_free(conn, updated.date, &updated.time, Some(id))?;
    }

    updated.updated_at = now;

    if queries::update_booking(conn, &updated)? == SlotWrite::SlotTaken {
        return Err(slot_taken(updated.date, &updated.time));
    }

    if reschedules {
        tracing::info!(
            booking_id = %id,
            from = %format!("{} {}", current.date, current.time),
            to = %format!("{} {}", updated.date, updated.time),
            "booking rescheduled"
        );
    } else {
        tracing::info!(booking_id = %id, "booking updated");
    }

    Ok(updated)
}

/// Deletes the booking outright so its slot can be taken again immediately.
pub fn cancel_booking(
    conn: &Connection,
    id: &str,
    caller: &Caller,
    now: NaiveDateTime,
) -> Result<(), AppError> {
    let now = stored_precision(now);
    let booking = load(conn, id)?;
    ensure_owner(&booking, caller)?;

    if booking.status.is_terminal() {
        return Err(AppError::AlreadyFinalized);
    }
    if !booking.within_edit_window(now) {
        tracing::info!(booking_id = %id, created_at = %booking.created_at, "cancel outside window");
        return Err(AppError::CancelWindowExpired);
    }

    if !queries::delete_booking(conn, id)? {
        return Err(not_found(id));
    }

    tracing::info!(booking_id = %id, date = %booking.date, time = %booking.time, "booking cancelled");
    Ok(())
}

/// Admin-only status change, checked against
/// [`BookingStatus::can_transition_to`]. Terminal states cannot be left.
pub fn set_status(
    conn: &Connection,
    id: &str,
    caller: &Caller,
    next: BookingStatus,
    now: NaiveDateTime,
) -> Result<Booking, AppError> {
    if !caller.is_admin() {
        return Err(AppError::Forbidden);
    }
    let now = stored_precision(now);

    let mut booking = load(conn, id)?;
    if booking.status == next {
        return Ok(booking);
    }
    if !booking.status.can_transition_to(next) {
        tracing::warn!(
            booking_id = %id,
            from = booking.status.as_str(),
            to = next.as_str(),
            "status transition rejected"
        );
        return Err(AppError::invalid_transition(booking.status, next));
    }

    if !queries::update_booking_status(conn, id, next, now)? {
        return Err(not_found(id));
    }

    tracing::info!(
        booking_id = %id,
        from = booking.status.as_str(),
        to = next.as_str(),
        admin_id = %caller.id(),
        "booking status changed"
    );

    booking.status = next;
    booking.updated_at = now;
    Ok(booking)
}

pub fn list_own_bookings(conn: &Connection, caller: &Caller) -> Result<Vec<Booking>, AppError> {
    let mut bookings = queries::get_bookings_for_owner(conn, caller.id())?;
    bookings.sort_by_key(|b| (b.date, slot_order(&b.time)));
    Ok(bookings)
}

pub fn list_all_bookings(
    conn: &Connection,
    caller: &Caller,
    status: Option<BookingStatus>,
    date: Option<NaiveDate>,
    limit: Option<i64>,
) -> Result<Vec<Booking>, AppError> {
    if !caller.is_admin() {
        return Err(AppError::Forbidden);
    }
    let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, 1000);
    Ok(queries::get_all_bookings(conn, status, date, limit)?)
}

/// Timestamps are persisted at whole-second precision; returned records and
/// window checks use the same value.
fn stored_precision(now: NaiveDateTime) -> NaiveDateTime {
    now.trunc_subsecs(0)
}

fn load(conn: &Connection, id: &str) -> Result<Booking, AppError> {
    queries::get_booking_by_id(conn, id)?.ok_or_else(|| not_found(id))
}

fn ensure_owner(booking: &Booking, caller: &Caller) -> Result<(), AppError> {
    if booking.owner_id != caller.id() {
        tracing::warn!(booking_id = %booking.id, caller_id = %caller.id(), "non-owner mutation rejected");
        return Err(AppError::Forbidden);
    }
    Ok(())
}

fn not_found(id: &str) -> AppError {
    AppError::NotFound(format!("booking {id}"))
}

fn slot_taken(date: NaiveDate, time: &str) -> AppError {
    AppError::Conflict(scheduling::slot_taken_message(date, time))
}

fn slot_order(time: &str) -> usize {
    crate::models::SLOT_LABELS
        .iter()
        .position(|label| *label == time)
        .unwrap_or(usize::MAX)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_service(s: &str) -> Result<ServiceKind, AppError> {
    ServiceKind::parse(s)
        .ok_or_else(|| AppError::validation("service", format!("unknown service: {s}")))
}

fn validate_name(name: String) -> Result<String, AppError> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::validation("name", "name is required"));
    }
    if name.chars().count() > 100 {
        return Err(AppError::validation("name", "name must be at most 100 characters"));
    }
    Ok(name)
}

fn validate_email(email: String) -> Result<String, AppError> {
    let email = email.trim().to_string();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    };
    if !valid {
        return Err(AppError::validation("email", "please enter a valid email address"));
    }
    Ok(email)
}

fn validate_phone(field: &'static str, phone: String) -> Result<String, AppError> {
    let phone = phone.trim().to_string();
    if phone.len() != 10 || !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::validation(field, "phone number must be exactly 10 digits"));
    }
    Ok(phone)
}

fn validate_notes(notes: &str) -> Result<String, AppError> {
    let notes = notes.trim();
    let len = notes.chars().count();
    if !(NOTES_MIN_CHARS..=NOTES_MAX_CHARS).contains(&len) {
        return Err(AppError::validation(
            "notes",
            format!("notes must be between {NOTES_MIN_CHARS} and {NOTES_MAX_CHARS} characters"),
        ));
    }
    Ok(notes.to_string())
}
