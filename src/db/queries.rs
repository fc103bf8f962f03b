use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{Booking, BookingStatus, Role, ServiceKind, User};

const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FMT: &str = "%Y-%m-%d";

const BOOKING_COLUMNS: &str = "id, owner_id, name, email, contact, alternate_phone, service, date, time, notes, status, created_at, updated_at";

/// Outcome of a write that touches the `(date, time)` unique index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotWrite {
    Written,
    SlotTaken,
}

/// Only UNIQUE index failures mean the slot is held. Primary key and NOT NULL
/// violations stay errors.
fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

// ── Bookings ──

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<SlotWrite> {
    let result = conn.execute(
        &format!(
            "INSERT INTO bookings ({BOOKING_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
        ),
        params![
            booking.id,
            booking.owner_id,
            booking.name,
            booking.email,
            booking.contact,
            booking.alternate_phone,
            booking.service.as_str(),
            booking.date.format(DATE_FMT).to_string(),
            booking.time,
            booking.notes,
            booking.status.as_str(),
            booking.created_at.format(DATETIME_FMT).to_string(),
            booking.updated_at.format(DATETIME_FMT).to_string(),
        ],
    );

    match result {
        Ok(_) => Ok(SlotWrite::Written),
        Err(e) if is_unique_violation(&e) => Ok(SlotWrite::SlotTaken),
        Err(e) => Err(e).context("failed to insert booking"),
    }
}

/// Rewrites every mutable column of an existing booking. `id`, `owner_id`
/// and `created_at` are never touched.
pub fn update_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<SlotWrite> {
    let result = conn.execute(
        "UPDATE bookings SET
           name = ?1, email = ?2, contact = ?3, alternate_phone = ?4, service = ?5,
           date = ?6, time = ?7, notes = ?8, status = ?9, updated_at = ?10
         WHERE id = ?11",
        params![
            booking.name,
            booking.email,
            booking.contact,
            booking.alternate_phone,
            booking.service.as_str(),
            booking.date.format(DATE_FMT).to_string(),
            booking.time,
            booking.notes,
            booking.status.as_str(),
            booking.updated_at.format(DATETIME_FMT).to_string(),
            booking.id,
        ],
    );

    match result {
        Ok(_) => Ok(SlotWrite::Written),
        Err(e) if is_unique_violation(&e) => Ok(SlotWrite::SlotTaken),
        Err(e) => Err(e).context("failed to update booking"),
    }
}

pub fn delete_booking(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM bookings WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    status: BookingStatus,
    now: NaiveDateTime,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), now.format(DATETIME_FMT).to_string(), id],
    )?;
    Ok(count > 0)
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// The booking holding `(date, time)`, ignoring `exclude_id` when given.
pub fn find_booking_at(
    conn: &Connection,
    date: NaiveDate,
    time: &str,
    exclude_id: Option<&str>,
) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings
             WHERE date = ?1 AND time = ?2 AND (?3 IS NULL OR id != ?3)"
        ),
        params![date.format(DATE_FMT).to_string(), time, exclude_id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_bookings_for_date(
    conn: &Connection,
    date: NaiveDate,
    exclude_id: Option<&str>,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE date = ?1 AND (?2 IS NULL OR id != ?2)"
    ))?;

    let rows = stmt.query_map(
        params![date.format(DATE_FMT).to_string(), exclude_id],
        |row| Ok(parse_booking_row(row)),
    )?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn get_bookings_for_owner(conn: &Connection, owner_id: &str) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE owner_id = ?1 ORDER BY date ASC, created_at ASC"
    ))?;

    let rows = stmt.query_map(params![owner_id], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn get_all_bookings(
    conn: &Connection,
    status_filter: Option<BookingStatus>,
    date_filter: Option<NaiveDate>,
    limit: i64,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE (?1 IS NULL OR status = ?1) AND (?2 IS NULL OR date = ?2)
         ORDER BY date DESC, created_at DESC LIMIT ?3"
    ))?;

    let rows = stmt.query_map(
        params![
            status_filter.map(|s| s.as_str()),
            date_filter.map(|d| d.format(DATE_FMT).to_string()),
            limit,
        ],
        |row| Ok(parse_booking_row(row)),
    )?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let id: String = row.get(0)?;
    let service_str: String = row.get(6)?;
    let date_str: String = row.get(7)?;
    let status_str: String = row.get(10)?;
    let created_at_str: String = row.get(11)?;
    let updated_at_str: String = row.get(12)?;

    let service = ServiceKind::parse(&service_str)
        .with_context(|| format!("booking {id} has unknown service {service_str:?}"))?;
    let status = BookingStatus::parse(&status_str)
        .with_context(|| format!("booking {id} has unknown status {status_str:?}"))?;
    let date = NaiveDate::parse_from_str(&date_str, DATE_FMT)
        .with_context(|| format!("booking {id} has malformed date {date_str:?}"))?;
    let created_at = NaiveDateTime::parse_from_str(&created_at_str, DATETIME_FMT)
        .with_context(|| format!("booking {id} has malformed created_at"))?;
    let updated_at = NaiveDateTime::parse_from_str(&updated_at_str, DATETIME_FMT)
        .unwrap_or(created_at);

    Ok(Booking {
        id,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        contact: row.get(4)?,
        alternate_phone: row.get(5)?,
        service,
        date,
        time: row.get(8)?,
        notes: row.get(9)?,
        status,
        created_at,
        updated_at,
    })
}

// ── Users ──

pub fn get_user(conn: &Connection, id: &str) -> anyhow::Result<Option<User>> {
    let user = conn
        .query_row(
            "SELECT id, name, email, phone, role FROM users WHERE id = ?1",
            params![id],
            |row| {
                let role: String = row.get(4)?;
                Ok(User {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    email: row.get(2)?,
                    phone: row.get(3)?,
                    role: Role::parse(&role),
                })
            },
        )
        .optional()?;
    Ok(user)
}

pub fn save_user(conn: &Connection, user: &User) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO users (id, name, email, phone, role)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(id) DO UPDATE SET
           name = excluded.name,
           email = excluded.email,
           phone = excluded.phone,
           role = excluded.role",
        params![user.id, user.name, user.email, user.phone, user.role.as_str()],
    )?;
    Ok(())
}
