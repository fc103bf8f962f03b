use chrono::Duration;

use crate::models::slot::slot_start_time;
use crate::models::{Booking, BookingStatus};

/// Renders a single-event iCalendar file for a booking. Returns `None` when the
/// stored slot label no longer maps to a start time.
pub fn generate_ics(booking: &Booking, salon_name: &str) -> Option<String> {
    let start = booking.date.and_time(slot_start_time(&booking.time)?);
    let end = start + Duration::minutes(booking.service.duration_minutes());

    let dtstart = start.format("%Y%m%dT%H%M%S").to_string();
    let dtend = end.format("%Y%m%dT%H%M%S").to_string();
    let dtstamp = booking.created_at.format("%Y%m%dT%H%M%SZ").to_string();
    let uid = format!("{}@salonbook", booking.id);
    let summary = escape_text(&format!("{} at {salon_name}", booking.service.display_name()));
    let description = escape_text(&booking.notes);
    let status = match booking.status {
        BookingStatus::Cancelled => "CANCELLED",
        BookingStatus::Pending => "TENTATIVE",
        BookingStatus::Confirmed | BookingStatus::Completed => "CONFIRMED",
    };

    Some(format!(
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//Salonbook//Bookings//EN\r\n\
         BEGIN:VEVENT\r\n\
         UID:{uid}\r\n\
         DTSTAMP:{dtstamp}\r\n\
         DTSTART:{dtstart}\r\n\
         DTEND:{dtend}\r\n\
         SUMMARY:{summary}\r\n\
         DESCRIPTION:{description}\r\n\
         STATUS:{status}\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR\r\n"
    ))
}

/// TEXT escaping per RFC 5545. Any line break, CRLF or bare CR included,
/// becomes a literal `\n`.
fn escape_text(s: &str) -> String {
    s.replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\n', "\\n")
}
