pub mod email;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::Booking;

/// Everything a confirmation message needs, detached from the stored record.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingConfirmation {
    pub booking_id: String,
    pub recipient: String,
    pub name: String,
    pub service: String,
    pub date: NaiveDate,
    pub time: String,
}

impl BookingConfirmation {
    pub fn for_booking(booking: &Booking) -> Self {
        Self {
            booking_id: booking.id.clone(),
            recipient: booking.email.clone(),
            name: booking.name.clone(),
            service: booking.service.display_name().to_string(),
            date: booking.date,
            time: booking.time.clone(),
        }
    }

    pub fn subject(&self, salon_name: &str) -> String {
        format!("Your {} appointment at {salon_name}", self.service)
    }

    pub fn body(&self, salon_name: &str) -> String {
        format!(
            "Hi {name},\n\n\
             Thanks for booking with {salon_name}! We have received your request for a {service} \
             on {date} at {time}.\n\n\
             Your booking is pending confirmation. You can change the date or time, or cancel, \
             within 24 hours of booking from your dashboard.\n\n\
             Booking reference: {id}\n",
            name = self.name,
            service = self.service,
            date = self.date.format("%A, %B %-d, %Y"),
            time = self.time,
            id = self.booking_id,
        )
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_confirmation(&self, confirmation: &BookingConfirmation) -> anyhow::Result<()>;
}

/// Sends the confirmation in the background. Delivery failures are logged and
/// never reach the request that created the booking.
pub fn spawn_confirmation(notifier: Arc<dyn Notifier>, confirmation: BookingConfirmation) {
    tokio::spawn(async move {
        match notifier.send_confirmation(&confirmation).await {
            Ok(()) => tracing::info!(
                booking_id = %confirmation.booking_id,
                to = %confirmation.recipient,
                "confirmation sent"
            ),
            Err(e) => tracing::error!(
                error = %e,
                booking_id = %confirmation.booking_id,
                "failed to send booking confirmation"
            ),
        }
    });
}

/// Used when no email API is configured.
pub struct LogNotifier {
    pub salon_name: String,
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_confirmation(&self, confirmation: &BookingConfirmation) -> anyhow::Result<()> {
        tracing::info!(
            to = %confirmation.recipient,
            booking_id = %confirmation.booking_id,
            subject = %confirmation.subject(&self.salon_name),
            "email delivery disabled, logging confirmation"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn confirmation() -> BookingConfirmation {
        BookingConfirmation {
            booking_id: "b-42".to_string(),
            recipient: "alice@example.com".to_string(),
            name: "Alice".to_string(),
            service: "Haircut".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            time: "10:00 AM".to_string(),
        }
    }

    #[test]
    fn test_subject() {
        assert_eq!(
            confirmation().subject("Studio Nine"),
            "Your Haircut appointment at Studio Nine"
        );
    }

    #[test]
    fn test_body_mentions_booking_details() {
        let body = confirmation().body("Studio Nine");
        assert!(body.starts_with("Hi Alice,"));
        assert!(body.contains("a Haircut on Saturday, March 1, 2025 at 10:00 AM"));
        assert!(body.contains("Booking reference: b-42"));
    }
}
