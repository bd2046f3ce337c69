//! Booking confirmation emails over SMTP.
//!
//! The mailer is constructed with an optional [`SmtpConfig`]; without one it
//! runs in mock mode and logs the message instead of sending, so deployments
//! without SMTP credentials still complete the payment flow.

use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use sattva_core::booking::Booking;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Email build error: {0}")]
    Build(String),
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub from_address: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Sends the post-payment confirmation email for a booking.
pub struct Mailer {
    config: Option<SmtpConfig>,
}

impl Mailer {
    /// `None` enables mock mode: confirmations are logged, not sent.
    pub fn new(config: Option<SmtpConfig>) -> Self {
        if config.is_none() {
            tracing::warn!("SMTP not configured; confirmation emails will be mocked");
        }
        Self { config }
    }

    pub fn is_mock(&self) -> bool {
        self.config.is_none()
    }

    /// Send the confirmation for a paid booking to its stored email address.
    pub async fn send_booking_confirmation(&self, booking: &Booking) -> Result<(), MailError> {
        let subject = format!("Sattva booking confirmed — {}", booking.booking_date);
        let body = confirmation_body(booking);

        let Some(config) = &self.config else {
            tracing::info!(
                booking_id = %booking.id,
                to = %booking.email,
                subject = %subject,
                "Mock email (SMTP not configured)"
            );
            return Ok(());
        };

        let email = Message::builder()
            .from(config.from_address.parse()?)
            .to(booking.email.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| MailError::Build(e.to_string()))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port);
        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        builder.build().send(email).await?;
        tracing::info!(booking_id = %booking.id, to = %booking.email, "Confirmation email sent");
        Ok(())
    }
}

/// Plain-text confirmation listing every booking field.
fn confirmation_body(booking: &Booking) -> String {
    format!(
        "Namaste {},\n\n\
         Your payment has been received and your session is confirmed.\n\n\
         Session:     {} ({})\n\
         Date:        {}\n\
         Time slot:   {}\n\
         Duration:    {} minutes\n\
         Instructor:  {}\n\
         Payment:     {} ({})\n\
         Amount:      {:.2}\n\
         Contact:     {} / {}\n\
         Special request: {}\n\n\
         We look forward to seeing you.\n",
        booking.full_name,
        booking.session_type.as_str(),
        booking.session_mode.as_str(),
        booking.booking_date,
        booking.time_slot,
        booking.duration_minutes,
        booking.instructor,
        booking.payment_method.as_str(),
        booking.payment_status.as_str(),
        booking.amount,
        booking.email,
        booking.phone,
        booking.special_request.as_deref().unwrap_or("none"),
    )
}
