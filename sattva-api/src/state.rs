use std::sync::Arc;

use sattva_booking::BookingService;
use sattva_notify::Mailer;
use sattva_payment::PaymentGateway;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub bookings: Arc<BookingService>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub mailer: Arc<Mailer>,
    pub auth: AuthConfig,
}
