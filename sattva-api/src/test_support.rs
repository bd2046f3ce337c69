//! Shared fixtures for handler and router tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use sattva_booking::{BookingService, InstructorRoster};
use sattva_core::booking::{Booking, BookingStatus, PaymentStatus};
use sattva_core::repository::{BookingFilter, BookingRepository};
use sattva_notify::Mailer;
use sattva_payment::{
    FormField, GatewayError, PaymentGateway, PaymentInitiation, Verification,
};

use crate::state::{AppState, AuthConfig};

pub const TEST_JWT_SECRET: &str = "test-secret";

pub struct InMemoryRepo {
    bookings: Mutex<HashMap<Uuid, Booking>>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self {
            bookings: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl BookingRepository for InMemoryRepo {
    async fn insert(
        &self,
        booking: &Booking,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.bookings
            .lock()
            .unwrap()
            .insert(booking.id, booking.clone());
        Ok(())
    }

    async fn get(
        &self,
        id: Uuid,
    ) -> Result<Option<Booking>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.bookings.lock().unwrap().get(&id).cloned())
    }

    async fn list_by_owner(
        &self,
        user_id: &str,
        filter: &BookingFilter,
    ) -> Result<Vec<Booking>, Box<dyn std::error::Error + Send + Sync>> {
        let mut found: Vec<Booking> = self
            .bookings
            .lock()
            .unwrap()
            .values()
            .filter(|b| b.user_id == user_id)
            .filter(|b| filter.status.map_or(true, |s| b.status == s))
            .filter(|b| filter.start_date.map_or(true, |d| b.booking_date >= d))
            .filter(|b| filter.end_date.map_or(true, |d| b.booking_date <= d))
            .cloned()
            .collect();
        found.sort_by_key(|b| b.booking_date);
        Ok(found)
    }

    async fn count_upcoming(
        &self,
        user_id: &str,
    ) -> Result<i64, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self
            .bookings
            .lock()
            .unwrap()
            .values()
            .filter(|b| b.user_id == user_id && b.status == BookingStatus::Upcoming)
            .count() as i64)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: BookingStatus,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Some(b) = self.bookings.lock().unwrap().get_mut(&id) {
            b.status = status;
            b.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn set_transaction_uuid(
        &self,
        id: Uuid,
        transaction_uuid: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Some(b) = self.bookings.lock().unwrap().get_mut(&id) {
            b.transaction_uuid = Some(transaction_uuid.to_string());
        }
        Ok(())
    }

    async fn mark_paid_if_pending(
        &self,
        transaction_uuid: &str,
    ) -> Result<Option<Booking>, Box<dyn std::error::Error + Send + Sync>> {
        let mut bookings = self.bookings.lock().unwrap();
        let hit = bookings.values_mut().find(|b| {
            b.transaction_uuid.as_deref() == Some(transaction_uuid)
                && b.payment_status == PaymentStatus::Pending
        });
        if let Some(b) = hit {
            b.payment_status = PaymentStatus::Paid;
            b.updated_at = Utc::now();
            return Ok(Some(b.clone()));
        }
        Ok(None)
    }

    async fn get_by_transaction_uuid(
        &self,
        transaction_uuid: &str,
    ) -> Result<Option<Booking>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self
            .bookings
            .lock()
            .unwrap()
            .values()
            .find(|b| b.transaction_uuid.as_deref() == Some(transaction_uuid))
            .cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.bookings.lock().unwrap().remove(&id).is_some())
    }
}

/// Gateway double: echoes the callback's `txn` parameter back as the
/// transaction uuid and reports the configured verification outcome.
pub struct StubGateway {
    pub verified: bool,
}

#[async_trait]
impl PaymentGateway for StubGateway {
    fn initiate(&self, amount: f64, transaction_uuid: &str) -> PaymentInitiation {
        PaymentInitiation {
            gateway_url: "https://gateway.test/form".to_string(),
            form_data: vec![
                FormField::new("pid", transaction_uuid),
                FormField::new("amt", format!("{}", amount)),
            ],
        }
    }

    async fn verify(
        &self,
        params: &HashMap<String, String>,
    ) -> Result<Verification, GatewayError> {
        let transaction_uuid = params
            .get("txn")
            .cloned()
            .ok_or_else(|| GatewayError::MalformedCallback("Missing txn parameter".to_string()))?;
        Ok(Verification {
            verified: self.verified,
            transaction_uuid,
        })
    }
}

pub fn state_with(gateway: Arc<dyn PaymentGateway>, mailer: Mailer) -> AppState {
    AppState {
        bookings: Arc::new(BookingService::new(
            Arc::new(InMemoryRepo::new()),
            InstructorRoster::default(),
        )),
        gateway,
        mailer: Arc::new(mailer),
        auth: AuthConfig {
            secret: TEST_JWT_SECRET.to_string(),
            expiration: 3600,
        },
    }
}
