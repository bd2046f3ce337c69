use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::booking::{Booking, BookingStatus};

/// Optional filters for owner-scoped booking listings. Date bounds are
/// inclusive on both ends.
#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Repository trait for booking persistence
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn insert(
        &self,
        booking: &Booking,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn get(
        &self,
        id: Uuid,
    ) -> Result<Option<Booking>, Box<dyn std::error::Error + Send + Sync>>;

    /// All bookings for the owner, ordered by booking date ascending.
    async fn list_by_owner(
        &self,
        user_id: &str,
        filter: &BookingFilter,
    ) -> Result<Vec<Booking>, Box<dyn std::error::Error + Send + Sync>>;

    async fn count_upcoming(
        &self,
        user_id: &str,
    ) -> Result<i64, Box<dyn std::error::Error + Send + Sync>>;

    async fn update_status(
        &self,
        id: Uuid,
        status: BookingStatus,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn set_transaction_uuid(
        &self,
        id: Uuid,
        transaction_uuid: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Atomically flip payment_status from pending to paid for the booking
    /// carrying this transaction uuid. Returns the updated booking, or None
    /// when no pending booking matched.
    async fn mark_paid_if_pending(
        &self,
        transaction_uuid: &str,
    ) -> Result<Option<Booking>, Box<dyn std::error::Error + Send + Sync>>;

    async fn get_by_transaction_uuid(
        &self,
        transaction_uuid: &str,
    ) -> Result<Option<Booking>, Box<dyn std::error::Error + Send + Sync>>;

    /// Hard delete. Returns false when the id did not exist.
    async fn delete(&self, id: Uuid) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;
}
