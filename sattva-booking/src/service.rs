use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::roster::InstructorRoster;
use sattva_core::booking::{
    Booking, BookingDraft, BookingStatus, PaymentStatus, DEFAULT_DURATION_MINUTES,
    MIN_DURATION_MINUTES,
};
use sattva_core::repository::{BookingFilter, BookingRepository};

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Booking not found: {0}")]
    NotFound(Uuid),

    #[error("Booking belongs to another user")]
    Forbidden,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl BookingError {
    fn storage(e: Box<dyn std::error::Error + Send + Sync>) -> Self {
        BookingError::Storage(e.to_string())
    }
}

/// Manages the booking lifecycle and its state transitions.
///
/// Ownership is checked on every user-facing mutation; `completed` and
/// `cancelled` are terminal per the state machine.
pub struct BookingService {
    repo: Arc<dyn BookingRepository>,
    roster: InstructorRoster,
}

impl BookingService {
    pub fn new(repo: Arc<dyn BookingRepository>, roster: InstructorRoster) -> Self {
        Self { repo, roster }
    }

    /// Create a booking with status=upcoming and payment_status=pending.
    ///
    /// The instructor is picked from the roster by the requester's current
    /// upcoming-booking count, so consecutive bookings rotate through it.
    pub async fn create(
        &self,
        user_id: &str,
        draft: BookingDraft,
    ) -> Result<Booking, BookingError> {
        let today = Utc::now().date_naive();
        if draft.booking_date < today {
            return Err(BookingError::Validation(
                "Booking date cannot be in the past".to_string(),
            ));
        }
        if draft.amount < 0.0 {
            return Err(BookingError::Validation(
                "Amount cannot be negative".to_string(),
            ));
        }
        if draft.time_slot.trim().is_empty() {
            return Err(BookingError::Validation(
                "Time slot must not be empty".to_string(),
            ));
        }
        let duration_minutes = draft.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES);
        if duration_minutes < MIN_DURATION_MINUTES {
            return Err(BookingError::Validation(format!(
                "Duration must be at least {} minutes",
                MIN_DURATION_MINUTES
            )));
        }

        let upcoming = self
            .repo
            .count_upcoming(user_id)
            .await
            .map_err(BookingError::storage)?;
        let instructor = self.roster.assign(upcoming.max(0) as u64).to_string();

        let now = Utc::now();
        let booking = Booking {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            session_type: draft.session_type,
            session_mode: draft.session_mode,
            booking_date: draft.booking_date,
            time_slot: draft.time_slot,
            full_name: draft.full_name,
            email: draft.email,
            phone: draft.phone,
            special_request: draft.special_request,
            payment_method: draft.payment_method,
            payment_status: PaymentStatus::Pending,
            amount: draft.amount,
            duration_minutes,
            status: BookingStatus::Upcoming,
            instructor,
            transaction_uuid: None,
            created_at: now,
            updated_at: now,
        };

        self.repo
            .insert(&booking)
            .await
            .map_err(BookingError::storage)?;

        tracing::info!(booking_id = %booking.id, user_id, "Booking created");
        Ok(booking)
    }

    /// Fetch a booking, enforcing ownership.
    pub async fn get(&self, user_id: &str, id: Uuid) -> Result<Booking, BookingError> {
        let booking = self
            .repo
            .get(id)
            .await
            .map_err(BookingError::storage)?
            .ok_or(BookingError::NotFound(id))?;

        if booking.user_id != user_id {
            return Err(BookingError::Forbidden);
        }
        Ok(booking)
    }

    /// List the owner's bookings, optionally filtered by status and an
    /// inclusive date range, ordered by booking date ascending.
    pub async fn list(
        &self,
        user_id: &str,
        filter: BookingFilter,
    ) -> Result<Vec<Booking>, BookingError> {
        self.repo
            .list_by_owner(user_id, &filter)
            .await
            .map_err(BookingError::storage)
    }

    /// Persist a new lifecycle status. A completed booking only accepts
    /// `completed` again; anything else is a conflict.
    pub async fn update_status(
        &self,
        user_id: &str,
        id: Uuid,
        new_status: BookingStatus,
    ) -> Result<Booking, BookingError> {
        let mut booking = self.get(user_id, id).await?;

        if booking.status == BookingStatus::Completed && new_status != BookingStatus::Completed {
            return Err(BookingError::Conflict(
                "Cannot modify completed booking".to_string(),
            ));
        }

        self.repo
            .update_status(id, new_status)
            .await
            .map_err(BookingError::storage)?;

        booking.status = new_status;
        booking.updated_at = Utc::now();
        Ok(booking)
    }

    pub async fn cancel(&self, user_id: &str, id: Uuid) -> Result<Booking, BookingError> {
        let mut booking = self.get(user_id, id).await?;

        match booking.status {
            BookingStatus::Completed => {
                return Err(BookingError::Conflict(
                    "Cannot cancel completed booking".to_string(),
                ))
            }
            BookingStatus::Cancelled => {
                return Err(BookingError::Conflict(
                    "Booking is already cancelled".to_string(),
                ))
            }
            BookingStatus::Upcoming => {}
        }

        self.repo
            .update_status(id, BookingStatus::Cancelled)
            .await
            .map_err(BookingError::storage)?;

        booking.status = BookingStatus::Cancelled;
        booking.updated_at = Utc::now();
        tracing::info!(booking_id = %id, user_id, "Booking cancelled");
        Ok(booking)
    }

    pub async fn delete(&self, user_id: &str, id: Uuid) -> Result<(), BookingError> {
        self.get(user_id, id).await?;

        let deleted = self.repo.delete(id).await.map_err(BookingError::storage)?;
        if !deleted {
            return Err(BookingError::NotFound(id));
        }
        tracing::info!(booking_id = %id, user_id, "Booking deleted");
        Ok(())
    }

    /// Attach the gateway correlation id generated at payment initiation.
    pub async fn set_transaction_uuid(
        &self,
        id: Uuid,
        transaction_uuid: &str,
    ) -> Result<(), BookingError> {
        self.repo
            .get(id)
            .await
            .map_err(BookingError::storage)?
            .ok_or(BookingError::NotFound(id))?;

        self.repo
            .set_transaction_uuid(id, transaction_uuid)
            .await
            .map_err(BookingError::storage)
    }

    /// Flip the booking matched by this transaction uuid from pending to
    /// paid. The update is conditional, so a duplicate callback (or a
    /// booking already paid) leaves the record untouched and returns it
    /// unchanged. `None` means no booking carries this transaction uuid;
    /// the caller decides whether that is fatal.
    pub async fn mark_paid_by_transaction_uuid(
        &self,
        transaction_uuid: &str,
    ) -> Result<Option<Booking>, BookingError> {
        if let Some(booking) = self
            .repo
            .mark_paid_if_pending(transaction_uuid)
            .await
            .map_err(BookingError::storage)?
        {
            tracing::info!(booking_id = %booking.id, transaction_uuid, "Booking marked paid");
            return Ok(Some(booking));
        }

        // Either already paid (idempotent no-op) or unknown transaction.
        self.repo
            .get_by_transaction_uuid(transaction_uuid)
            .await
            .map_err(BookingError::storage)
    }
}
