use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use sattva_core::booking::{Booking, BookingStatus, PaymentStatus};
use sattva_core::repository::{BookingFilter, BookingRepository};

pub struct StoreBookingRepository {
    pool: PgPool,
}

impl StoreBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const BOOKING_COLUMNS: &str = "id, user_id, session_type, session_mode, booking_date, time_slot, \
     full_name, email, phone, special_request, payment_method, payment_status, amount, \
     duration_minutes, status, instructor, transaction_uuid, created_at, updated_at";

// Row struct for runtime-bound queries; enum columns are stored as text and
// parsed on the way out.
#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    user_id: String,
    session_type: String,
    session_mode: String,
    booking_date: NaiveDate,
    time_slot: String,
    full_name: String,
    email: String,
    phone: String,
    special_request: Option<String>,
    payment_method: String,
    payment_status: String,
    amount: f64,
    duration_minutes: i32,
    status: String,
    instructor: String,
    transaction_uuid: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BookingRow {
    fn into_booking(self) -> Result<Booking, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Booking {
            id: self.id,
            user_id: self.user_id,
            session_type: self.session_type.parse()?,
            session_mode: self.session_mode.parse()?,
            booking_date: self.booking_date,
            time_slot: self.time_slot,
            full_name: self.full_name,
            email: self.email,
            phone: self.phone,
            special_request: self.special_request,
            payment_method: self.payment_method.parse()?,
            payment_status: self.payment_status.parse()?,
            amount: self.amount,
            duration_minutes: self.duration_minutes,
            status: self.status.parse()?,
            instructor: self.instructor,
            transaction_uuid: self.transaction_uuid,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[async_trait]
impl BookingRepository for StoreBookingRepository {
    async fn insert(
        &self,
        booking: &Booking,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        sqlx::query(
            r#"
            INSERT INTO bookings (id, user_id, session_type, session_mode, booking_date,
                time_slot, full_name, email, phone, special_request, payment_method,
                payment_status, amount, duration_minutes, status, instructor,
                transaction_uuid, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            "#,
        )
        .bind(booking.id)
        .bind(&booking.user_id)
        .bind(booking.session_type.as_str())
        .bind(booking.session_mode.as_str())
        .bind(booking.booking_date)
        .bind(&booking.time_slot)
        .bind(&booking.full_name)
        .bind(&booking.email)
        .bind(&booking.phone)
        .bind(&booking.special_request)
        .bind(booking.payment_method.as_str())
        .bind(booking.payment_status.as_str())
        .bind(booking.amount)
        .bind(booking.duration_minutes)
        .bind(booking.status.as_str())
        .bind(&booking.instructor)
        .bind(&booking.transaction_uuid)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(
        &self,
        id: Uuid,
    ) -> Result<Option<Booking>, Box<dyn std::error::Error + Send + Sync>> {
        let sql = format!("SELECT {} FROM bookings WHERE id = $1", BOOKING_COLUMNS);
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(BookingRow::into_booking).transpose()
    }

    async fn list_by_owner(
        &self,
        user_id: &str,
        filter: &BookingFilter,
    ) -> Result<Vec<Booking>, Box<dyn std::error::Error + Send + Sync>> {
        let sql = format!(
            r#"
            SELECT {} FROM bookings
            WHERE user_id = $1
              AND ($2::text IS NULL OR status = $2)
              AND ($3::date IS NULL OR booking_date >= $3)
              AND ($4::date IS NULL OR booking_date <= $4)
            ORDER BY booking_date ASC
            "#,
            BOOKING_COLUMNS
        );
        let rows = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(user_id)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.start_date)
            .bind(filter.end_date)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(BookingRow::into_booking).collect()
    }

    async fn count_upcoming(
        &self,
        user_id: &str,
    ) -> Result<i64, Box<dyn std::error::Error + Send + Sync>> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings WHERE user_id = $1 AND status = $2",
        )
        .bind(user_id)
        .bind(BookingStatus::Upcoming.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: BookingStatus,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        sqlx::query("UPDATE bookings SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_transaction_uuid(
        &self,
        id: Uuid,
        transaction_uuid: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        sqlx::query("UPDATE bookings SET transaction_uuid = $1, updated_at = NOW() WHERE id = $2")
            .bind(transaction_uuid)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn mark_paid_if_pending(
        &self,
        transaction_uuid: &str,
    ) -> Result<Option<Booking>, Box<dyn std::error::Error + Send + Sync>> {
        // Conditional write: only the pending -> paid transition is applied,
        // so duplicate callback delivery cannot double-apply.
        let sql = format!(
            r#"
            UPDATE bookings SET payment_status = $1, updated_at = NOW()
            WHERE transaction_uuid = $2 AND payment_status = $3
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        );
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(PaymentStatus::Paid.as_str())
            .bind(transaction_uuid)
            .bind(PaymentStatus::Pending.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(BookingRow::into_booking).transpose()
    }

    async fn get_by_transaction_uuid(
        &self,
        transaction_uuid: &str,
    ) -> Result<Option<Booking>, Box<dyn std::error::Error + Send + Sync>> {
        let sql = format!(
            "SELECT {} FROM bookings WHERE transaction_uuid = $1",
            BOOKING_COLUMNS
        );
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(transaction_uuid)
            .fetch_optional(&self.pool)
            .await?;

        row.map(BookingRow::into_booking).transpose()
    }

    async fn delete(&self, id: Uuid) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
