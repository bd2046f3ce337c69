use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use sattva_core::booking::{
    Booking, BookingDraft, BookingStatus, PaymentMethod, SessionMode, SessionType,
};
use sattva_core::repository::BookingFilter;

use crate::error::AppError;
use crate::middleware::auth::CustomerClaims;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookingRequest {
    pub session_type: SessionType,
    pub session_mode: SessionMode,
    pub booking_date: NaiveDate,
    #[validate(length(min = 1, message = "time_slot must not be empty"))]
    pub time_slot: String,
    #[validate(length(min = 1, message = "full_name must not be empty"))]
    pub full_name: String,
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 1, message = "phone must not be empty"))]
    pub phone: String,
    pub special_request: Option<String>,
    pub payment_method: PaymentMethod,
    #[validate(range(min = 0.0, message = "amount must not be negative"))]
    pub amount: f64,
    #[validate(range(min = 30, message = "duration_minutes must be at least 30"))]
    pub duration_minutes: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ListBookingsQuery {
    pub status: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: BookingStatus,
}

// ============================================================================
// Routes
// ============================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(create_booking).get(list_bookings))
        .route(
            "/v1/bookings/{id}",
            get(get_booking).delete(delete_booking),
        )
        .route(
            "/v1/bookings/{id}/status",
            axum::routing::patch(update_booking_status),
        )
        .route("/v1/bookings/{id}/cancel", post(cancel_booking))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/bookings
async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    req.validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let draft = BookingDraft {
        session_type: req.session_type,
        session_mode: req.session_mode,
        booking_date: req.booking_date,
        time_slot: req.time_slot,
        full_name: req.full_name,
        email: req.email,
        phone: req.phone,
        special_request: req.special_request,
        payment_method: req.payment_method,
        amount: req.amount,
        duration_minutes: req.duration_minutes,
    };

    let booking = state.bookings.create(&claims.sub, draft).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// GET /v1/bookings?status=&start_date=&end_date=
async fn list_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Query(query): Query<ListBookingsQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let status = query
        .status
        .as_deref()
        .map(|s| s.parse::<BookingStatus>())
        .transpose()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let filter = BookingFilter {
        status,
        start_date: query.start_date,
        end_date: query.end_date,
    };

    let bookings = state.bookings.list(&claims.sub, filter).await?;
    Ok(Json(bookings))
}

/// GET /v1/bookings/{id}
async fn get_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let booking = state.bookings.get(&claims.sub, id).await?;
    Ok(Json(booking))
}

/// PATCH /v1/bookings/{id}/status
async fn update_booking_status(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Booking>, AppError> {
    let booking = state
        .bookings
        .update_status(&claims.sub, id, req.status)
        .await?;
    Ok(Json(booking))
}

/// POST /v1/bookings/{id}/cancel
async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let booking = state.bookings.cancel(&claims.sub, id).await?;
    Ok(Json(booking))
}

/// DELETE /v1/bookings/{id}
async fn delete_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.bookings.delete(&claims.sub, id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Booking deleted",
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> CreateBookingRequest {
        CreateBookingRequest {
            session_type: SessionType::Meditation,
            session_mode: SessionMode::Private,
            booking_date: NaiveDate::from_ymd_opt(2030, 1, 15).unwrap(),
            time_slot: "07:00-08:00".to_string(),
            full_name: "Maya Rai".to_string(),
            email: "maya@example.com".to_string(),
            phone: "+977-9800000000".to_string(),
            special_request: None,
            payment_method: PaymentMethod::Esewa,
            amount: 1500.0,
            duration_minutes: Some(90),
        }
    }

    #[test]
    fn valid_request_passes_validation() {
        assert!(valid_request().validate().is_ok());
    }

    #[test]
    fn negative_amount_fails_validation() {
        let mut req = valid_request();
        req.amount = -5.0;
        assert!(req.validate().is_err());
    }

    #[test]
    fn short_duration_fails_validation() {
        let mut req = valid_request();
        req.duration_minutes = Some(15);
        assert!(req.validate().is_err());

        // Absent duration is allowed; the service applies the default.
        req.duration_minutes = None;
        assert!(req.validate().is_ok());
    }

    #[test]
    fn invalid_email_fails_validation() {
        let mut req = valid_request();
        req.email = "not-an-email".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn request_parses_from_client_json() {
        let req: CreateBookingRequest = serde_json::from_value(json!({
            "session_type": "yoga",
            "session_mode": "group",
            "booking_date": "2030-01-15",
            "time_slot": "17:00-18:00",
            "full_name": "Maya Rai",
            "email": "maya@example.com",
            "phone": "+977-9800000000",
            "payment_method": "khalti",
            "amount": 800
        }))
        .unwrap();

        assert_eq!(req.session_type, SessionType::Yoga);
        assert_eq!(req.payment_method, PaymentMethod::Khalti);
        assert!(req.duration_minutes.is_none());
    }

    #[test]
    fn unknown_session_type_is_rejected_at_parse() {
        let result = serde_json::from_value::<CreateBookingRequest>(json!({
            "session_type": "crossfit",
            "session_mode": "group",
            "booking_date": "2030-01-15",
            "time_slot": "17:00-18:00",
            "full_name": "Maya Rai",
            "email": "maya@example.com",
            "phone": "+977-9800000000",
            "payment_method": "cash",
            "amount": 800
        }));
        assert!(result.is_err());
    }
}
