use axum::{
    extract::{Extension, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use sattva_payment::{new_transaction_uuid, PaymentInitiation};

use crate::error::AppError;
use crate::middleware::auth::CustomerClaims;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct InitiatePaymentRequest {
    pub booking_id: Uuid,
    #[validate(range(min = 0.0, message = "amount must not be negative"))]
    pub amount: f64,
}

/// Routes behind customer authentication.
pub fn protected_routes() -> Router<AppState> {
    Router::new().route("/v1/payments/esewa/initiate", post(initiate_payment))
}

/// Gateway redirect targets; the gateway is not an authenticated caller.
pub fn callback_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/payments/esewa/success", get(payment_success))
        .route("/v1/payments/esewa/failure", get(payment_failure))
}

/// POST /v1/payments/esewa/initiate
///
/// Attaches a fresh transaction uuid to the booking, then returns the
/// redirect URL and signed form the client must POST to the gateway.
async fn initiate_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Json(req): Json<InitiatePaymentRequest>,
) -> Result<Json<PaymentInitiation>, AppError> {
    req.validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    // Ownership check before touching the booking.
    state.bookings.get(&claims.sub, req.booking_id).await?;

    let transaction_uuid = new_transaction_uuid(req.booking_id);
    state
        .bookings
        .set_transaction_uuid(req.booking_id, &transaction_uuid)
        .await?;

    let initiation = state.gateway.initiate(req.amount, &transaction_uuid);
    tracing::info!(
        booking_id = %req.booking_id,
        transaction_uuid = %transaction_uuid,
        "Payment initiated"
    );
    Ok(Json(initiation))
}

/// GET /v1/payments/esewa/success
///
/// The gateway redirects here after a payment attempt. The callback is
/// verified against the gateway's status endpoint before any state moves;
/// the email side effect never fails the confirmation.
async fn payment_success(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let verification = state.gateway.verify(&params).await?;
    if !verification.verified {
        return Err(AppError::ValidationError(
            "Payment could not be verified with the gateway".to_string(),
        ));
    }

    let booking = state
        .bookings
        .mark_paid_by_transaction_uuid(&verification.transaction_uuid)
        .await?;

    match booking {
        Some(booking) => {
            if let Err(e) = state.mailer.send_booking_confirmation(&booking).await {
                tracing::error!(booking_id = %booking.id, error = %e, "Confirmation email failed");
            }
            Ok(Json(json!({
                "success": true,
                "message": "Payment confirmed",
                "booking": booking,
            })))
        }
        None => {
            tracing::warn!(
                transaction_uuid = %verification.transaction_uuid,
                "Verified payment matched no booking"
            );
            Ok(Json(json!({
                "success": true,
                "message": "Payment verified but no matching booking was found",
            })))
        }
    }
}

/// GET /v1/payments/esewa/failure
async fn payment_failure() -> Json<serde_json::Value> {
    Json(json!({
        "success": false,
        "message": "Payment failed or was cancelled at the gateway",
    }))
}
