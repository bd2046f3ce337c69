use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use sattva_booking::BookingError;
use sattva_payment::GatewayError;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    UpstreamError(String),
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::UpstreamError(msg) => {
                tracing::error!("Upstream failure: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Payment gateway is unavailable, please retry".to_string(),
                )
            }
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "success": false,
            "message": message,
        }));

        (status, body).into_response()
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::NotFound(id) => {
                AppError::NotFoundError(format!("Booking not found: {}", id))
            }
            BookingError::Forbidden => {
                AppError::AuthorizationError("Booking belongs to another user".to_string())
            }
            BookingError::Validation(msg) => AppError::ValidationError(msg),
            BookingError::Conflict(msg) => AppError::ConflictError(msg),
            BookingError::Storage(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::MalformedCallback(msg) => AppError::ValidationError(msg),
            GatewayError::Upstream(e) => AppError::UpstreamError(e.to_string()),
            GatewayError::UnexpectedResponse(msg) => AppError::UpstreamError(msg),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn booking_errors_map_to_http_statuses() {
        let cases = [
            (
                AppError::from(BookingError::NotFound(Uuid::new_v4())),
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::from(BookingError::Forbidden),
                StatusCode::FORBIDDEN,
            ),
            (
                AppError::from(BookingError::Validation("bad".to_string())),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::from(BookingError::Conflict("done".to_string())),
                StatusCode::CONFLICT,
            ),
            (
                AppError::from(BookingError::Storage("db down".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn malformed_callback_is_a_client_error() {
        let err = AppError::from(GatewayError::MalformedCallback("no data".to_string()));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unexpected_gateway_response_is_a_server_error() {
        let err = AppError::from(GatewayError::UnexpectedResponse("html".to_string()));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
