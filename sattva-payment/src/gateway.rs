use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// One field of the form the client must POST to the gateway.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub value: String,
}

impl FormField {
    pub fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
        }
    }
}

/// Redirect target plus the signed form payload for a payment request.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentInitiation {
    pub gateway_url: String,
    pub form_data: Vec<FormField>,
}

/// Outcome of callback verification against the gateway's status endpoint.
#[derive(Debug, Clone)]
pub struct Verification {
    pub verified: bool,
    pub transaction_uuid: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Malformed callback: {0}")]
    MalformedCallback(String),

    #[error("Gateway verification request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("Unexpected gateway response: {0}")]
    UnexpectedResponse(String),
}

/// Payment gateway seam: build the signed redirect form, and verify the
/// redirect-back callback out of band. Backends differ per gateway protocol
/// version and are selected by configuration.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn initiate(&self, amount: f64, transaction_uuid: &str) -> PaymentInitiation;

    /// Verify a gateway callback. Missing or undecodable parameters yield
    /// [`GatewayError::MalformedCallback`] and nothing is mutated; a
    /// reachable gateway that reports the transaction as not complete
    /// yields `verified: false`.
    async fn verify(
        &self,
        params: &HashMap<String, String>,
    ) -> Result<Verification, GatewayError>;
}

/// Correlation id round-tripped through the gateway to reconcile the
/// asynchronous callback to its booking.
pub fn new_transaction_uuid(booking_id: Uuid) -> String {
    format!("booking-{}-{}", booking_id, Utc::now().timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_uuid_embeds_booking_id() {
        let id = Uuid::new_v4();
        let txn = new_transaction_uuid(id);
        assert!(txn.starts_with(&format!("booking-{}-", id)));
    }

    #[test]
    fn transaction_uuids_differ_across_bookings() {
        let a = new_transaction_uuid(Uuid::new_v4());
        let b = new_transaction_uuid(Uuid::new_v4());
        assert_ne!(a, b);
    }

    #[test]
    fn form_field_serializes_name_and_value() {
        let field = FormField::new("amount", "100");
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["name"], "amount");
        assert_eq!(json["value"], "100");
    }
}
