//! eSewa gateway backends.
//!
//! Two protocol families exist in the wild and both are kept behind
//! [`PaymentGateway`]: the current ePay flow (`v2`) signs the request with
//! HMAC-SHA256 and redirects back with a base64-JSON `data` parameter, the
//! legacy flow (`v1`) posts an unsigned form and is reconciled through the
//! `transrec` endpoint with discrete query parameters.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::gateway::{
    FormField, GatewayError, PaymentGateway, PaymentInitiation, Verification,
};

type HmacSha256 = Hmac<Sha256>;

/// Timeout for the out-of-band status verification call.
const VERIFY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayVersion {
    V1,
    V2,
}

impl FromStr for GatewayVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "v1" => Ok(GatewayVersion::V1),
            "v2" => Ok(GatewayVersion::V2),
            other => Err(format!("Unknown gateway version: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EsewaConfig {
    pub version: GatewayVersion,
    /// Merchant / product code registered with the gateway.
    pub merchant_code: String,
    /// Shared HMAC secret (v2 only).
    pub secret: String,
    pub gateway_base_url: String,
    pub success_url: String,
    pub failure_url: String,
}

/// Select the backend the deployment is configured for.
pub fn build_gateway(config: EsewaConfig) -> Arc<dyn PaymentGateway> {
    match config.version {
        GatewayVersion::V1 => Arc::new(TransrecGateway::new(config)),
        GatewayVersion::V2 => Arc::new(EpayGateway::new(config)),
    }
}

/// Render an amount the way the gateway expects: no trailing zeros for
/// whole figures, two decimals otherwise.
fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{}", amount as i64)
    } else {
        format!("{:.2}", amount)
    }
}

/// HMAC-SHA256 over the comma-joined `name=value` rendering of the given
/// fields, in the given order, base64-encoded. The field list is explicit;
/// the order must match `signed_field_names` exactly.
fn sign_fields(secret: &str, fields: &[(&str, &str)]) -> String {
    let message = fields
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join(",");

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(message.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

// ---------------------------------------------------------------------------
// v2: ePay form + transaction status endpoint
// ---------------------------------------------------------------------------

/// Fields carried in the base64-JSON `data` callback parameter.
#[derive(Debug, Deserialize)]
struct EpayCallback {
    transaction_uuid: String,
    total_amount: String,
    product_code: String,
}

#[derive(Debug, Deserialize)]
struct EpayStatusResponse {
    status: String,
}

pub struct EpayGateway {
    config: EsewaConfig,
    client: reqwest::Client,
}

impl EpayGateway {
    pub fn new(config: EsewaConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn decode_callback(data: &str) -> Result<EpayCallback, GatewayError> {
        let raw = BASE64
            .decode(data)
            .map_err(|e| GatewayError::MalformedCallback(format!("Invalid base64 data: {}", e)))?;
        serde_json::from_slice(&raw)
            .map_err(|e| GatewayError::MalformedCallback(format!("Invalid callback JSON: {}", e)))
    }
}

#[async_trait]
impl PaymentGateway for EpayGateway {
    fn initiate(&self, amount: f64, transaction_uuid: &str) -> PaymentInitiation {
        let total_amount = format_amount(amount);

        let signed_fields = [
            ("total_amount", total_amount.as_str()),
            ("transaction_uuid", transaction_uuid),
            ("product_code", self.config.merchant_code.as_str()),
        ];
        let signature = sign_fields(&self.config.secret, &signed_fields);

        PaymentInitiation {
            gateway_url: format!("{}/api/epay/main/v2/form", self.config.gateway_base_url),
            form_data: vec![
                FormField::new("amount", total_amount.clone()),
                FormField::new("tax_amount", "0"),
                FormField::new("total_amount", total_amount),
                FormField::new("transaction_uuid", transaction_uuid),
                FormField::new("product_code", self.config.merchant_code.clone()),
                FormField::new("product_service_charge", "0"),
                FormField::new("product_delivery_charge", "0"),
                FormField::new("success_url", self.config.success_url.clone()),
                FormField::new("failure_url", self.config.failure_url.clone()),
                FormField::new(
                    "signed_field_names",
                    "total_amount,transaction_uuid,product_code",
                ),
                FormField::new("signature", signature),
            ],
        }
    }

    async fn verify(
        &self,
        params: &HashMap<String, String>,
    ) -> Result<Verification, GatewayError> {
        let data = params.get("data").ok_or_else(|| {
            GatewayError::MalformedCallback("Missing data parameter".to_string())
        })?;
        let callback = Self::decode_callback(data)?;

        let url = format!(
            "{}/api/epay/transaction/status/",
            self.config.gateway_base_url
        );
        let response = self
            .client
            .get(&url)
            .query(&[
                ("product_code", callback.product_code.as_str()),
                ("total_amount", callback.total_amount.as_str()),
                ("transaction_uuid", callback.transaction_uuid.as_str()),
            ])
            .timeout(VERIFY_TIMEOUT)
            .send()
            .await?;

        let status: EpayStatusResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::UnexpectedResponse(e.to_string()))?;

        let verified = status.status == "COMPLETE";
        if !verified {
            tracing::warn!(
                transaction_uuid = %callback.transaction_uuid,
                status = %status.status,
                "Gateway reports transaction not complete"
            );
        }

        Ok(Verification {
            verified,
            transaction_uuid: callback.transaction_uuid,
        })
    }
}

// ---------------------------------------------------------------------------
// v1: legacy form + transrec verification endpoint
// ---------------------------------------------------------------------------

pub struct TransrecGateway {
    config: EsewaConfig,
    client: reqwest::Client,
}

impl TransrecGateway {
    pub fn new(config: EsewaConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

/// Pull the text between `<response_code>` tags out of the transrec reply.
fn extract_response_code(body: &str) -> Option<&str> {
    let start = body.find("<response_code>")? + "<response_code>".len();
    let end = body[start..].find("</response_code>")? + start;
    Some(body[start..end].trim())
}

#[async_trait]
impl PaymentGateway for TransrecGateway {
    fn initiate(&self, amount: f64, transaction_uuid: &str) -> PaymentInitiation {
        let amount = format_amount(amount);

        PaymentInitiation {
            gateway_url: format!("{}/epay/main", self.config.gateway_base_url),
            form_data: vec![
                FormField::new("amt", amount.clone()),
                FormField::new("psc", "0"),
                FormField::new("pdc", "0"),
                FormField::new("txAmt", "0"),
                FormField::new("tAmt", amount),
                FormField::new("pid", transaction_uuid),
                FormField::new("scd", self.config.merchant_code.clone()),
                FormField::new("su", self.config.success_url.clone()),
                FormField::new("fu", self.config.failure_url.clone()),
            ],
        }
    }

    async fn verify(
        &self,
        params: &HashMap<String, String>,
    ) -> Result<Verification, GatewayError> {
        let oid = params.get("oid").ok_or_else(|| {
            GatewayError::MalformedCallback("Missing oid parameter".to_string())
        })?;
        let amt = params.get("amt").ok_or_else(|| {
            GatewayError::MalformedCallback("Missing amt parameter".to_string())
        })?;
        let ref_id = params.get("refId").ok_or_else(|| {
            GatewayError::MalformedCallback("Missing refId parameter".to_string())
        })?;

        let url = format!("{}/epay/transrec", self.config.gateway_base_url);
        let response = self
            .client
            .post(&url)
            .form(&[
                ("amt", amt.as_str()),
                ("rid", ref_id.as_str()),
                ("pid", oid.as_str()),
                ("scd", self.config.merchant_code.as_str()),
            ])
            .timeout(VERIFY_TIMEOUT)
            .send()
            .await?;

        let body = response.text().await?;
        let code = extract_response_code(&body).ok_or_else(|| {
            GatewayError::UnexpectedResponse("Missing response_code element".to_string())
        })?;

        Ok(Verification {
            verified: code.eq_ignore_ascii_case("Success"),
            transaction_uuid: oid.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(version: GatewayVersion) -> EsewaConfig {
        EsewaConfig {
            version,
            merchant_code: "EPAYTEST".to_string(),
            secret: "8gBm/:&EnhH.1/q".to_string(),
            gateway_base_url: "https://rc-epay.esewa.com.np".to_string(),
            success_url: "https://sattva.example.com/v1/payments/esewa/success".to_string(),
            failure_url: "https://sattva.example.com/v1/payments/esewa/failure".to_string(),
        }
    }

    // -- Signing -----------------------------------------------------------

    #[test]
    fn signature_is_deterministic_base64_hmac() {
        let fields = [
            ("total_amount", "100"),
            ("transaction_uuid", "11-201-13"),
            ("product_code", "EPAYTEST"),
        ];
        let a = sign_fields("8gBm/:&EnhH.1/q", &fields);
        let b = sign_fields("8gBm/:&EnhH.1/q", &fields);
        assert_eq!(a, b);

        // Base64 of a 32-byte SHA-256 digest.
        assert_eq!(BASE64.decode(&a).unwrap().len(), 32);

        assert_ne!(a, sign_fields("other-secret", &fields));
    }

    #[test]
    fn signature_is_order_sensitive() {
        let fields = [("a", "1"), ("b", "2")];
        let swapped = [("b", "2"), ("a", "1")];
        assert_ne!(
            sign_fields("secret", &fields),
            sign_fields("secret", &swapped)
        );
    }

    #[test]
    fn amount_formatting_drops_trailing_zeros() {
        assert_eq!(format_amount(100.0), "100");
        assert_eq!(format_amount(1500.5), "1500.50");
    }

    // -- v2 form + callback ------------------------------------------------

    #[test]
    fn epay_form_carries_signature_and_field_names() {
        let gateway = EpayGateway::new(config(GatewayVersion::V2));
        let initiation = gateway.initiate(100.0, "11-201-13");

        assert!(initiation.gateway_url.ends_with("/api/epay/main/v2/form"));

        let get = |name: &str| {
            initiation
                .form_data
                .iter()
                .find(|f| f.name == name)
                .map(|f| f.value.clone())
                .unwrap_or_else(|| panic!("missing field {}", name))
        };
        assert_eq!(get("total_amount"), "100");
        assert_eq!(get("transaction_uuid"), "11-201-13");
        assert_eq!(get("product_code"), "EPAYTEST");
        assert_eq!(
            get("signed_field_names"),
            "total_amount,transaction_uuid,product_code"
        );
        let expected = sign_fields(
            "8gBm/:&EnhH.1/q",
            &[
                ("total_amount", "100"),
                ("transaction_uuid", "11-201-13"),
                ("product_code", "EPAYTEST"),
            ],
        );
        assert_eq!(get("signature"), expected);
        assert!(get("success_url").contains("/success"));
    }

    #[test]
    fn epay_callback_decodes_base64_json() {
        let payload = serde_json::json!({
            "transaction_code": "000ABC",
            "status": "COMPLETE",
            "total_amount": "100",
            "transaction_uuid": "booking-1-1700000000",
            "product_code": "EPAYTEST",
            "signed_field_names": "total_amount,transaction_uuid,product_code",
            "signature": "xyz"
        });
        let data = BASE64.encode(serde_json::to_vec(&payload).unwrap());

        let callback = EpayGateway::decode_callback(&data).unwrap();
        assert_eq!(callback.transaction_uuid, "booking-1-1700000000");
        assert_eq!(callback.total_amount, "100");
        assert_eq!(callback.product_code, "EPAYTEST");
    }

    #[test]
    fn epay_callback_rejects_garbage() {
        assert!(matches!(
            EpayGateway::decode_callback("not-base64!!"),
            Err(GatewayError::MalformedCallback(_))
        ));

        let not_json = BASE64.encode(b"plain text");
        assert!(matches!(
            EpayGateway::decode_callback(&not_json),
            Err(GatewayError::MalformedCallback(_))
        ));
    }

    #[tokio::test]
    async fn epay_verify_requires_data_parameter() {
        let gateway = EpayGateway::new(config(GatewayVersion::V2));
        let result = gateway.verify(&HashMap::new()).await;
        assert!(matches!(result, Err(GatewayError::MalformedCallback(_))));
    }

    // -- v1 form + callback ------------------------------------------------

    #[test]
    fn transrec_form_uses_legacy_field_names() {
        let gateway = TransrecGateway::new(config(GatewayVersion::V1));
        let initiation = gateway.initiate(1500.5, "booking-2-1700000000");

        assert!(initiation.gateway_url.ends_with("/epay/main"));
        let names: Vec<&str> = initiation
            .form_data
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec!["amt", "psc", "pdc", "txAmt", "tAmt", "pid", "scd", "su", "fu"]
        );
    }

    #[tokio::test]
    async fn transrec_verify_requires_discrete_parameters() {
        let gateway = TransrecGateway::new(config(GatewayVersion::V1));

        let mut params = HashMap::new();
        params.insert("oid".to_string(), "booking-2-1700000000".to_string());
        // amt and refId missing
        let result = gateway.verify(&params).await;
        assert!(matches!(result, Err(GatewayError::MalformedCallback(_))));
    }

    #[test]
    fn response_code_extraction_trims_whitespace() {
        let body = "<response>\n<response_code>\nSuccess\n</response_code>\n</response>";
        assert_eq!(extract_response_code(body), Some("Success"));
        assert_eq!(extract_response_code("<response></response>"), None);
    }

    #[test]
    fn version_parses_from_config_strings() {
        assert_eq!("v1".parse::<GatewayVersion>().unwrap(), GatewayVersion::V1);
        assert_eq!("v2".parse::<GatewayVersion>().unwrap(), GatewayVersion::V2);
        assert!("v3".parse::<GatewayVersion>().is_err());
    }
}
