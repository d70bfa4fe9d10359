//! x402 payment gating for paid scan tiers.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, info};

use crate::config::ScannerConfig;

// Lowercase: `HeaderName::from_static` rejects uppercase names.
pub const PAYMENT_REQUIRED_HEADER: &str = "payment-required";
pub const PAYMENT_SIGNATURE_HEADER: &str = "payment-signature";
const VERIFY_TIMEOUT: Duration = Duration::from_secs(30);

/// Body of the `PAYMENT-REQUIRED` header.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentRequirements {
    #[serde(rename = "x402Version")]
    pub x402_version: u32,
    pub scheme: String,
    pub network: String,
    pub price: String,
    pub wallet: String,
    pub description: String,
    pub facilitator: String,
}

impl PaymentRequirements {
    pub fn for_price(config: &ScannerConfig, price: &str, description: &str) -> Self {
        Self {
            x402_version: 1,
            scheme: "exact".into(),
            network: config.network.clone(),
            price: price.into(),
            wallet: config.pay_to_address.clone(),
            description: description.into(),
            facilitator: config.facilitator_url.clone(),
        }
    }

    pub fn encode_header(&self) -> String {
        BASE64.encode(serde_json::to_vec(self).unwrap_or_default())
    }
}

/// Outcome of checking one payment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PaymentVerification {
    pub valid: bool,
    pub tx_hash: Option<String>,
    pub amount: Option<String>,
    pub network: Option<String>,
    pub error: Option<String>,
}

impl PaymentVerification {
    pub fn invalid(error: impl Into<String>) -> Self {
        Self { error: Some(error.into()), ..Default::default() }
    }
}

/// A parsed `PAYMENT-SIGNATURE` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSignature {
    pub network: String,
    pub tx_hash: String,
}

/// Parses `<network>:<tx_hash>[:<signature>]`. With only two parts the
/// configured network is used and the second part is the transaction.
pub fn parse_payment_signature(header: &str, default_network: &str) -> Option<PaymentSignature> {
    let parts: Vec<&str> = header.split(':').collect();
    if parts.len() < 2 {
        return None;
    }
    let network = if parts.len() >= 3 { parts[0] } else { default_network };
    Some(PaymentSignature {
        network: network.to_string(),
        tx_hash: parts[1].to_string(),
    })
}

#[async_trait]
pub trait PaymentVerifier: Send + Sync {
    async fn verify(&self, payment_signature: &str, expected_amount: &str) -> PaymentVerification;
}

/// Verifies payments against an x402 facilitator over HTTP.
pub struct FacilitatorClient {
    client: Client,
    facilitator_url: String,
    recipient: String,
    network: String,
}

impl FacilitatorClient {
    pub fn new(config: &ScannerConfig) -> Self {
        let client = Client::builder()
            .timeout(VERIFY_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            facilitator_url: config.facilitator_url.trim_end_matches('/').to_string(),
            recipient: config.pay_to_address.clone(),
            network: config.network.clone(),
        }
    }
}

#[async_trait]
impl PaymentVerifier for FacilitatorClient {
    async fn verify(&self, payment_signature: &str, expected_amount: &str) -> PaymentVerification {
        let prefix: String = payment_signature.chars().take(20).collect();
        info!(signature = %prefix, "Verifying x402 payment");

        let Some(sig) = parse_payment_signature(payment_signature, &self.network) else {
            return PaymentVerification::invalid("Invalid payment signature format");
        };

        let body = json!({
            "network": sig.network,
            "tx_hash": sig.tx_hash,
            "expected_recipient": self.recipient,
            "expected_amount": expected_amount,
        });

        let resp = match self
            .client
            .post(format!("{}/verify", self.facilitator_url))
            .json(&body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                error!("Payment verification timeout");
                return PaymentVerification::invalid("Verification timeout");
            }
            Err(e) => {
                error!(error = %e, "Payment verification failed");
                return PaymentVerification::invalid(e.to_string());
            }
        };

        let status = resp.status();
        if !status.is_success() {
            error!(status = status.as_u16(), "Facilitator rejected verification request");
            return PaymentVerification {
                valid: false,
                tx_hash: Some(sig.tx_hash),
                amount: None,
                network: Some(sig.network),
                error: Some(format!("Facilitator error: {}", status.as_u16())),
            };
        }

        let data: Value = match resp.json().await {
            Ok(v) => v,
            Err(e) => return PaymentVerification::invalid(format!("Invalid facilitator response: {}", e)),
        };
        debug!(response = %data, "Facilitator response");

        PaymentVerification {
            valid: data["valid"].as_bool().unwrap_or(false),
            amount: Some(data["amount"].as_str().unwrap_or(expected_amount).to_string()),
            tx_hash: Some(sig.tx_hash),
            network: Some(sig.network),
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(facilitator: &str) -> ScannerConfig {
        let mut c = ScannerConfig::default();
        c.facilitator_url = facilitator.to_string();
        c.pay_to_address = "0xabc".into();
        c
    }

    #[test]
    fn test_parse_payment_signature() {
        assert_eq!(parse_payment_signature("0xdeadbeef", "eip155:84532"), None);

        let two = parse_payment_signature("base:0xtx", "eip155:84532").unwrap();
        assert_eq!(two.network, "eip155:84532");
        assert_eq!(two.tx_hash, "0xtx");

        let three = parse_payment_signature("base:0xtx:0xsig", "eip155:84532").unwrap();
        assert_eq!(three.network, "base");
        assert_eq!(three.tx_hash, "0xtx");
    }

    #[test]
    fn test_requirements_header_roundtrip() {
        let req = PaymentRequirements::for_price(&config("https://f.example"), "$0.01", "Deep scan");
        let decoded = BASE64.decode(req.encode_header()).unwrap();
        let value: Value = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(value["x402Version"], 1);
        assert_eq!(value["scheme"], "exact");
        assert_eq!(value["price"], "$0.01");
        assert_eq!(value["wallet"], "0xabc");
    }

    #[tokio::test]
    async fn test_facilitator_accepts_payment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/verify"))
            .and(body_partial_json(json!({"tx_hash": "0xtx", "expected_recipient": "0xabc"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"valid": true})))
            .expect(1)
            .mount(&server)
            .await;

        let client = FacilitatorClient::new(&config(&server.uri()));
        let result = client.verify("base:0xtx:0xsig", "$0.01").await;
        assert!(result.valid);
        assert_eq!(result.amount.as_deref(), Some("$0.01"));
        assert_eq!(result.network.as_deref(), Some("base"));
    }

    #[tokio::test]
    async fn test_facilitator_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/verify"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = FacilitatorClient::new(&config(&server.uri()));
        let result = client.verify("base:0xtx", "$0.01").await;
        assert!(!result.valid);
        assert_eq!(result.error.as_deref(), Some("Facilitator error: 503"));
    }

    #[tokio::test]
    async fn test_bad_signature_never_calls_facilitator() {
        let server = MockServer::start().await;
        Mock::given(method("POST")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

        let client = FacilitatorClient::new(&config(&server.uri()));
        let result = client.verify("garbage", "$0.01").await;
        assert!(!result.valid);
        assert_eq!(result.error.as_deref(), Some("Invalid payment signature format"));
    }
}
