use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Deserialize)]
pub struct VerifyAttestationRequest {
    pub attestation: Value,
    pub signature: String,
}

#[derive(Serialize)]
pub struct VerifyAttestationResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
