use axum::{extract::State, Json};

use crate::api::models::{VerifyAttestationRequest, VerifyAttestationResponse};
use crate::api::AppState;

pub async fn verify_attestation(
    State(state): State<AppState>,
    Json(req): Json<VerifyAttestationRequest>,
) -> Json<VerifyAttestationResponse> {
    let valid = state.signer.verify(&req.attestation, &req.signature);
    Json(VerifyAttestationResponse {
        valid,
        signer: valid.then(|| state.signer.key_id()),
        reason: (!valid).then(|| "Signature does not match attestation".to_string()),
    })
}
