use std::path::Path as FsPath;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::api::archive::{extract_zip, skill_root};
use crate::api::AppState;
use crate::assessment::assess_skill;
use crate::attestation::ScanSummary;
use crate::errors::ClawscanError;
use crate::manifest::ManifestParser;
use crate::payment::{PaymentRequirements, PaymentVerification, PAYMENT_REQUIRED_HEADER, PAYMENT_SIGNATURE_HEADER};
use crate::reporting::to_json;

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/json"))
        .unwrap_or(false)
}

/// Free tier: validate an uploaded `skill.json`.
pub async fn scan_manifest(headers: HeaderMap, body: Bytes) -> Result<Json<Value>, ClawscanError> {
    if !is_json(&headers) {
        return Err(ClawscanError::InvalidSkill("Upload must be a JSON manifest (skill.json)".into()));
    }
    let manifest: Value = serde_json::from_slice(&body)
        .map_err(|e| ClawscanError::InvalidSkill(format!("Invalid JSON: {}", e)))?;

    let result = ManifestParser::new().validate(manifest);
    let scan_id = uuid::Uuid::new_v4().to_string();
    info!(scan_id = %scan_id, skill = %result.skill_name, risk = %result.risk_level, "Manifest scan complete");

    Ok(Json(json!({
        "scan_id": scan_id,
        "scan_type": "manifest",
        "skill_name": result.skill_name,
        "passed": result.passed,
        "risk_level": result.risk_level.as_upper(),
        "warnings": result.warnings(),
        "errors": result.errors(),
        "checks": result.checks,
        "payment_required": false,
    })))
}

fn payment_required(state: &AppState, reason: &str) -> Response {
    let requirements = PaymentRequirements::for_price(
        &state.config,
        &state.config.deep_scan_price,
        "Deep security scan of a ClawdHub skill",
    );
    let mut response = (
        StatusCode::PAYMENT_REQUIRED,
        Json(json!({"error": reason, "payment_requirements": requirements})),
    )
        .into_response();
    if let Ok(value) = HeaderValue::from_str(&requirements.encode_header()) {
        response.headers_mut().insert(PAYMENT_REQUIRED_HEADER, value);
    }
    response
}

/// Paid tier: full scan of a zipped skill directory.
pub async fn scan_deep(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Result<Response, ClawscanError> {
    let mut payment: Option<PaymentVerification> = None;
    if state.config.deep_scan_requires_payment() {
        let Some(signature) = headers.get(PAYMENT_SIGNATURE_HEADER).and_then(|v| v.to_str().ok()) else {
            return Ok(payment_required(&state, "Payment required"));
        };
        let verification = state.verifier.verify(signature, &state.config.deep_scan_price).await;
        if !verification.valid {
            warn!(error = ?verification.error, "Payment rejected");
            let reason = verification.error.unwrap_or_else(|| "Payment verification failed".to_string());
            return Ok(payment_required(&state, &reason));
        }
        payment = Some(verification);
    }

    if body.is_empty() {
        return Err(ClawscanError::Archive("No file uploaded".into()));
    }

    let scan_id = uuid::Uuid::new_v4().to_string();
    std::fs::create_dir_all(&state.config.upload_dir)?;
    // Removed when dropped at the end of the request.
    let workspace = tempfile::Builder::new()
        .prefix(&format!("{}-", scan_id))
        .tempdir_in(&state.config.upload_dir)?;

    let scanner = state.scanner.clone();
    let work_dir = workspace.path().join("skill");
    let assessment = tokio::task::spawn_blocking(move || {
        extract_zip(&body, &work_dir)?;
        let root = skill_root(&work_dir)?;
        assess_skill(&root, &scanner)
    })
    .await
    .map_err(|e| ClawscanError::Internal(format!("Scan task failed: {}", e)))??;

    let findings = assessment.findings();
    let tier = if payment.is_some() { "premium" } else { "free" };
    let attestation = state.signer.sign(&ScanSummary {
        scan_id: scan_id.clone(),
        skill: assessment.skill_name.clone(),
        verdict: assessment.risk_level,
        timestamp: Utc::now(),
        findings_count: findings.len(),
        tier: tier.to_string(),
    })?;

    let mut report = to_json(&assessment);
    if let Some(map) = report.as_object_mut() {
        // The workspace path is meaningless to the caller.
        map.insert("skill_path".into(), json!(display_name(&assessment.skill_path)));
        map.insert("scan_id".into(), json!(scan_id));
        map.insert("scan_type".into(), json!("deep"));
        map.insert("tier".into(), json!(tier));
        map.insert("attestation".into(), attestation);
        map.insert("payment".into(), json!(payment));
    }

    info!(scan_id = %scan_id, skill = %assessment.skill_name, risk = %assessment.risk_level, "Deep scan complete");
    state.scans.insert(scan_id, report.clone());
    drop(workspace);

    Ok(Json(report).into_response())
}

fn display_name(path: &str) -> String {
    FsPath::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub async fn get_scan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match state.scans.get(&id) {
        Some(report) => Ok(Json(report.value().clone())),
        None => Err((StatusCode::NOT_FOUND, Json(json!({"error": "Scan not found"})))),
    }
}
