use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::api::AppState;

pub async fn service_info(State(state): State<AppState>) -> Json<Value> {
    let config = &state.config;
    let paid = config.deep_scan_requires_payment();
    let deep_price = if paid { config.deep_scan_price.as_str() } else { "free (demo mode)" };
    let deep_payment = if paid { "x402 USDC" } else { "none" };
    Json(json!({
        "service": "clawscan",
        "version": env!("CARGO_PKG_VERSION"),
        "x402_enabled": config.is_configured(),
        "endpoints": {
            "/api/v1/scan/manifest": {
                "method": "POST",
                "description": "Validate skill manifest (free)",
                "price": "free",
            },
            "/api/v1/scan/deep": {
                "method": "POST",
                "description": "Full security scan with pattern rules and signed attestation",
                "price": deep_price,
                "payment": deep_payment,
            },
            "/api/v1/scans/:id": {
                "method": "GET",
                "description": "Fetch a stored deep-scan report",
            },
            "/api/v1/attestations/verify": {
                "method": "POST",
                "description": "Verify a scan attestation signature",
            },
        },
    }))
}

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "clawscan",
        "version": env!("CARGO_PKG_VERSION"),
        "git_hash": option_env!("GIT_HASH").unwrap_or("dev"),
        "built": option_env!("BUILD_TIMESTAMP"),
        "network": state.config.network,
        "rules_loaded": state.scanner.rule_count(),
        "signer": state.signer.key_id(),
    }))
}

pub async fn pricing(State(state): State<AppState>) -> Json<Value> {
    let config = &state.config;
    Json(json!({
        "x402_enabled": config.is_configured(),
        "network": config.network,
        "currency": "USDC",
        "tiers": {
            "manifest_scan": {
                "price": config.manifest_scan_price,
                "description": "Basic manifest validation",
                "includes": [
                    "Required field validation",
                    "Permission analysis",
                    "Obfuscation detection",
                ],
            },
            "deep_scan": {
                "price": config.deep_scan_price,
                "description": "Full security scan with pattern rules",
                "includes": [
                    "Everything in manifest scan",
                    format!("Pattern analysis ({} rules)", state.scanner.rule_count()),
                    "Credential theft detection",
                    "Load-time side effect detection",
                    "Signed attestation",
                ],
            },
        },
        "payment_protocol": {
            "name": "x402",
            "spec": "https://www.x402.org",
            "flow": [
                "1. POST to /api/v1/scan/deep",
                "2. Receive 402 with payment details in PAYMENT-REQUIRED header",
                "3. Sign USDC payment with your wallet",
                "4. Retry request with PAYMENT-SIGNATURE header",
                "5. Payment verified, scan results returned",
            ],
        },
    }))
}
