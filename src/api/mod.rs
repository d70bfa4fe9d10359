pub mod archive;
pub mod auth;
pub mod errors;
pub mod models;
pub mod routes;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{middleware, Router};
use dashmap::DashMap;
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::attestation::AttestationSigner;
use crate::config::ScannerConfig;
use crate::errors::ClawscanError;
use crate::payment::{FacilitatorClient, PaymentVerifier};
use crate::scanner::PatternScanner;

pub const API_TOKEN_ENV: &str = "CLAWSCAN_API_TOKEN";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ScannerConfig>,
    pub scanner: Arc<PatternScanner>,
    pub signer: Arc<AttestationSigner>,
    pub verifier: Arc<dyn PaymentVerifier>,
    /// Deep-scan reports by scan id.
    pub scans: Arc<DashMap<String, Value>>,
    pub api_token: Option<String>,
}

impl AppState {
    pub fn new(config: ScannerConfig) -> Result<Self, ClawscanError> {
        let signer = AttestationSigner::from_config(config.attestation_key.as_deref())?;
        let verifier = FacilitatorClient::new(&config);
        let api_token = std::env::var(API_TOKEN_ENV).ok().filter(|t| !t.is_empty());
        Ok(Self {
            scanner: Arc::new(PatternScanner::new()?),
            signer: Arc::new(signer),
            verifier: Arc::new(verifier),
            scans: Arc::new(DashMap::new()),
            config: Arc::new(config),
            api_token,
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/v1/scan/manifest", post(routes::scans::scan_manifest))
        .route("/api/v1/scan/deep", post(routes::scans::scan_deep))
        .route("/api/v1/scans/:id", get(routes::scans::get_scan))
        .route("/api/v1/attestations/verify", post(routes::attestations::verify_attestation))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::api_auth_middleware));

    Router::new()
        .route("/", get(routes::status::service_info))
        .route("/health", get(routes::status::health_check))
        .route("/api/v1/pricing", get(routes::status::pricing))
        .merge(protected)
        .layer(DefaultBodyLimit::max(archive::MAX_ARCHIVE_BYTES))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
