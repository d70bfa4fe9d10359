use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use tracing::error;

use crate::errors::ClawscanError;

impl IntoResponse for ClawscanError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            ClawscanError::Config(_)
            | ClawscanError::InvalidSkill(_)
            | ClawscanError::Archive(_)
            | ClawscanError::Rule(_)
            | ClawscanError::Json(_)
            | ClawscanError::Zip(_) => StatusCode::BAD_REQUEST,
            ClawscanError::Payment(_) => StatusCode::PAYMENT_REQUIRED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        (status, Json(json!({"error": self.to_string()}))).into_response()
    }
}
