//! Health probe endpoint.

use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use serde::Serialize;

/// Health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub zsign: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// GET /api/health
///
/// Always returns 200; availability of the signing tool is reported in the
/// payload, and probe failures are swallowed.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (zsign, version) = match state.signer.version().await {
        Ok(version) => ("available", Some(version)),
        Err(e) => {
            tracing::debug!(error = %e, "signing tool probe failed");
            ("not found", None)
        }
    };

    Json(HealthResponse {
        status: "ok",
        zsign,
        version,
    })
}
