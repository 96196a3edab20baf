//! API handlers for the site audit server
//!
//! Provides REST endpoints for:
//! - Site audits
//! - Remediation advice for a list of constraints
//! - The active regulatory regime

use std::sync::Arc;

use axum::{body::Bytes, extract::State, Json};
use compliance_engine::{remediation, Regulations};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use site_types::{AuditReport, AuditRequest, Constraint, Feature, Remediation};
use tracing::{debug, info};

use crate::error::ServerError;
use crate::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "site-audit-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Regulations response.
///
/// `regulations` uses the snake_case keys of the `--regulations` TOML file,
/// not the camelCase of the audit payloads, so a served regime can be saved
/// and loaded back unchanged.
#[derive(Serialize)]
pub struct RegulationsResponse {
    pub success: bool,
    pub regulations: Regulations,
}

/// Handler: GET /api/regulations
pub async fn handle_regulations(State(state): State<AppState>) -> Json<RegulationsResponse> {
    Json(RegulationsResponse {
        success: true,
        regulations: state.engine.regulations().clone(),
    })
}

/// Audit request body: the audit request plus an optional dataset that
/// replaces the server-loaded one for this call
#[derive(Deserialize)]
pub struct AuditApiRequest {
    #[serde(flatten)]
    pub request: AuditRequest,

    #[serde(default)]
    pub dataset: Option<Vec<Feature>>,
}

/// Parse a JSON body so malformed input gets the standard error envelope
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ServerError> {
    serde_json::from_slice(body).map_err(|e| ServerError::InvalidRequest(e.to_string()))
}

/// Handler: POST /api/audit
pub async fn handle_audit(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AuditReport>, ServerError> {
    let AuditApiRequest { request, dataset } = parse_body(&body)?;
    info!(
        "Audit request: lat={}, lng={}",
        request.latitude, request.longitude
    );

    let dataset = match dataset {
        Some(features) => Arc::new(features),
        None => Arc::clone(&state.dataset),
    };
    debug!("Dataset: {} features", dataset.len());

    // Evaluation is CPU-bound
    let engine = Arc::clone(&state.engine);
    let result = tokio::task::spawn_blocking(move || engine.audit(&request, &dataset))
        .await
        .map_err(|e| ServerError::Internal(format!("Audit task failed: {}", e)))??;

    info!(
        "Audit complete: status={:?}, feasibility={}",
        result.status, result.feasibility
    );
    Ok(Json(AuditReport::success(result)))
}

/// Remediation request body. An `AggregateResult` is accepted as-is since
/// only its `constraints` are read.
#[derive(Deserialize)]
pub struct RemediationApiRequest {
    pub constraints: Vec<Constraint>,
}

#[derive(Serialize)]
pub struct RemediationResponse {
    pub success: bool,
    pub remediations: Vec<Remediation>,
    pub count: usize,
}

/// Handler: POST /api/remediations
pub async fn handle_remediations(body: Bytes) -> Result<Json<RemediationResponse>, ServerError> {
    let req: RemediationApiRequest = parse_body(&body)?;
    let remediations = remediation::advise(&req.constraints);
    let count = remediations.len();

    Ok(Json(RemediationResponse {
        success: true,
        remediations,
        count,
    }))
}
