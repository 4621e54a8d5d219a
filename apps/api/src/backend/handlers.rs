//! Proxy routes for the external HR backend.

use axum::{
    extract::{Query, State},
    Json,
};
use serde_json::Value;
use tracing::warn;

use crate::backend::{fallback, BackendError, ListQuery, Sourced};
use crate::errors::AppError;
use crate::state::AppState;

/// Turns a backend result into a response, substituting fallback data only
/// when the service is configured to. 4xx answers are passed through as-is.
fn with_fallback(
    state: &AppState,
    what: &str,
    result: Result<Value, BackendError>,
    fallback: impl FnOnce() -> Value,
) -> Result<Json<Sourced<Value>>, AppError> {
    match result {
        Ok(data) => Ok(Json(Sourced::live(data))),
        Err(e) if e.is_client_error() => Err(AppError::Backend(e)),
        Err(e) if state.config.backend_mock_fallback => {
            warn!("Serving fallback {what}: {e}");
            Ok(Json(Sourced::fallback(fallback(), e.to_string())))
        }
        Err(e) => Err(AppError::Backend(e)),
    }
}

/// GET /api/job-approvals
pub async fn handle_list_job_approvals(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Sourced<Value>>, AppError> {
    let result = state.backend.job_approvals(&query).await;
    with_fallback(&state, "job approvals", result, || {
        fallback::job_approvals(&query)
    })
}

/// POST /api/job-approvals
pub async fn handle_submit_job_approval(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<Sourced<Value>>, AppError> {
    if !body.is_object() {
        return Err(AppError::Validation(
            "job approval must be a JSON object".to_string(),
        ));
    }
    let result = state.backend.submit_job_approval(&body).await;
    with_fallback(&state, "job approval submission", result, || {
        fallback::submitted_job_approval(&body)
    })
}

/// GET /api/employees
pub async fn handle_list_employees(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Sourced<Value>>, AppError> {
    let result = state.backend.employees(&query).await;
    with_fallback(&state, "employees", result, || fallback::employees(&query))
}
