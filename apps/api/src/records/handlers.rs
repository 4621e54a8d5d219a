//! Axum route handlers for the Records API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::record::{EntityRecord, NewRecord};
use crate::pipeline::progress::RoundStatus;
use crate::pipeline::transition::Action;
use crate::records::query::{RecordPage, RecordQuery};
use crate::records::service::{self, BulkOutcome};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BulkStatusRequest {
    pub ids: Vec<Uuid>,
    pub status: RoundStatus,
}

#[derive(Debug, Serialize)]
pub struct BulkStatusResponse {
    pub updated: usize,
    pub failed: usize,
    pub results: Vec<BulkOutcome>,
}

/// GET /api/v1/records
pub async fn handle_list_records(
    State(state): State<AppState>,
    Query(query): Query<RecordQuery>,
) -> Result<Json<RecordPage>, AppError> {
    let page = service::query_records(state.repo.as_ref(), &query).await?;
    Ok(Json(page))
}

/// POST /api/v1/records
pub async fn handle_create_record(
    State(state): State<AppState>,
    Json(req): Json<NewRecord>,
) -> Result<(StatusCode, Json<EntityRecord>), AppError> {
    let record = service::create_record(state.repo.as_ref(), req).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/v1/records/:id
pub async fn handle_get_record(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EntityRecord>, AppError> {
    Ok(Json(service::get_record(state.repo.as_ref(), id).await?))
}

/// DELETE /api/v1/records/:id
pub async fn handle_delete_record(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    service::delete_record(state.repo.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/records/:id/transitions
///
/// Body: `{"action": "pass"}` or `{"action": "move_to", "stage_id": "..."}`.
pub async fn handle_transition(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(action): Json<Action>,
) -> Result<Json<EntityRecord>, AppError> {
    let record =
        service::transition_record(state.repo.as_ref(), &state.notifications, id, action).await?;
    Ok(Json(record))
}

/// POST /api/v1/records/bulk-status
pub async fn handle_bulk_status(
    State(state): State<AppState>,
    Json(req): Json<BulkStatusRequest>,
) -> Result<Json<BulkStatusResponse>, AppError> {
    if req.ids.is_empty() {
        return Err(AppError::Validation("ids cannot be empty".to_string()));
    }

    let results = service::bulk_update_status(
        state.repo.as_ref(),
        &state.notifications,
        &req.ids,
        req.status,
    )
    .await;
    let updated = results.iter().filter(|r| r.ok).count();

    Ok(Json(BulkStatusResponse {
        updated,
        failed: results.len() - updated,
        results,
    }))
}
