//! Axum route handlers for the Pipelines API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::notification::{Notification, NotificationKind};
use crate::models::pipeline::{Pipeline, PipelineKind};
use crate::pipeline::progress::RoundStatus;
use crate::pipeline::registry::{Stage, StageEdit, StageRegistry, StageUpdate};
use crate::state::AppState;
use crate::store::RecordRepository;

#[derive(Debug, Deserialize)]
pub struct NewStage {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct CreatePipelineRequest {
    pub name: String,
    pub kind: PipelineKind,
    #[serde(default)]
    pub stages: Vec<NewStage>,
}

#[derive(Debug, Serialize)]
pub struct StageRemovedResponse {
    pub removed: Stage,
    /// Records left on a round the pipeline no longer has.
    pub stale_records: Vec<Uuid>,
}

async fn load_pipeline(repo: &dyn RecordRepository, id: Uuid) -> Result<Pipeline, AppError> {
    repo.get_pipeline(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Pipeline {id} not found")))
}

fn require_name(name: &str, what: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Validation(format!("{what} name cannot be empty")));
    }
    Ok(())
}

/// GET /api/v1/pipelines
pub async fn handle_list_pipelines(
    State(state): State<AppState>,
) -> Result<Json<Vec<Pipeline>>, AppError> {
    Ok(Json(state.repo.list_pipelines().await?))
}

/// POST /api/v1/pipelines
pub async fn handle_create_pipeline(
    State(state): State<AppState>,
    Json(req): Json<CreatePipelineRequest>,
) -> Result<(StatusCode, Json<Pipeline>), AppError> {
    require_name(&req.name, "Pipeline")?;
    let mut stages = StageRegistry::new();
    for stage in &req.stages {
        require_name(&stage.name, "Stage")?;
        stages.add_stage(&stage.name, &stage.description);
    }

    let pipeline = Pipeline::new(&req.name, req.kind, stages);
    state.repo.save_pipeline(&pipeline).await?;
    info!(
        "Created pipeline {} ('{}', {} stages)",
        pipeline.id,
        pipeline.name,
        pipeline.stages.len()
    );
    Ok((StatusCode::CREATED, Json(pipeline)))
}

/// GET /api/v1/pipelines/:id
pub async fn handle_get_pipeline(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Pipeline>, AppError> {
    Ok(Json(load_pipeline(state.repo.as_ref(), id).await?))
}

/// DELETE /api/v1/pipelines/:id
pub async fn handle_delete_pipeline(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.repo.delete_pipeline(id).await? {
        return Err(AppError::NotFound(format!("Pipeline {id} not found")));
    }
    info!("Deleted pipeline {id}");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/pipelines/:id/stages
pub async fn handle_add_stage(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<NewStage>,
) -> Result<(StatusCode, Json<Stage>), AppError> {
    require_name(&req.name, "Stage")?;
    let edit = StageEdit::Add {
        name: req.name,
        description: req.description,
    };
    let (_, stage) = state.repo.edit_stages(id, edit).await?;
    Ok((StatusCode::CREATED, Json(stage)))
}

/// PATCH /api/v1/pipelines/:id/stages/:stage_id
pub async fn handle_update_stage(
    State(state): State<AppState>,
    Path((id, stage_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<StageUpdate>,
) -> Result<Json<Stage>, AppError> {
    if let Some(name) = &req.name {
        require_name(name, "Stage")?;
    }
    let edit = StageEdit::Update {
        id: stage_id,
        update: req,
    };
    let (_, stage) = state.repo.edit_stages(id, edit).await?;
    Ok(Json(stage))
}

/// DELETE /api/v1/pipelines/:id/stages/:stage_id
///
/// Records are not moved. Any left past the end are reported and will be
/// refused by transitions until reopened or moved.
pub async fn handle_remove_stage(
    State(state): State<AppState>,
    Path((id, stage_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<StageRemovedResponse>, AppError> {
    let (pipeline, removed) = state
        .repo
        .edit_stages(id, StageEdit::Remove { id: stage_id })
        .await?;

    let remaining = pipeline.stages.len() as u32;
    let stale_records: Vec<Uuid> = state
        .repo
        .list_records()
        .await?
        .into_iter()
        .filter(|r| r.pipeline_id == id)
        .filter(|r| r.progress.status != RoundStatus::Passed && r.progress.current_round > remaining)
        .map(|r| r.id)
        .collect();

    if !stale_records.is_empty() {
        warn!(
            "Removing stage '{}' left {} records of pipeline {id} past the last stage",
            removed.name,
            stale_records.len()
        );
        let remaining_names: Vec<&str> = pipeline
            .stages
            .stages()
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        state
            .notifications
            .push(Notification::new(
                None,
                NotificationKind::Info,
                format!("Stage '{}' removed from {}", removed.name, pipeline.name),
                format!(
                    "{} records need to be reopened or moved. Remaining stages: {}",
                    stale_records.len(),
                    remaining_names.join(", ")
                ),
            ))
            .await;
    }

    Ok(Json(StageRemovedResponse {
        removed,
        stale_records,
    }))
}
