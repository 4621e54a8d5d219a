//! Record store operations shared by the HTTP handlers.
//! Every status change goes through `RecordRepository::apply_transition`.

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::record::{EntityRecord, NewRecord};
use crate::notifications::{for_transition, NotificationCenter};
use crate::pipeline::progress::RoundStatus;
use crate::pipeline::transition::Action;
use crate::records::query::{RecordPage, RecordQuery};
use crate::store::RecordRepository;

/// Per-id result of a bulk status update.
#[derive(Debug, Clone, Serialize)]
pub struct BulkOutcome {
    pub id: Uuid,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<EntityRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub async fn create_record(
    repo: &dyn RecordRepository,
    new: NewRecord,
) -> Result<EntityRecord, AppError> {
    if new.name.trim().is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    if let Some(attrs) = &new.attributes {
        if !attrs.is_object() {
            return Err(AppError::Validation(
                "attributes must be a JSON object".to_string(),
            ));
        }
    }
    let record = new.into_record();
    repo.insert_record(&record).await?;
    info!(
        "Created {} record {} in pipeline {}",
        record.kind.as_str(),
        record.id,
        record.pipeline_id
    );
    Ok(record)
}

pub async fn query_records(
    repo: &dyn RecordRepository,
    query: &RecordQuery,
) -> Result<RecordPage, AppError> {
    let records = repo.list_records().await?;
    Ok(query.apply(records))
}

pub async fn get_record(repo: &dyn RecordRepository, id: Uuid) -> Result<EntityRecord, AppError> {
    repo.get_record(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Record {id} not found")))
}

pub async fn delete_record(repo: &dyn RecordRepository, id: Uuid) -> Result<(), AppError> {
    if !repo.delete_record(id).await? {
        return Err(AppError::NotFound(format!("Record {id} not found")));
    }
    info!("Deleted record {id}");
    Ok(())
}

/// Applies one action and announces the change.
pub async fn transition_record(
    repo: &dyn RecordRepository,
    notifications: &NotificationCenter,
    id: Uuid,
    action: Action,
) -> Result<EntityRecord, AppError> {
    let outcome = repo.apply_transition(id, action).await?;

    if let Some(event) = &outcome.event {
        info!(
            "Record {id}: {} {}/{} -> {}/{}",
            action.name(),
            event.from.current_round,
            event.from.status,
            event.to.current_round,
            event.to.status
        );
        notifications
            .push(for_transition(&outcome.record, event))
            .await;
    }

    Ok(outcome.record)
}

/// Drives each record to `status` through the transition function.
/// One failing id does not stop the rest.
pub async fn bulk_update_status(
    repo: &dyn RecordRepository,
    notifications: &NotificationCenter,
    ids: &[Uuid],
    status: RoundStatus,
) -> Vec<BulkOutcome> {
    let action = Action::for_target_status(status);
    let mut outcomes = Vec::with_capacity(ids.len());

    for &id in ids {
        match transition_record(repo, notifications, id, action).await {
            Ok(record) => outcomes.push(BulkOutcome {
                id,
                ok: true,
                record: Some(record),
                error: None,
            }),
            Err(e) => {
                warn!("Bulk {} skipped record {id}: {e}", action.name());
                outcomes.push(BulkOutcome {
                    id,
                    ok: false,
                    record: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    outcomes
}
