use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::notification::Notification;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Serialize)]
pub struct NotificationListResponse {
    pub notifications: Vec<Notification>,
    pub unread: usize,
}

#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub updated: usize,
}

/// GET /api/v1/notifications
pub async fn handle_list_notifications(
    State(state): State<AppState>,
    Query(params): Query<NotificationQuery>,
) -> Json<NotificationListResponse> {
    let notifications = state.notifications.list(params.unread_only).await;
    let unread = state.notifications.unread_count().await;
    Json(NotificationListResponse {
        notifications,
        unread,
    })
}

/// PATCH /api/v1/notifications/:id/read
pub async fn handle_mark_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Notification>, AppError> {
    state
        .notifications
        .mark_read(id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Notification {id} not found")))
}

/// POST /api/v1/notifications/read-all
pub async fn handle_mark_all_read(State(state): State<AppState>) -> Json<MarkAllReadResponse> {
    Json(MarkAllReadResponse {
        updated: state.notifications.mark_all_read().await,
    })
}

/// DELETE /api/v1/notifications/:id
pub async fn handle_delete_notification(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.notifications.delete(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Notification {id} not found")))
    }
}
