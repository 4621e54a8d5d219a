use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    StageAdvanced,
    Passed,
    Failed,
    Rejected,
    Reopened,
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub record_id: Option<Uuid>,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(record_id: Option<Uuid>, kind: NotificationKind, title: String, message: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            record_id,
            kind,
            title,
            message,
            read: false,
            created_at: Utc::now(),
        }
    }
}
