use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::pipeline::progress::{Progress, RoundStatus};
use crate::pipeline::transition::Action;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Candidate,
    Cv,
    Employee,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Candidate => "candidate",
            RecordKind::Cv => "cv",
            RecordKind::Employee => "employee",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "cv" => RecordKind::Cv,
            "employee" => RecordKind::Employee,
            _ => RecordKind::Candidate,
        }
    }
}

/// One applied transition. The list of these is the record's tracking tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransitionEvent {
    pub action: Action,
    pub from: Progress,
    pub to: Progress,
    /// Stage the record landed on, if it is on one.
    pub stage_name: Option<String>,
    pub at: DateTime<Utc>,
}

/// A candidate, CV or employee tracked through a pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: Uuid,
    pub kind: RecordKind,
    pub name: String,
    pub email: Option<String>,
    pub pipeline_id: Uuid,
    pub progress: Progress,
    pub tags: Vec<String>,
    /// Free-form domain attributes: skills, salary, position, ...
    pub attributes: Value,
    pub history: Vec<TransitionEvent>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRecord {
    pub kind: RecordKind,
    pub name: String,
    pub email: Option<String>,
    pub pipeline_id: Uuid,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub attributes: Option<Value>,
}

impl NewRecord {
    pub fn into_record(self) -> EntityRecord {
        let now = Utc::now();
        EntityRecord {
            id: Uuid::new_v4(),
            kind: self.kind,
            name: self.name.trim().to_string(),
            email: self.email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty()),
            pipeline_id: self.pipeline_id,
            progress: Progress::start(),
            tags: self.tags,
            attributes: self.attributes.unwrap_or_else(|| Value::Object(Default::default())),
            history: vec![],
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct EntityRecordRow {
    pub id: Uuid,
    pub kind: String,
    pub name: String,
    pub email: Option<String>,
    pub pipeline_id: Uuid,
    pub current_round: i32,
    pub status: String,
    pub tags: Vec<String>,
    pub attributes: Value,
    pub history: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<EntityRecordRow> for EntityRecord {
    type Error = anyhow::Error;

    fn try_from(row: EntityRecordRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<RoundStatus>()
            .map_err(|e| anyhow::anyhow!("record {}: {e}", row.id))?;
        Ok(EntityRecord {
            id: row.id,
            kind: RecordKind::from_str_lossy(&row.kind),
            name: row.name,
            email: row.email,
            pipeline_id: row.pipeline_id,
            progress: Progress::new(row.current_round.max(0) as u32, status),
            tags: row.tags,
            attributes: row.attributes,
            history: serde_json::from_value(row.history)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
