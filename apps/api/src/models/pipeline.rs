use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::pipeline::registry::StageRegistry;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PipelineKind {
    /// Interview rounds (Screening, Technical, Final, ...).
    Interview,
    /// Application pipeline (Applied, Screening, Interview, Offer, ...).
    Hiring,
}

impl PipelineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineKind::Interview => "interview",
            PipelineKind::Hiring => "hiring",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "hiring" => PipelineKind::Hiring,
            _ => PipelineKind::Interview,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: Uuid,
    pub name: String,
    pub kind: PipelineKind,
    pub stages: StageRegistry,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Pipeline {
    pub fn new(name: &str, kind: PipelineKind, stages: StageRegistry) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            kind,
            stages,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Pipelines seeded into an empty store at startup.
pub fn default_pipelines() -> Vec<Pipeline> {
    vec![
        Pipeline::new(
            "Interview rounds",
            PipelineKind::Interview,
            StageRegistry::from_names(&["Screening", "Technical", "Final"]),
        ),
        Pipeline::new(
            "Hiring pipeline",
            PipelineKind::Hiring,
            StageRegistry::from_names(&["Applied", "Screening", "Interview", "Offer"]),
        ),
    ]
}

#[derive(Debug, Clone, FromRow)]
pub struct PipelineRow {
    pub id: Uuid,
    pub name: String,
    pub kind: String,
    pub stages: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PipelineRow> for Pipeline {
    type Error = serde_json::Error;

    fn try_from(row: PipelineRow) -> Result<Self, Self::Error> {
        Ok(Pipeline {
            id: row.id,
            name: row.name,
            kind: PipelineKind::from_str_lossy(&row.kind),
            stages: serde_json::from_value(row.stages)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
