//! Record store: the one place pipelines and entity records live.
//!
//! `AppState` holds an `Arc<dyn RecordRepository>`. `InMemoryRepository` is the
//! default; `PgRepository` is used when `DATABASE_URL` is configured.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::pipeline::{default_pipelines, Pipeline};
use crate::models::record::EntityRecord;
use crate::pipeline::registry::{Stage, StageEdit};
use crate::pipeline::transition::Action;
use crate::records::lifecycle::TransitionOutcome;

pub use memory::InMemoryRepository;
pub use postgres::PgRepository;

#[async_trait]
pub trait RecordRepository: Send + Sync {
    async fn list_pipelines(&self) -> Result<Vec<Pipeline>, AppError>;

    async fn get_pipeline(&self, id: Uuid) -> Result<Option<Pipeline>, AppError>;

    /// Inserts or replaces a pipeline by id.
    async fn save_pipeline(&self, pipeline: &Pipeline) -> Result<(), AppError>;

    /// Applies `edit` to the pipeline's stages and saves it as one atomic step.
    /// Returns the updated pipeline and the affected stage.
    async fn edit_stages(&self, id: Uuid, edit: StageEdit)
        -> Result<(Pipeline, Stage), AppError>;

    /// Returns `false` if no such pipeline existed. Fails with `Conflict`
    /// while records still belong to it.
    async fn delete_pipeline(&self, id: Uuid) -> Result<bool, AppError>;

    /// All records, in insertion order.
    async fn list_records(&self) -> Result<Vec<EntityRecord>, AppError>;

    async fn get_record(&self, id: Uuid) -> Result<Option<EntityRecord>, AppError>;

    /// Fails with `NotFound` if the record's pipeline does not exist.
    async fn insert_record(&self, record: &EntityRecord) -> Result<(), AppError>;

    /// Returns `false` if no such record existed.
    async fn delete_record(&self, id: Uuid) -> Result<bool, AppError>;

    /// Loads the record and its pipeline, applies `action` and saves the
    /// result as one atomic step.
    async fn apply_transition(&self, id: Uuid, action: Action)
        -> Result<TransitionOutcome, AppError>;
}

/// Seeds the default pipelines into an empty store.
pub async fn seed_default_pipelines(repo: &dyn RecordRepository) -> Result<usize, AppError> {
    if !repo.list_pipelines().await?.is_empty() {
        return Ok(0);
    }
    let pipelines = default_pipelines();
    for pipeline in &pipelines {
        repo.save_pipeline(pipeline).await?;
        info!(
            "Seeded pipeline '{}' with {} stages",
            pipeline.name,
            pipeline.stages.len()
        );
    }
    Ok(pipelines.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seed_only_into_empty_store() {
        let repo = InMemoryRepository::new();
        assert_eq!(seed_default_pipelines(&repo).await.unwrap(), 2);
        assert_eq!(seed_default_pipelines(&repo).await.unwrap(), 0);
        assert_eq!(repo.list_pipelines().await.unwrap().len(), 2);
    }
}
