use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::pipeline::{Pipeline, PipelineRow};
use crate::models::record::{EntityRecord, EntityRecordRow};
use crate::pipeline::registry::{Stage, StageEdit};
use crate::pipeline::transition::Action;
use crate::records::lifecycle::{apply_action, TransitionOutcome};
use crate::store::RecordRepository;

/// Postgres-backed store. Stages, attributes and history are JSONB columns.
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_pipeline(row: PipelineRow) -> Result<Pipeline, AppError> {
    Pipeline::try_from(row).map_err(|e| AppError::Internal(e.into()))
}

fn to_record(row: EntityRecordRow) -> Result<EntityRecord, AppError> {
    EntityRecord::try_from(row).map_err(AppError::Internal)
}

fn json<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(e.into()))
}

const FOREIGN_KEY_VIOLATION: &str = "23503";

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some(FOREIGN_KEY_VIOLATION))
}

async fn save_record_progress(
    tx: &mut Transaction<'_, Postgres>,
    record: &EntityRecord,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE entity_records
        SET current_round = $1, status = $2, history = $3, updated_at = $4
        WHERE id = $5
        "#,
    )
    .bind(record.progress.current_round as i32)
    .bind(record.progress.status.as_str())
    .bind(json(&record.history)?)
    .bind(record.updated_at)
    .bind(record.id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[async_trait]
impl RecordRepository for PgRepository {
    async fn list_pipelines(&self) -> Result<Vec<Pipeline>, AppError> {
        sqlx::query_as::<_, PipelineRow>("SELECT * FROM pipelines ORDER BY created_at ASC")
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(to_pipeline)
            .collect()
    }

    async fn get_pipeline(&self, id: Uuid) -> Result<Option<Pipeline>, AppError> {
        sqlx::query_as::<_, PipelineRow>("SELECT * FROM pipelines WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(to_pipeline)
            .transpose()
    }

    async fn save_pipeline(&self, pipeline: &Pipeline) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO pipelines (id, name, kind, stages, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name,
                kind = EXCLUDED.kind,
                stages = EXCLUDED.stages,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(pipeline.id)
        .bind(&pipeline.name)
        .bind(pipeline.kind.as_str())
        .bind(json(&pipeline.stages)?)
        .bind(pipeline.created_at)
        .bind(pipeline.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn edit_stages(
        &self,
        id: Uuid,
        edit: StageEdit,
    ) -> Result<(Pipeline, Stage), AppError> {
        let mut tx = self.pool.begin().await?;

        let mut pipeline = sqlx::query_as::<_, PipelineRow>(
            "SELECT * FROM pipelines WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .map(to_pipeline)
        .transpose()?
        .ok_or_else(|| AppError::NotFound(format!("Pipeline {id} not found")))?;

        let stage = pipeline.stages.apply(edit)?;
        pipeline.touch();

        sqlx::query("UPDATE pipelines SET stages = $1, updated_at = $2 WHERE id = $3")
            .bind(json(&pipeline.stages)?)
            .bind(pipeline.updated_at)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok((pipeline, stage))
    }

    async fn delete_pipeline(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        // Locking the pipeline row blocks record inserts that reference it
        let exists = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM pipelines WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .is_some();
        if !exists {
            return Ok(false);
        }

        let in_use: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM entity_records WHERE pipeline_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if in_use > 0 {
            return Err(AppError::Conflict(format!(
                "Pipeline {id} still has {in_use} records"
            )));
        }

        let result = sqlx::query("DELETE FROM pipelines WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    AppError::Conflict(format!("Pipeline {id} still has records"))
                } else {
                    AppError::Database(e)
                }
            })?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_records(&self) -> Result<Vec<EntityRecord>, AppError> {
        sqlx::query_as::<_, EntityRecordRow>("SELECT * FROM entity_records ORDER BY created_at ASC")
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(to_record)
            .collect()
    }

    async fn get_record(&self, id: Uuid) -> Result<Option<EntityRecord>, AppError> {
        sqlx::query_as::<_, EntityRecordRow>("SELECT * FROM entity_records WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(to_record)
            .transpose()
    }

    async fn insert_record(&self, record: &EntityRecord) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO entity_records
                (id, kind, name, email, pipeline_id, current_round, status,
                 tags, attributes, history, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(record.id)
        .bind(record.kind.as_str())
        .bind(&record.name)
        .bind(&record.email)
        .bind(record.pipeline_id)
        .bind(record.progress.current_round as i32)
        .bind(record.progress.status.as_str())
        .bind(&record.tags)
        .bind(&record.attributes)
        .bind(json(&record.history)?)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::NotFound(format!("Pipeline {} not found", record.pipeline_id))
            } else {
                AppError::Database(e)
            }
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(format!("Record {} already exists", record.id)));
        }
        Ok(())
    }

    async fn delete_record(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM entity_records WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn apply_transition(
        &self,
        id: Uuid,
        action: Action,
    ) -> Result<TransitionOutcome, AppError> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes concurrent transitions on the same record
        let row = sqlx::query_as::<_, EntityRecordRow>(
            "SELECT * FROM entity_records WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Record {id} not found")))?;
        let mut record = to_record(row)?;

        let pipeline = sqlx::query_as::<_, PipelineRow>("SELECT * FROM pipelines WHERE id = $1")
            .bind(record.pipeline_id)
            .fetch_optional(&mut *tx)
            .await?
            .map(to_pipeline)
            .transpose()?
            .ok_or_else(|| {
                AppError::NotFound(format!("Pipeline {} not found", record.pipeline_id))
            })?;

        let event = apply_action(&mut record, &pipeline.stages, action)?;
        if event.is_some() {
            save_record_progress(&mut tx, &record).await?;
        }
        tx.commit().await?;

        debug!("Committed {} on record {id}", action.name());
        Ok(TransitionOutcome { record, event })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::pipeline::PipelineKind;
    use crate::models::record::{NewRecord, RecordKind};
    use crate::pipeline::progress::{Progress, RoundStatus};
    use crate::pipeline::registry::StageRegistry;

    // Run with `DATABASE_URL=postgres://... cargo test -- --ignored`
    async fn repo_with_pipeline() -> (PgRepository, Pipeline) {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let repo = PgRepository::new(crate::db::create_pool(&url).await.unwrap());
        let pipeline = Pipeline::new(
            "Interview rounds",
            PipelineKind::Interview,
            StageRegistry::from_names(&["Screening", "Technical", "Final"]),
        );
        repo.save_pipeline(&pipeline).await.unwrap();
        (repo, pipeline)
    }

    fn candidate(pipeline_id: Uuid) -> EntityRecord {
        NewRecord {
            kind: RecordKind::Candidate,
            name: "Ada".to_string(),
            email: None,
            pipeline_id,
            tags: vec!["rust".to_string()],
            attributes: None,
        }
        .into_record()
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn test_concurrent_stage_adds_keep_every_stage() {
        let (repo, pipeline) = repo_with_pipeline().await;
        let handles: Vec<_> = (0..10)
            .map(|i| {
                let repo = repo.clone();
                let id = pipeline.id;
                tokio::spawn(async move {
                    repo.edit_stages(
                        id,
                        StageEdit::Add {
                            name: format!("Panel {i}"),
                            description: String::new(),
                        },
                    )
                    .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        let stored = repo.get_pipeline(pipeline.id).await.unwrap().unwrap();
        assert_eq!(stored.stages.len(), 13);
        assert!(repo.delete_pipeline(pipeline.id).await.unwrap());
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn test_pipeline_with_records_cannot_be_deleted() {
        let (repo, pipeline) = repo_with_pipeline().await;
        let record = candidate(pipeline.id);
        repo.insert_record(&record).await.unwrap();

        assert!(matches!(
            repo.delete_pipeline(pipeline.id).await,
            Err(AppError::Conflict(_))
        ));

        assert!(repo.delete_record(record.id).await.unwrap());
        assert!(repo.delete_pipeline(pipeline.id).await.unwrap());
        assert!(!repo.delete_pipeline(pipeline.id).await.unwrap());
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn test_insert_into_missing_pipeline_is_not_found() {
        let (repo, pipeline) = repo_with_pipeline().await;
        let orphan = candidate(Uuid::new_v4());
        assert!(matches!(
            repo.insert_record(&orphan).await,
            Err(AppError::NotFound(_))
        ));
        assert!(repo.delete_pipeline(pipeline.id).await.unwrap());
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn test_transition_is_persisted_with_history() {
        let (repo, pipeline) = repo_with_pipeline().await;
        let record = candidate(pipeline.id);
        repo.insert_record(&record).await.unwrap();

        let outcome = repo.apply_transition(record.id, Action::Pass).await.unwrap();
        assert!(outcome.event.is_some());
        let stored = repo.get_record(record.id).await.unwrap().unwrap();
        assert_eq!(stored.progress, Progress::new(2, RoundStatus::Pending));
        assert_eq!(stored.history.len(), 1);
        assert_eq!(stored.tags, vec!["rust".to_string()]);

        assert!(repo.delete_record(record.id).await.unwrap());
        assert!(repo.delete_pipeline(pipeline.id).await.unwrap());
    }
}
