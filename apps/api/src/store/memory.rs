use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::pipeline::Pipeline;
use crate::models::record::EntityRecord;
use crate::pipeline::registry::{Stage, StageEdit};
use crate::pipeline::transition::Action;
use crate::records::lifecycle::{apply_action, TransitionOutcome};
use crate::store::RecordRepository;

#[derive(Default)]
struct Inner {
    pipelines: Vec<Pipeline>,
    records: Vec<EntityRecord>,
}

/// Process-lifetime store. One lock covers pipelines and records so a
/// transition sees a consistent pair.
#[derive(Default)]
pub struct InMemoryRepository {
    inner: RwLock<Inner>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordRepository for InMemoryRepository {
    async fn list_pipelines(&self) -> Result<Vec<Pipeline>, AppError> {
        Ok(self.inner.read().await.pipelines.clone())
    }

    async fn get_pipeline(&self, id: Uuid) -> Result<Option<Pipeline>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.pipelines.iter().find(|p| p.id == id).cloned())
    }

    async fn save_pipeline(&self, pipeline: &Pipeline) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        match inner.pipelines.iter().position(|p| p.id == pipeline.id) {
            Some(idx) => inner.pipelines[idx] = pipeline.clone(),
            None => inner.pipelines.push(pipeline.clone()),
        }
        Ok(())
    }

    async fn edit_stages(
        &self,
        id: Uuid,
        edit: StageEdit,
    ) -> Result<(Pipeline, Stage), AppError> {
        let mut inner = self.inner.write().await;
        let pipeline = inner
            .pipelines
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Pipeline {id} not found")))?;
        let stage = pipeline.stages.apply(edit)?;
        pipeline.touch();
        Ok((pipeline.clone(), stage))
    }

    async fn delete_pipeline(&self, id: Uuid) -> Result<bool, AppError> {
        let mut inner = self.inner.write().await;
        let in_use = inner.records.iter().filter(|r| r.pipeline_id == id).count();
        if in_use > 0 {
            return Err(AppError::Conflict(format!(
                "Pipeline {id} still has {in_use} records"
            )));
        }
        let before = inner.pipelines.len();
        inner.pipelines.retain(|p| p.id != id);
        Ok(inner.pipelines.len() != before)
    }

    async fn list_records(&self) -> Result<Vec<EntityRecord>, AppError> {
        Ok(self.inner.read().await.records.clone())
    }

    async fn get_record(&self, id: Uuid) -> Result<Option<EntityRecord>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.records.iter().find(|r| r.id == id).cloned())
    }

    async fn insert_record(&self, record: &EntityRecord) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        if inner.records.iter().any(|r| r.id == record.id) {
            return Err(AppError::Conflict(format!("Record {} already exists", record.id)));
        }
        if !inner.pipelines.iter().any(|p| p.id == record.pipeline_id) {
            return Err(AppError::NotFound(format!(
                "Pipeline {} not found",
                record.pipeline_id
            )));
        }
        inner.records.push(record.clone());
        Ok(())
    }

    async fn delete_record(&self, id: Uuid) -> Result<bool, AppError> {
        let mut inner = self.inner.write().await;
        let before = inner.records.len();
        inner.records.retain(|r| r.id != id);
        Ok(inner.records.len() != before)
    }

    async fn apply_transition(
        &self,
        id: Uuid,
        action: Action,
    ) -> Result<TransitionOutcome, AppError> {
        let mut guard = self.inner.write().await;
        let Inner { pipelines, records } = &mut *guard;

        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Record {id} not found")))?;
        let pipeline = pipelines
            .iter()
            .find(|p| p.id == record.pipeline_id)
            .ok_or_else(|| {
                AppError::NotFound(format!("Pipeline {} not found", record.pipeline_id))
            })?;

        let event = apply_action(record, &pipeline.stages, action)?;
        Ok(TransitionOutcome {
            record: record.clone(),
            event,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::pipeline::PipelineKind;
    use crate::models::record::{NewRecord, RecordKind};
    use crate::pipeline::progress::{Progress, RoundStatus};
    use crate::pipeline::registry::StageRegistry;

    async fn seeded() -> (InMemoryRepository, Pipeline, EntityRecord) {
        let repo = InMemoryRepository::new();
        let pipeline = Pipeline::new(
            "Interview rounds",
            PipelineKind::Interview,
            StageRegistry::from_names(&["Screening", "Technical", "Final"]),
        );
        repo.save_pipeline(&pipeline).await.unwrap();
        let record = NewRecord {
            kind: RecordKind::Candidate,
            name: "Ada".to_string(),
            email: None,
            pipeline_id: pipeline.id,
            tags: vec![],
            attributes: None,
        }
        .into_record();
        repo.insert_record(&record).await.unwrap();
        (repo, pipeline, record)
    }

    #[tokio::test]
    async fn test_transition_is_persisted() {
        let (repo, _, record) = seeded().await;
        let outcome = repo.apply_transition(record.id, Action::Pass).await.unwrap();
        assert_eq!(outcome.record.progress, Progress::new(2, RoundStatus::Pending));
        let stored = repo.get_record(record.id).await.unwrap().unwrap();
        assert_eq!(stored.progress, outcome.record.progress);
        assert_eq!(stored.history.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_transition_is_not_persisted() {
        let (repo, _, record) = seeded().await;
        repo.apply_transition(record.id, Action::Reject).await.unwrap();
        let err = repo.apply_transition(record.id, Action::Pass).await.unwrap_err();
        assert!(matches!(err, AppError::Transition(_)));
        let stored = repo.get_record(record.id).await.unwrap().unwrap();
        assert_eq!(stored.progress, Progress::new(1, RoundStatus::Rejected));
    }

    #[tokio::test]
    async fn test_transition_unknown_record() {
        let (repo, _, _) = seeded().await;
        let err = repo
            .apply_transition(Uuid::new_v4(), Action::Pass)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_concurrent_passes_are_serialized() {
        let (repo, _, record) = seeded().await;
        let repo = std::sync::Arc::new(repo);
        let id = record.id;
        let handles: Vec<_> = (0..3)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.apply_transition(id, Action::Pass).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        let stored = repo.get_record(id).await.unwrap().unwrap();
        assert_eq!(stored.progress, Progress::new(4, RoundStatus::Passed));
        assert_eq!(stored.history.len(), 3);
    }

    #[tokio::test]
    async fn test_save_pipeline_replaces_by_id() {
        let (repo, mut pipeline, _) = seeded().await;
        pipeline.stages.add_stage("Offer", "");
        repo.save_pipeline(&pipeline).await.unwrap();
        let pipelines = repo.list_pipelines().await.unwrap();
        assert_eq!(pipelines.len(), 1);
        assert_eq!(pipelines[0].stages.len(), 4);
    }

    #[tokio::test]
    async fn test_duplicate_insert_conflicts() {
        let (repo, _, record) = seeded().await;
        assert!(matches!(
            repo.insert_record(&record).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_pipeline_with_records_cannot_be_deleted() {
        let (repo, pipeline, record) = seeded().await;
        assert!(matches!(
            repo.delete_pipeline(pipeline.id).await,
            Err(AppError::Conflict(_))
        ));
        assert!(repo.delete_record(record.id).await.unwrap());
        assert!(!repo.delete_record(record.id).await.unwrap());
        assert!(repo.delete_pipeline(pipeline.id).await.unwrap());
        assert!(!repo.delete_pipeline(pipeline.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_insert_into_missing_pipeline() {
        let repo = InMemoryRepository::new();
        let record = NewRecord {
            kind: RecordKind::Cv,
            name: "Orphan".to_string(),
            email: None,
            pipeline_id: Uuid::new_v4(),
            tags: vec![],
            attributes: None,
        }
        .into_record();
        assert!(matches!(
            repo.insert_record(&record).await,
            Err(AppError::NotFound(_))
        ));
        assert!(repo.list_records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_stage_edits_keep_every_stage() {
        let (repo, pipeline, _) = seeded().await;
        let repo = std::sync::Arc::new(repo);
        let id = pipeline.id;
        let handles: Vec<_> = (0..20)
            .map(|i| {
                let repo = repo.clone();
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
        let stored = repo.get_pipeline(id).await.unwrap().unwrap();
        assert_eq!(stored.stages.len(), 23);
    }

    #[tokio::test]
    async fn test_edit_stages_on_missing_pipeline() {
        let repo = InMemoryRepository::new();
        let err = repo
            .edit_stages(Uuid::new_v4(), StageEdit::Remove { id: Uuid::new_v4() })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_failed_stage_edit_leaves_pipeline_untouched() {
        let (repo, pipeline, _) = seeded().await;
        let missing = Uuid::new_v4();
        let err = repo
            .edit_stages(pipeline.id, StageEdit::Remove { id: missing })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        let stored = repo.get_pipeline(pipeline.id).await.unwrap().unwrap();
        assert_eq!(stored.stages, pipeline.stages);
        assert_eq!(stored.updated_at, pipeline.updated_at);
    }
}
