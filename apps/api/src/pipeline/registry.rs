//! Stage registry: the ordered list of rounds a record moves through.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Stage {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// 1-based display order. Not guaranteed unique after manual edits.
    pub order: u32,
}

/// Partial update merged into an existing stage.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StageUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub order: Option<u32>,
}

/// One change to a registry, applied by the store under its pipeline lock.
#[derive(Debug, Clone)]
pub enum StageEdit {
    Add { name: String, description: String },
    Update { id: Uuid, update: StageUpdate },
    Remove { id: Uuid },
}

#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("Stage {0} not found")]
    StageNotFound(Uuid),

    #[error("Stage order must be at least 1")]
    InvalidOrder,
}

/// Ordered set of stages for one pipeline. Serialized as a plain array.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct StageRegistry {
    stages: Vec<Stage>,
}

impl StageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from stage names, numbered in the given order.
    pub fn from_names(names: &[&str]) -> Self {
        let mut registry = Self::new();
        for name in names {
            registry.add_stage(name, "");
        }
        registry
    }

    /// Appends a stage with `order = len + 1`. Duplicate names are allowed.
    pub fn add_stage(&mut self, name: &str, description: &str) -> Stage {
        let stage = Stage {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            description: description.to_string(),
            order: self.stages.len() as u32 + 1,
        };
        self.stages.push(stage.clone());
        stage
    }

    /// Merges `update` into the matching stage and re-sorts by order.
    pub fn update_stage(&mut self, id: Uuid, update: StageUpdate) -> Result<Stage, RegistryError> {
        if update.order == Some(0) {
            return Err(RegistryError::InvalidOrder);
        }

        let stage = self
            .stages
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(RegistryError::StageNotFound(id))?;

        if let Some(name) = update.name {
            stage.name = name.trim().to_string();
        }
        if let Some(description) = update.description {
            stage.description = description;
        }
        if let Some(order) = update.order {
            stage.order = order;
        }
        let updated = stage.clone();

        // sort_by_key is stable: equal orders keep their insertion sequence
        self.stages.sort_by_key(|s| s.order);
        Ok(updated)
    }

    /// Removes a stage. Records positioned on or past it are not touched here.
    pub fn remove_stage(&mut self, id: Uuid) -> Result<Stage, RegistryError> {
        let idx = self.position(id).ok_or(RegistryError::StageNotFound(id))?;
        Ok(self.stages.remove(idx))
    }

    /// 0-based index of a stage in registry order.
    pub fn position(&self, id: Uuid) -> Option<usize> {
        self.stages.iter().position(|s| s.id == id)
    }

    /// Stage for a 1-based round number.
    pub fn stage_at_round(&self, round: u32) -> Option<&Stage> {
        if round == 0 {
            return None;
        }
        self.stages.get(round as usize - 1)
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Applies `edit` and returns the stage it added, changed or removed.
    pub fn apply(&mut self, edit: StageEdit) -> Result<Stage, RegistryError> {
        match edit {
            StageEdit::Add { name, description } => Ok(self.add_stage(&name, &description)),
            StageEdit::Update { id, update } => self.update_stage(id, update),
            StageEdit::Remove { id } => self.remove_stage(id),
        }
    }
}
