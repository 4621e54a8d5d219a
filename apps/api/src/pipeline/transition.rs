//! The single transition function every status change goes through.
//!
//! With N stages in the registry:
//! - `pass` advances one round; past round N the record becomes `passed` at N+1
//! - `fail` holds the round and marks `failed` (idempotent)
//! - `reject` holds the round and marks `rejected` (idempotent)
//! - `hire` jumps to `passed` at N+1
//! - `reopen` returns to `pending`, clamping the round to N
//! - `move_to` places the record on a named stage as `pending`, ignoring order

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::pipeline::progress::{Progress, RoundStatus};
use crate::pipeline::registry::StageRegistry;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Pass,
    Fail,
    Reject,
    Hire,
    Reopen,
    MoveTo { stage_id: Uuid },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Pass => "pass",
            Action::Fail => "fail",
            Action::Reject => "reject",
            Action::Hire => "hire",
            Action::Reopen => "reopen",
            Action::MoveTo { .. } => "move_to",
        }
    }

    /// The action that drives a record to `status`. Used by bulk status updates.
    pub fn for_target_status(status: RoundStatus) -> Self {
        match status {
            RoundStatus::Pending => Action::Reopen,
            RoundStatus::Passed => Action::Hire,
            RoundStatus::Failed => Action::Fail,
            RoundStatus::Rejected => Action::Reject,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Pipeline has no stages")]
    EmptyPipeline,

    #[error("Stage {0} is not part of this pipeline")]
    UnknownStage(Uuid),

    #[error("Cannot {action} a record that is {from}")]
    InvalidTransition {
        from: RoundStatus,
        action: &'static str,
    },

    #[error("Record is on round {round} but the pipeline has {stages} stages; reopen or move it first")]
    StaleProgress { round: u32, stages: u32 },
}

impl TransitionError {
    pub fn code(&self) -> &'static str {
        match self {
            TransitionError::EmptyPipeline => "EMPTY_PIPELINE",
            TransitionError::UnknownStage(_) => "UNKNOWN_STAGE",
            TransitionError::InvalidTransition { .. } => "INVALID_TRANSITION",
            TransitionError::StaleProgress { .. } => "STALE_PROGRESS",
        }
    }
}

/// Computes the next progress for `action`. Pure; the caller persists the result.
pub fn transition(
    progress: Progress,
    registry: &StageRegistry,
    action: Action,
) -> Result<Progress, TransitionError> {
    if registry.is_empty() {
        return Err(TransitionError::EmptyPipeline);
    }
    let stages = registry.len() as u32;
    let Progress {
        current_round: round,
        status,
    } = progress;

    let invalid = || TransitionError::InvalidTransition {
        from: status,
        action: action.name(),
    };

    match action {
        Action::MoveTo { stage_id } => {
            let idx = registry
                .position(stage_id)
                .ok_or(TransitionError::UnknownStage(stage_id))?;
            return Ok(Progress::new(idx as u32 + 1, RoundStatus::Pending));
        }
        Action::Reopen => {
            let round = round.clamp(1, stages);
            return Ok(Progress::new(round, RoundStatus::Pending));
        }
        _ => {}
    }

    // Passed records sit at N+1 by construction; everything else must point at a stage.
    if status != RoundStatus::Passed && (round == 0 || round > stages) {
        return Err(TransitionError::StaleProgress { round, stages });
    }

    let next = match (action, status) {
        (Action::Pass, RoundStatus::Pending) => {
            let next_round = round + 1;
            if next_round > stages {
                Progress::new(next_round, RoundStatus::Passed)
            } else {
                Progress::new(next_round, RoundStatus::Pending)
            }
        }
        (Action::Fail, RoundStatus::Pending | RoundStatus::Failed) => {
            Progress::new(round, RoundStatus::Failed)
        }
        (Action::Reject, RoundStatus::Pending | RoundStatus::Failed | RoundStatus::Rejected) => {
            Progress::new(round, RoundStatus::Rejected)
        }
        (Action::Hire, RoundStatus::Pending) => Progress::new(stages + 1, RoundStatus::Passed),
        (Action::Hire, RoundStatus::Passed) => progress,
        _ => return Err(invalid()),
    };

    Ok(next)
}
