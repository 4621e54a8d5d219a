use chrono::Utc;

use crate::models::record::{EntityRecord, TransitionEvent};
use crate::pipeline::registry::StageRegistry;
use crate::pipeline::transition::{transition, Action, TransitionError};

/// Result of applying an action to a stored record.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub record: EntityRecord,
    /// `None` when the action left the progress unchanged (e.g. a repeated fail).
    pub event: Option<TransitionEvent>,
}

/// Runs the transition function against `record` and, if progress changed,
/// updates it in place and appends a history event.
pub fn apply_action(
    record: &mut EntityRecord,
    stages: &StageRegistry,
    action: Action,
) -> Result<Option<TransitionEvent>, TransitionError> {
    let from = record.progress;
    let to = transition(from, stages, action)?;
    if to == from {
        return Ok(None);
    }

    let event = TransitionEvent {
        action,
        from,
        to,
        stage_name: stages
            .stage_at_round(to.current_round)
            .map(|s| s.name.clone()),
        at: Utc::now(),
    };
    record.progress = to;
    record.updated_at = event.at;
    record.history.push(event.clone());
    Ok(Some(event))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::{NewRecord, RecordKind};
    use crate::pipeline::progress::{Progress, RoundStatus};
    use uuid::Uuid;

    fn candidate() -> EntityRecord {
        NewRecord {
            kind: RecordKind::Candidate,
            name: "Ada".to_string(),
            email: None,
            pipeline_id: Uuid::new_v4(),
            tags: vec![],
            attributes: None,
        }
        .into_record()
    }

    #[test]
    fn test_history_tracks_each_change() {
        let stages = StageRegistry::from_names(&["Screening", "Technical"]);
        let mut record = candidate();
        let event = apply_action(&mut record, &stages, Action::Pass)
            .unwrap()
            .unwrap();
        assert_eq!(event.stage_name.as_deref(), Some("Technical"));
        let event = apply_action(&mut record, &stages, Action::Pass)
            .unwrap()
            .unwrap();
        assert_eq!(event.to, Progress::new(3, RoundStatus::Passed));
        assert_eq!(event.stage_name, None);
        assert_eq!(record.history.len(), 2);
        assert_eq!(record.history[0].from, Progress::start());
    }

    #[test]
    fn test_no_op_leaves_history_alone() {
        let stages = StageRegistry::from_names(&["Screening"]);
        let mut record = candidate();
        apply_action(&mut record, &stages, Action::Fail).unwrap();
        let updated_at = record.updated_at;
        assert!(apply_action(&mut record, &stages, Action::Fail)
            .unwrap()
            .is_none());
        assert_eq!(record.history.len(), 1);
        assert_eq!(record.updated_at, updated_at);
    }

    #[test]
    fn test_error_leaves_record_untouched() {
        let stages = StageRegistry::from_names(&["Screening"]);
        let mut record = candidate();
        record.progress = Progress::new(1, RoundStatus::Rejected);
        assert!(apply_action(&mut record, &stages, Action::Pass).is_err());
        assert_eq!(record.progress, Progress::new(1, RoundStatus::Rejected));
        assert!(record.history.is_empty());
    }
}
