//! In-process notification feed fed by record transitions.

pub mod handlers;

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::notification::{Notification, NotificationKind};
use crate::models::record::{EntityRecord, TransitionEvent};
use crate::pipeline::progress::RoundStatus;
use crate::pipeline::transition::Action;

/// Oldest notifications are dropped past this many.
pub const MAX_NOTIFICATIONS: usize = 500;

#[derive(Clone, Default)]
pub struct NotificationCenter {
    // newest first
    feed: Arc<RwLock<VecDeque<Notification>>>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, notification: Notification) {
        let mut feed = self.feed.write().await;
        feed.push_front(notification);
        feed.truncate(MAX_NOTIFICATIONS);
    }

    pub async fn list(&self, unread_only: bool) -> Vec<Notification> {
        self.feed
            .read()
            .await
            .iter()
            .filter(|n| !unread_only || !n.read)
            .cloned()
            .collect()
    }

    /// Returns the updated notification, or `None` if the id is unknown.
    pub async fn mark_read(&self, id: Uuid) -> Option<Notification> {
        let mut feed = self.feed.write().await;
        let notification = feed.iter_mut().find(|n| n.id == id)?;
        notification.read = true;
        Some(notification.clone())
    }

    /// Returns how many notifications changed state.
    pub async fn mark_all_read(&self) -> usize {
        let mut feed = self.feed.write().await;
        let mut changed = 0;
        for notification in feed.iter_mut().filter(|n| !n.read) {
            notification.read = true;
            changed += 1;
        }
        changed
    }

    pub async fn delete(&self, id: Uuid) -> bool {
        let mut feed = self.feed.write().await;
        let before = feed.len();
        feed.retain(|n| n.id != id);
        feed.len() != before
    }

    pub async fn unread_count(&self) -> usize {
        self.feed.read().await.iter().filter(|n| !n.read).count()
    }
}

/// Builds the notification announcing an applied transition.
pub fn for_transition(record: &EntityRecord, event: &TransitionEvent) -> Notification {
    let stage = event.stage_name.as_deref().unwrap_or("the final stage");
    let (kind, title, message) = match (event.action, event.to.status) {
        (_, RoundStatus::Passed) => (
            NotificationKind::Passed,
            format!("{} passed", record.name),
            format!("{} completed every stage of the pipeline", record.name),
        ),
        (_, RoundStatus::Failed) => (
            NotificationKind::Failed,
            format!("{} failed a round", record.name),
            format!("{} did not pass {}", record.name, stage),
        ),
        (_, RoundStatus::Rejected) => (
            NotificationKind::Rejected,
            format!("{} rejected", record.name),
            format!("{} was rejected at {}", record.name, stage),
        ),
        (Action::Pass, RoundStatus::Pending) => (
            NotificationKind::StageAdvanced,
            format!("{} advanced", record.name),
            format!("{} moved on to {}", record.name, stage),
        ),
        (Action::MoveTo { .. }, RoundStatus::Pending) => (
            NotificationKind::StageAdvanced,
            format!("{} moved", record.name),
            format!("{} was moved to {}", record.name, stage),
        ),
        (_, RoundStatus::Pending) => (
            NotificationKind::Reopened,
            format!("{} reopened", record.name),
            format!("{} is back in progress at {}", record.name, stage),
        ),
    };
    Notification::new(Some(record.id), kind, title, message)
}
