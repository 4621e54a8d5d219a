use std::sync::Arc;

use crate::backend::BackendClient;
use crate::config::Config;
use crate::notifications::NotificationCenter;
use crate::store::RecordRepository;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pipelines and entity records. In-memory unless DATABASE_URL is set.
    pub repo: Arc<dyn RecordRepository>,
    pub notifications: NotificationCenter,
    pub backend: BackendClient,
    pub config: Config,
}
