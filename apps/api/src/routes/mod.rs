pub mod health;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use crate::backend::handlers as backend;
use crate::notifications::handlers as notifications;
use crate::pipeline::handlers as pipelines;
use crate::records::handlers as records;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Pipelines and stages
        .route(
            "/api/v1/pipelines",
            get(pipelines::handle_list_pipelines).post(pipelines::handle_create_pipeline),
        )
        .route(
            "/api/v1/pipelines/:id",
            get(pipelines::handle_get_pipeline).delete(pipelines::handle_delete_pipeline),
        )
        .route(
            "/api/v1/pipelines/:id/stages",
            post(pipelines::handle_add_stage),
        )
        .route(
            "/api/v1/pipelines/:id/stages/:stage_id",
            patch(pipelines::handle_update_stage).delete(pipelines::handle_remove_stage),
        )
        // Records
        .route(
            "/api/v1/records",
            get(records::handle_list_records).post(records::handle_create_record),
        )
        .route(
            "/api/v1/records/bulk-status",
            post(records::handle_bulk_status),
        )
        .route(
            "/api/v1/records/:id",
            get(records::handle_get_record).delete(records::handle_delete_record),
        )
        .route(
            "/api/v1/records/:id/transitions",
            post(records::handle_transition),
        )
        // Notifications
        .route(
            "/api/v1/notifications",
            get(notifications::handle_list_notifications),
        )
        .route(
            "/api/v1/notifications/read-all",
            post(notifications::handle_mark_all_read),
        )
        .route(
            "/api/v1/notifications/:id",
            delete(notifications::handle_delete_notification),
        )
        .route(
            "/api/v1/notifications/:id/read",
            patch(notifications::handle_mark_read),
        )
        // Backend proxy
        .route(
            "/api/job-approvals",
            get(backend::handle_list_job_approvals).post(backend::handle_submit_job_approval),
        )
        .route("/api/employees", get(backend::handle_list_employees))
        .with_state(state)
}
