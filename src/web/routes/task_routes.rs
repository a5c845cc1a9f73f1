use axum::{
    Router,
    extract::{Extension, State},
    handler::Handler,
    middleware::from_fn_with_state,
    routing::delete,
};
use std::sync::Arc;
use tracing::info;

use crate::db::services::task_service;
use crate::permissions::{Action, Resource};
use crate::web::{
    AppState,
    error::AppError,
    middleware::bulk_permission::{BulkGate, BulkSelection, GateState, bulk_permission_gate},
    models::AuthenticatedUser,
    responses::tasks::DestroyResponse,
};

/// Deletes every task the gate let through, for both the single-id and the
/// checklist route.
async fn destroy(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Extension(selection): Extension<BulkSelection>,
) -> Result<DestroyResponse, AppError> {
    let deleted = task_service::delete_tasks(&app_state.db_pool, selection.ids.clone()).await?;
    info!(deleted, ids = ?selection.ids, user_id = user.id, "Tasks deleted.");

    Ok(DestroyResponse {
        task_ids: selection.ids,
    })
}

pub fn create_tasks_router(app_state: Arc<AppState>) -> Router<Arc<AppState>> {
    let gate = GateState {
        app: app_state,
        gate: BulkGate {
            resource: Resource::Task,
            action: Action::Delete,
            route_param: "task",
        },
    };

    Router::new()
        .route(
            "/tasks",
            delete(destroy.layer(from_fn_with_state(gate.clone(), bulk_permission_gate))),
        )
        .route(
            "/tasks/{task}",
            delete(destroy.layer(from_fn_with_state(gate, bulk_permission_gate))),
        )
}
