use axum::{
    Router,
    http::Method,
    middleware as axum_middleware,
    routing::get,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::permissions::PermissionRegistry;
use crate::server::config::ServerConfig;
use crate::web::{
    middleware::{auth, i18n},
    routes::{reminder_routes, task_routes},
    views::Views,
};

pub mod error;
pub mod localizer;
pub mod middleware;
pub mod models;
pub mod page;
pub mod request;
pub mod responses;
pub mod routes;
pub mod validation;
pub mod views;

pub use error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DatabaseConnection,
    pub config: Arc<ServerConfig>,
    pub views: Arc<Views>,
    pub permissions: Arc<PermissionRegistry>,
}

async fn health_check_handler() -> &'static str {
    "OK"
}

pub fn create_axum_router(
    db_pool: DatabaseConnection,
    config: Arc<ServerConfig>,
    views: Arc<Views>,
) -> Router {
    let app_state = Arc::new(AppState {
        db_pool,
        config,
        views,
        permissions: Arc::new(PermissionRegistry::new()),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    // Layers run bottom-up: auth resolves the user before i18n reads it.
    let protected = reminder_routes::create_reminders_router(app_state.clone())
        .merge(task_routes::create_tasks_router(app_state.clone()))
        .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), i18n::i18n_middleware))
        .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth::auth));

    Router::new()
        .route("/api/health", get(health_check_handler))
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
