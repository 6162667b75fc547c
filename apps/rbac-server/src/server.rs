use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use rbac_storage::Store;
use tower_http::trace::TraceLayer;

use crate::handlers::{groups, permissions, projects, users};

#[derive(Clone)]
pub struct RbacServer {
    pub store: Arc<dyn Store>,
}

impl RbacServer {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Resource routes. `PUT` and `PATCH` are both partial updates.
    pub fn router(self) -> Router {
        Router::new()
            .route("/users", get(users::list_users).post(users::create_user))
            .route(
                "/users/{id}",
                get(users::get_user)
                    .put(users::update_user)
                    .patch(users::update_user)
                    .delete(users::delete_user),
            )
            .route("/groups", get(groups::list_groups).post(groups::create_group))
            .route(
                "/groups/{id}",
                get(groups::get_group)
                    .put(groups::update_group)
                    .patch(groups::update_group)
                    .delete(groups::delete_group),
            )
            .route(
                "/permissions",
                get(permissions::list_permissions).post(permissions::create_permission),
            )
            .route(
                "/permissions/{id}",
                get(permissions::get_permission)
                    .put(permissions::update_permission)
                    .patch(permissions::update_permission)
                    .delete(permissions::delete_permission),
            )
            .route(
                "/projects",
                get(projects::list_projects).post(projects::create_project),
            )
            .route(
                "/projects/{id}",
                get(projects::get_project)
                    .put(projects::update_project)
                    .patch(projects::update_project)
                    .delete(projects::delete_project),
            )
            .with_state(self)
    }
}

/// Flipped to `false` when shutdown starts so load balancers drain traffic.
#[derive(Clone)]
pub struct ReadinessCheck {
    ready: tokio::sync::watch::Receiver<bool>,
}

impl ReadinessCheck {
    pub fn new(ready: tokio::sync::watch::Receiver<bool>) -> Self {
        Self { ready }
    }
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn readiness_handler(
    State(check): State<ReadinessCheck>,
) -> Result<&'static str, StatusCode> {
    if *check.ready.borrow() {
        Ok("ok")
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}

pub fn health_router(readiness: ReadinessCheck) -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/readyz", get(readiness_handler))
        .with_state(readiness)
}

/// The full application: resources, probes and request tracing.
pub fn app(server: RbacServer, readiness: ReadinessCheck) -> Router {
    server
        .router()
        .merge(health_router(readiness))
        .layer(TraceLayer::new_for_http())
}
