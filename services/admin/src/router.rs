use axum::extract::State;
use axum::http::StatusCode;
use axum::{
    Router,
    routing::{delete, get, post, put},
};
use tower_http::trace::TraceLayer;

use quarterdeck_core::health::healthz;
use quarterdeck_core::middleware::request_id_layer;

use crate::handlers::session::{login, logout};
use crate::handlers::user::{
    create_user, delete_user, get_user, list_users, profile, update_password, update_user,
};
use crate::state::AppState;

/// Ready once the database answers. Redis is intentionally excluded: a cache
/// outage degrades sessions to basic auth but the service still serves.
async fn readyz(State(state): State<AppState>) -> StatusCode {
    match state.db.ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "readiness probe failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Users
        .route("/users", get(list_users))
        .route("/users", post(create_user))
        .route("/users/{id}", get(get_user))
        .route("/users/{id}", put(update_user))
        .route("/users/{id}", delete(delete_user))
        .route("/users/{id}/password", put(update_password))
        // Current actor
        .route("/profile", get(profile))
        // Sessions
        .route("/session", post(login))
        .route("/session", delete(logout))
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
        .with_state(state)
}
