use std::sync::Arc;

use sea_orm::Database;
use tracing::info;

use quarterdeck_admin::bootstrap;
use quarterdeck_admin::config::AdminConfig;
use quarterdeck_admin::infra::db::{DbRoleRepository, DbUserRepository};
use quarterdeck_admin::query::users::UserComponent;
use quarterdeck_admin::router::build_router;
use quarterdeck_admin::state::AppState;
use quarterdeck_core::config::Config as _;
use quarterdeck_core::tracing::init_tracing;

#[tokio::main]
async fn main() {
    init_tracing();

    let config = AdminConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let redis = deadpool_redis::Config::from_url(&config.redis_url)
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .expect("failed to create redis pool");

    let component = Arc::new(UserComponent::new().expect("invalid users filter configuration"));

    let user_repo = DbUserRepository {
        db: db.clone(),
        component: component.clone(),
    };
    let role_repo = DbRoleRepository { db: db.clone() };
    bootstrap::ensure_well_known_roles(&role_repo)
        .await
        .expect("failed to provision well-known roles");
    let anonymous = bootstrap::resolve_anonymous(&user_repo, &role_repo)
        .await
        .expect("failed to resolve anonymous actor");

    let state = AppState {
        db,
        redis,
        anonymous: Arc::new(anonymous),
        component,
        session_ttl_secs: config.session_ttl_secs,
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.admin_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("admin service listening on {addr}");
    axum::serve(listener, router).await.expect("server error");
}
