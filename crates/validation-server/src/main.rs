//! 校验服务
//!
//! 提供 PDR 校验的 REST API。

use std::sync::Arc;

use rule_agent::{RuleResolver, ValidationEngine};
use tokio::net::TcpListener;
use tracing::info;
use upf_shared::{config::AppConfig, database::Database, observability, shutdown::shutdown_signal};
use validation_server::{AppState, PgRuleStore, build_router, store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load("validation-server").unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {}", e);
        AppConfig::default()
    });

    let _guard = observability::init("validation-server", &config.observability).await?;

    info!("Starting validation-server on {}", config.server_addr());

    let db = Database::connect(&config.database).await?;
    db.migrate(&store::MIGRATOR).await?;

    if store::seed_if_empty(db.pool()).await? {
        info!("Seed data inserted");
    }

    let pg_store = PgRuleStore::new(db.pool().clone(), config.resolver.read_timeout());
    let resolver = RuleResolver::new(
        Arc::new(pg_store.clone()),
        Arc::new(pg_store.clone()),
        config.resolver.read_timeout(),
    );
    let state = AppState::new(ValidationEngine::new(resolver), Arc::new(pg_store));

    let app = build_router(state);

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("Listening on {}", config.server_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");

    Ok(())
}
