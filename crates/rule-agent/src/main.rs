//! 规则代理服务
//!
//! 提供 gRPC 接口的会话规则查询与校验服务。

use anyhow::Result;
use rule_agent::{RuleAgentServiceImpl, RuleResolver, SnapshotStore, ValidationEngine};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tonic::transport::Server;
use tracing::info;
use upf_proto::rule::rule_agent_service_server::RuleAgentServiceServer;
use upf_shared::config::AppConfig;
use upf_shared::observability;
use upf_shared::seed_watcher::SeedFileWatcher;
use upf_shared::shutdown::shutdown_signal;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load("rule-agent").unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {}", e);
        AppConfig::default()
    });

    let _guard = observability::init("rule-agent", &config.observability).await?;

    info!("Starting rule-agent service...");

    let grpc_addr: SocketAddr = config.server_addr().parse()?;

    // 加载种子，未配置路径时使用内置示例数据
    let store = SnapshotStore::from_path_or_builtin(config.seed.path.as_deref())?;
    let stats = store.stats();
    info!(
        subscribers = stats.subscribers,
        sessions = stats.sessions,
        "Snapshot store initialized"
    );

    let watcher = SeedFileWatcher::from_config(&config.seed);
    if let Some(watcher) = &watcher {
        let reload_store = store.clone();
        watcher.start(Arc::new(move |path: &Path| -> Result<()> {
            reload_store.reload_from_path(path)?;
            Ok(())
        }))?;
        info!(path = %watcher.path().display(), "Seed hot reload enabled");
    }

    let resolver = RuleResolver::new(
        Arc::new(store.clone()),
        Arc::new(store),
        config.resolver.read_timeout(),
    );
    let service = RuleAgentServiceImpl::new(ValidationEngine::new(resolver));

    info!("gRPC server listening on {}", grpc_addr);

    Server::builder()
        .add_service(RuleAgentServiceServer::new(service))
        .serve_with_shutdown(grpc_addr, shutdown_signal())
        .await?;

    if let Some(watcher) = watcher {
        watcher.stop();
    }

    info!("Service shutdown complete");
    Ok(())
}
