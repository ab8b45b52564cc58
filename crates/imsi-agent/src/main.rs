//! IMSI 代理服务
//!
//! 提供 gRPC 接口的订户目录查询。

use anyhow::Result;
use imsi_agent::SubscriberServiceImpl;
use rule_agent::SnapshotStore;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tonic::transport::Server;
use tracing::info;
use upf_proto::subscriber::subscriber_service_server::SubscriberServiceServer;
use upf_shared::config::AppConfig;
use upf_shared::observability;
use upf_shared::seed_watcher::SeedFileWatcher;
use upf_shared::shutdown::shutdown_signal;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load("imsi-agent").unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {}", e);
        AppConfig::default()
    });

    let _guard = observability::init("imsi-agent", &config.observability).await?;

    info!("Starting imsi-agent service...");

    let grpc_addr: SocketAddr = config.server_addr().parse()?;

    let store = SnapshotStore::from_path_or_builtin(config.seed.path.as_deref())?;
    info!(subscribers = store.stats().subscribers, "Subscriber directory initialized");

    let watcher = SeedFileWatcher::from_config(&config.seed);
    if let Some(watcher) = &watcher {
        let reload_store = store.clone();
        watcher.start(Arc::new(move |path: &Path| -> Result<()> {
            reload_store.reload_from_path(path)?;
            Ok(())
        }))?;
        info!(path = %watcher.path().display(), "Seed hot reload enabled");
    }

    let service = SubscriberServiceImpl::new(Arc::new(store));

    info!("gRPC server listening on {}", grpc_addr);

    Server::builder()
        .add_service(SubscriberServiceServer::new(service))
        .serve_with_shutdown(grpc_addr, shutdown_signal())
        .await?;

    if let Some(watcher) = watcher {
        watcher.stop();
    }

    info!("Service shutdown complete");
    Ok(())
}
