//! 配置代理服务
//!
//! 提供 gRPC 接口的 UPF 配置查询，每次请求重新读取配置文件。

use anyhow::Result;
use config_agent::ConfigServiceImpl;
use std::net::SocketAddr;
use tonic::transport::Server;
use tracing::info;
use upf_proto::config::config_service_server::ConfigServiceServer;
use upf_shared::config::AppConfig;
use upf_shared::observability;
use upf_shared::shutdown::shutdown_signal;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load("config-agent").unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {}", e);
        AppConfig::default()
    });

    let _guard = observability::init("config-agent", &config.observability).await?;

    info!("Starting config-agent service...");

    let grpc_addr: SocketAddr = config.server_addr().parse()?;
    let service = ConfigServiceImpl::new(&config.upf_config_path);

    info!(path = %config.upf_config_path, "gRPC server listening on {}", grpc_addr);

    Server::builder()
        .add_service(ConfigServiceServer::new(service))
        .serve_with_shutdown(grpc_addr, shutdown_signal())
        .await?;

    info!("Service shutdown complete");
    Ok(())
}
